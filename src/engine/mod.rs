// ==========================================
// 供应链管理系统 - 引擎层
// ==========================================
// 职责: 定额登记、快照接入、阈值判定、补库规划、告警生成
// 红线: 引擎不拼 SQL, 判定结果必须可解释
// ==========================================

pub mod alert_emitter;
pub mod error;
pub mod gap_planner;
pub mod quota_cycle;
pub mod quota_registry;
pub mod snapshot_ingester;
pub mod threshold;
pub mod warning;

// 重导出核心引擎
pub use alert_emitter::{AlertEmitter, EmitResult};
pub use error::{EngineError, EngineResult};
pub use gap_planner::{GapReplenishmentPlanner, PlanGapsResult};
pub use quota_cycle::{CycleReport, QuotaMonitorCycle};
pub use quota_registry::{QuotaLookup, QuotaRegistry};
pub use snapshot_ingester::{
    IngestBatchReport, IngestFailure, IngestOutcome, StaleSnapshot, StockSnapshotIngester,
};
pub use threshold::ThresholdEvaluator;
pub use warning::CycleWarning;
