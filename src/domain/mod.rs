// ==========================================
// 供应链管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、值对象
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod alert;
pub mod plan_entry;
pub mod quota;
pub mod snapshot;
pub mod types;

// 重导出核心类型
pub use alert::{alert_dedup_key, alert_id_from_key, Alert};
pub use plan_entry::ProcurementPlanEntry;
pub use quota::StockQuota;
pub use snapshot::{
    QuotaDashboardSummary, ReplenishmentGap, StockReading, StockSnapshot, SupplyLine,
    ThresholdStatus,
};
pub use types::{AlertKind, AlertSeverity, PlanEntryStatus, PlanSource, QuotaClassification};
