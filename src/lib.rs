// ==========================================
// 供应链管理系统 - 储备定额监控核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 决策支持 (自动生成草稿, 人工审批下单)
// 流程: 定额登记 + 快照接入 → 阈值判定 → 补库规划 / 告警
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AlertKind, AlertSeverity, PlanEntryStatus, PlanSource, QuotaClassification,
};

// 领域实体
pub use domain::{
    Alert, ProcurementPlanEntry, QuotaDashboardSummary, ReplenishmentGap, StockQuota,
    StockReading, StockSnapshot, ThresholdStatus,
};

// 引擎
pub use engine::{
    AlertEmitter, CycleReport, CycleWarning, GapReplenishmentPlanner, QuotaMonitorCycle,
    QuotaRegistry, StockSnapshotIngester, ThresholdEvaluator,
};

// API
pub use api::{MonitorApi, PlanEntryApi, QuotaApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "供应链管理系统 - 储备定额监控";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
