// ==========================================
// 供应链管理系统 - API 层
// ==========================================
// 职责: 对外暴露定额/计划/监控用例, 统一错误转换
// ==========================================

pub mod error;
pub mod monitor_api;
pub mod plan_entry_api;
pub mod quota_api;

pub use error::{ApiError, ApiResult};
pub use monitor_api::MonitorApi;
pub use plan_entry_api::PlanEntryApi;
pub use quota_api::{QuotaApi, UpsertQuotaRequest};
