// ==========================================
// 供应链管理系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明:
// - StaleSnapshot / OrphanedSnapshot 不是错误，分别以
//   IngestOutcome::Stale 与 CycleWarning 报告
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("定额区间非法: part_id={part_id}, low={low_quota}, reserve={reserve_quota}, high={high_quota} (要求 0 <= low <= reserve <= high)")]
    InvalidQuotaRange {
        part_id: String,
        low_quota: i64,
        reserve_quota: i64,
        high_quota: i64,
    },

    #[error("定额不存在: part_id={0}")]
    NotFound(String),

    #[error("定额仍被 {open_entries} 条未结采购计划引用: part_id={part_id}")]
    QuotaInUse { part_id: String, open_entries: i64 },

    #[error("数量非法 (part_id={part_id}, field={field}): {value} < 0")]
    InvalidQuantity {
        part_id: String,
        field: String,
        value: i64,
    },

    #[error("数量溢出 (part_id={part_id}, field={field}): 超出 i64 范围")]
    QuantityOverflow { part_id: String, field: String },

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
