// ==========================================
// 供应链管理系统 - 评估周期告警信号
// ==========================================
// 单个部件的问题不中断评估周期, 以 CycleWarning 形式汇总上报
// ==========================================

use serde::Serialize;
use std::fmt;

/// 评估周期内的非致命问题
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CycleWarning {
    /// 快照对应的部件没有定额 (定额在周期中被删除或从未配置)
    OrphanedSnapshot { part_id: String },
    /// 有定额但尚无任何快照
    MissingSnapshot { part_id: String },
    /// 定额查询失败
    QuotaLookupFailed { part_id: String, reason: String },
    /// 自动计划条目写入失败
    PlanWriteFailed { part_id: String, reason: String },
    /// 告警写入失败
    AlertWriteFailed { part_id: String, reason: String },
}

impl CycleWarning {
    pub fn part_id(&self) -> &str {
        match self {
            CycleWarning::OrphanedSnapshot { part_id }
            | CycleWarning::MissingSnapshot { part_id }
            | CycleWarning::QuotaLookupFailed { part_id, .. }
            | CycleWarning::PlanWriteFailed { part_id, .. }
            | CycleWarning::AlertWriteFailed { part_id, .. } => part_id,
        }
    }
}

impl fmt::Display for CycleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleWarning::OrphanedSnapshot { part_id } => {
                write!(f, "快照无对应定额: part_id={}", part_id)
            }
            CycleWarning::MissingSnapshot { part_id } => {
                write!(f, "定额无库存快照: part_id={}", part_id)
            }
            CycleWarning::QuotaLookupFailed { part_id, reason } => {
                write!(f, "定额查询失败: part_id={}, {}", part_id, reason)
            }
            CycleWarning::PlanWriteFailed { part_id, reason } => {
                write!(f, "自动计划写入失败: part_id={}, {}", part_id, reason)
            }
            CycleWarning::AlertWriteFailed { part_id, reason } => {
                write!(f, "告警写入失败: part_id={}, {}", part_id, reason)
            }
        }
    }
}
