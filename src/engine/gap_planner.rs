// ==========================================
// 供应链管理系统 - 补库缺口规划
// ==========================================
// 职责: SHORTAGE 判定结果 → AUTO 草稿采购计划条目
// 红线:
// - 同一部件同时至多一条未结 AUTO 条目 (幂等)
// - 不修改 MANUAL 条目
// - EXCESS / NORMAL 不产生条目
// 约束: 单部件失败转为 CycleWarning, 不影响其他部件
// ==========================================

use crate::domain::plan_entry::ProcurementPlanEntry;
use crate::domain::snapshot::{ReplenishmentGap, ThresholdStatus};
use crate::domain::types::{PlanSource, QuotaClassification};
use crate::engine::quota_registry::{resolve_quota, QuotaLookup};
use crate::engine::threshold::ThresholdEvaluator;
use crate::engine::warning::CycleWarning;
use crate::repository::plan_entry_repo::{AutoEntryOutcome, PlanEntryRepository};
use serde::Serialize;
use std::sync::Arc;

/// 规划结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanGapsResult {
    /// 本次新建的 AUTO 草稿条目
    pub created: Vec<ProcurementPlanEntry>,
    /// 全部 SHORTAGE 部件的缺口 (含已有未结条目的部件)
    pub gaps: Vec<ReplenishmentGap>,
    /// 已有未结 AUTO 条目而跳过的部件
    pub skipped_open: Vec<String>,
    pub warnings: Vec<CycleWarning>,
}

// ==========================================
// GapReplenishmentPlanner - 补库缺口规划
// ==========================================
pub struct GapReplenishmentPlanner {
    plan_repo: Arc<PlanEntryRepository>,
    quotas: Arc<dyn QuotaLookup>,
    evaluator: ThresholdEvaluator,
    min_suggested_qty: i64,
}

impl GapReplenishmentPlanner {
    /// # 参数
    /// - `min_suggested_qty`: 建议量下限 (小于 1 时按 1)
    pub fn new(
        plan_repo: Arc<PlanEntryRepository>,
        quotas: Arc<dyn QuotaLookup>,
        min_suggested_qty: i64,
    ) -> Self {
        Self {
            plan_repo,
            quotas,
            evaluator: ThresholdEvaluator::new(),
            min_suggested_qty: min_suggested_qty.max(1),
        }
    }

    /// 为 SHORTAGE 部件生成 AUTO 草稿条目
    ///
    /// # 返回
    /// 新建条目 + 缺口 + 跳过记录 + 告警信号
    pub fn plan_gaps(&self, statuses: &[ThresholdStatus]) -> PlanGapsResult {
        let mut result = PlanGapsResult::default();

        for status in statuses {
            if status.classification != QuotaClassification::Shortage {
                continue;
            }

            let quota = match resolve_quota(self.quotas.as_ref(), &status.part_id) {
                Ok(quota) => quota,
                Err(warning) => {
                    result.warnings.push(warning);
                    continue;
                }
            };

            let Some(gap) = self
                .evaluator
                .replenishment_gap(&quota, status, self.min_suggested_qty)
            else {
                continue;
            };

            let entry = ProcurementPlanEntry::new_draft(
                &quota.part_id,
                &quota.drawing_no,
                &quota.part_name,
                gap.suggested_qty,
                PlanSource::Auto,
            );

            match self.plan_repo.insert_auto_if_absent(&entry) {
                Ok(AutoEntryOutcome::Created) => {
                    tracing::info!(
                        part_id = %entry.part_id,
                        entry_id = %entry.id,
                        quantity = entry.quantity,
                        deficit = gap.deficit_qty,
                        "已生成自动补库草稿"
                    );
                    result.created.push(entry);
                }
                Ok(AutoEntryOutcome::AlreadyOpen { existing_id }) => {
                    tracing::debug!(
                        part_id = %status.part_id,
                        existing_id = %existing_id,
                        "已有未结自动条目，跳过"
                    );
                    result.skipped_open.push(status.part_id.clone());
                }
                Err(e) => {
                    tracing::warn!(part_id = %status.part_id, error = %e, "自动补库草稿写入失败");
                    result.warnings.push(CycleWarning::PlanWriteFailed {
                        part_id: status.part_id.clone(),
                        reason: e.to_string(),
                    });
                }
            }

            result.gaps.push(gap);
        }

        result
    }
}
