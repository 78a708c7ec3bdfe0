// ==========================================
// 供应链管理系统 - 采购计划条目 API
// ==========================================
// 职责: 人工录入计划、审批流转、查询
// 流转: DRAFT → APPROVED → ORDERED, DRAFT → REJECTED
// ==========================================

use std::sync::Arc;

use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::plan_entry::ProcurementPlanEntry;
use crate::domain::types::{PlanEntryStatus, PlanSource};
use crate::engine::quota_registry::QuotaRegistry;
use crate::repository::plan_entry_repo::PlanEntryRepository;

// ==========================================
// PlanEntryApi - 采购计划条目 API
// ==========================================
pub struct PlanEntryApi {
    plan_repo: Arc<PlanEntryRepository>,
    registry: Arc<QuotaRegistry>,
}

impl PlanEntryApi {
    pub fn new(plan_repo: Arc<PlanEntryRepository>, registry: Arc<QuotaRegistry>) -> Self {
        Self {
            plan_repo,
            registry,
        }
    }

    /// 人工录入计划条目 (MANUAL, DRAFT)
    ///
    /// # 参数
    /// - part_id: 部件ID (必须已配置定额)
    /// - quantity: 计划数量 (>= 1)
    pub fn create_manual_entry(&self, part_id: &str, quantity: i64) -> ApiResult<ProcurementPlanEntry> {
        if quantity < 1 {
            return Err(ApiError::InvalidInput(format!(
                "计划数量必须大于0: {}",
                quantity
            )));
        }
        let quota = self.registry.get(part_id.trim())?;

        let entry = ProcurementPlanEntry::new_draft(
            quota.part_id,
            quota.drawing_no,
            quota.part_name,
            quantity,
            PlanSource::Manual,
        );
        self.plan_repo.insert(&entry)?;

        info!(entry_id = %entry.id, part_id = %entry.part_id, quantity, "人工计划条目已创建");
        Ok(entry)
    }

    pub fn approve(&self, entry_id: &str) -> ApiResult<ProcurementPlanEntry> {
        self.transition(entry_id, PlanEntryStatus::Approved)
    }

    pub fn mark_ordered(&self, entry_id: &str) -> ApiResult<ProcurementPlanEntry> {
        self.transition(entry_id, PlanEntryStatus::Ordered)
    }

    pub fn reject(&self, entry_id: &str) -> ApiResult<ProcurementPlanEntry> {
        self.transition(entry_id, PlanEntryStatus::Rejected)
    }

    pub fn get_entry(&self, entry_id: &str) -> ApiResult<ProcurementPlanEntry> {
        self.plan_repo
            .find_by_id(entry_id)?
            .ok_or_else(|| ApiError::NotFound(format!("计划条目(id={})不存在", entry_id)))
    }

    pub fn list_by_part(&self, part_id: &str) -> ApiResult<Vec<ProcurementPlanEntry>> {
        Ok(self.plan_repo.list_by_part(part_id.trim())?)
    }

    /// 查询计划条目
    ///
    /// # 参数
    /// - open_only: 仅返回未结 (DRAFT/APPROVED) 条目
    pub fn list_entries(&self, open_only: bool) -> ApiResult<Vec<ProcurementPlanEntry>> {
        Ok(self.plan_repo.list(open_only)?)
    }

    fn transition(&self, entry_id: &str, to: PlanEntryStatus) -> ApiResult<ProcurementPlanEntry> {
        let entry = self.plan_repo.update_status(entry_id, to)?;
        info!(entry_id = entry_id, status = %to, "计划条目状态已更新");
        Ok(entry)
    }
}
