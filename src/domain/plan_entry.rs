// ==========================================
// 供应链管理系统 - 采购计划条目
// ==========================================
// 对齐: procurement_plan_entry 表
// 红线: 同一部件同时至多一条未结 (DRAFT/APPROVED) 的 AUTO 条目
// ==========================================

use crate::domain::types::{PlanEntryStatus, PlanSource};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// ProcurementPlanEntry - 采购计划条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcurementPlanEntry {
    pub id: String,
    pub part_id: String,
    pub drawing_no: String,
    pub part_name: String,
    pub quantity: i64, // 计划数量
    pub source: PlanSource,
    pub status: PlanEntryStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ProcurementPlanEntry {
    /// 创建草稿条目
    pub fn new_draft(
        part_id: impl Into<String>,
        drawing_no: impl Into<String>,
        part_name: impl Into<String>,
        quantity: i64,
        source: PlanSource,
    ) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: format!("PLAN-{}", Uuid::new_v4()),
            part_id: part_id.into(),
            drawing_no: drawing_no.into(),
            part_name: part_name.into(),
            quantity,
            source,
            status: PlanEntryStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    /// 是否为未结的自动条目
    pub fn is_open_auto(&self) -> bool {
        self.source == PlanSource::Auto && self.status.is_open()
    }
}
