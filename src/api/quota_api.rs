// ==========================================
// 供应链管理系统 - 储备定额 API
// ==========================================
// 职责: 储备定额的新增/修改/查询/删除
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::quota::StockQuota;
use crate::engine::quota_registry::QuotaRegistry;

/// 定额写入请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertQuotaRequest {
    pub part_id: String,
    pub drawing_no: String,
    pub part_name: String,
    pub low_quota: i64,
    pub reserve_quota: i64,
    pub high_quota: i64,
}

impl From<UpsertQuotaRequest> for StockQuota {
    fn from(req: UpsertQuotaRequest) -> Self {
        StockQuota::new(
            req.part_id,
            req.drawing_no,
            req.part_name,
            req.low_quota,
            req.reserve_quota,
            req.high_quota,
        )
    }
}

// ==========================================
// QuotaApi - 储备定额 API
// ==========================================
pub struct QuotaApi {
    registry: Arc<QuotaRegistry>,
}

impl QuotaApi {
    pub fn new(registry: Arc<QuotaRegistry>) -> Self {
        Self { registry }
    }

    /// 新增或修改定额
    ///
    /// # 返回
    /// - Ok(StockQuota): 写入后的定额
    /// - Err(ApiError::InvalidQuotaRange): 区间非法 (原定额保持不变)
    pub fn upsert_quota(&self, req: UpsertQuotaRequest) -> ApiResult<StockQuota> {
        let quota: StockQuota = req.into();
        self.registry.upsert(&quota)?;
        Ok(self.registry.get(quota.part_id.trim())?)
    }

    pub fn get_quota(&self, part_id: &str) -> ApiResult<StockQuota> {
        if part_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("部件ID不能为空".to_string()));
        }
        Ok(self.registry.get(part_id.trim())?)
    }

    pub fn list_quotas(&self) -> ApiResult<Vec<StockQuota>> {
        Ok(self.registry.list()?)
    }

    /// 删除定额
    ///
    /// # 返回
    /// - Err(ApiError::QuotaInUse): 仍有未结计划条目引用
    pub fn remove_quota(&self, part_id: &str) -> ApiResult<()> {
        self.registry.remove(part_id.trim())?;
        info!(part_id = part_id, "定额已通过 API 删除");
        Ok(())
    }
}
