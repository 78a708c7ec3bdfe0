// ==========================================
// 供应链管理系统 - 储备定额登记
// ==========================================
// 职责: 定额的权威存储入口
// 红线: 0 <= low_quota <= reserve_quota <= high_quota
//       校验失败时保持原定额不变
// 约束: 不做隐式删除; 显式删除需无未结计划条目引用
// ==========================================

use crate::domain::quota::StockQuota;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::warning::CycleWarning;
use crate::repository::quota_repo::{QuotaDeleteOutcome, StockQuotaRepository};
use chrono::Utc;
use std::sync::Arc;

// ==========================================
// QuotaLookup - 定额查询接口
// ==========================================
// 补库规划与告警在评估周期内只需要按部件查询定额
pub trait QuotaLookup: Send + Sync {
    /// 查询部件定额，不存在时返回 Ok(None)
    fn lookup(&self, part_id: &str) -> EngineResult<Option<StockQuota>>;
}

/// 评估周期内查询定额; 缺失或失败转为 CycleWarning
pub(crate) fn resolve_quota(
    quotas: &dyn QuotaLookup,
    part_id: &str,
) -> Result<StockQuota, CycleWarning> {
    match quotas.lookup(part_id) {
        Ok(Some(quota)) => Ok(quota),
        Ok(None) => {
            tracing::warn!(part_id = part_id, "快照无对应定额，跳过该部件");
            Err(CycleWarning::OrphanedSnapshot {
                part_id: part_id.to_string(),
            })
        }
        Err(e) => {
            tracing::warn!(part_id = part_id, error = %e, "定额查询失败，跳过该部件");
            Err(CycleWarning::QuotaLookupFailed {
                part_id: part_id.to_string(),
                reason: e.to_string(),
            })
        }
    }
}

// ==========================================
// QuotaRegistry - 储备定额登记
// ==========================================
pub struct QuotaRegistry {
    quota_repo: Arc<StockQuotaRepository>,
}

impl QuotaRegistry {
    pub fn new(quota_repo: Arc<StockQuotaRepository>) -> Self {
        Self { quota_repo }
    }

    /// 校验定额
    ///
    /// # 规则
    /// - part_id 不能为空
    /// - low_quota >= 0
    /// - low_quota <= reserve_quota <= high_quota
    pub fn validate(quota: &StockQuota) -> EngineResult<()> {
        if quota.part_id.trim().is_empty() {
            return Err(EngineError::InvalidInput("部件ID不能为空".to_string()));
        }
        if !quota.has_valid_range() {
            return Err(EngineError::InvalidQuotaRange {
                part_id: quota.part_id.clone(),
                low_quota: quota.low_quota,
                reserve_quota: quota.reserve_quota,
                high_quota: quota.high_quota,
            });
        }
        Ok(())
    }

    /// 新增或更新定额
    pub fn upsert(&self, quota: &StockQuota) -> EngineResult<()> {
        if let Err(e) = Self::validate(quota) {
            tracing::warn!(part_id = %quota.part_id, error = %e, "定额写入被拒绝");
            return Err(e);
        }

        let mut normalized = quota.clone();
        normalized.part_id = quota.part_id.trim().to_string();
        normalized.updated_at = Some(Utc::now().naive_utc());
        self.quota_repo.upsert(&normalized)?;

        tracing::info!(
            part_id = %normalized.part_id,
            low = normalized.low_quota,
            reserve = normalized.reserve_quota,
            high = normalized.high_quota,
            "定额已更新"
        );
        Ok(())
    }

    /// 查询定额
    ///
    /// # 错误
    /// - NotFound: 定额不存在
    pub fn get(&self, part_id: &str) -> EngineResult<StockQuota> {
        self.quota_repo
            .find_by_part_id(part_id)?
            .ok_or_else(|| EngineError::NotFound(part_id.to_string()))
    }

    /// 查询全部定额
    pub fn list(&self) -> EngineResult<Vec<StockQuota>> {
        Ok(self.quota_repo.list_all()?)
    }

    /// 显式删除定额
    ///
    /// # 错误
    /// - QuotaInUse: 仍有未结计划条目引用该部件
    /// - NotFound: 定额不存在
    pub fn remove(&self, part_id: &str) -> EngineResult<()> {
        match self.quota_repo.delete_if_unreferenced(part_id)? {
            QuotaDeleteOutcome::Deleted => {
                tracing::info!(part_id = part_id, "定额已删除");
                Ok(())
            }
            QuotaDeleteOutcome::NotFound => Err(EngineError::NotFound(part_id.to_string())),
            QuotaDeleteOutcome::InUse { open_entries } => Err(EngineError::QuotaInUse {
                part_id: part_id.to_string(),
                open_entries,
            }),
        }
    }
}

impl QuotaLookup for QuotaRegistry {
    fn lookup(&self, part_id: &str) -> EngineResult<Option<StockQuota>> {
        Ok(self.quota_repo.find_by_part_id(part_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn setup() -> QuotaRegistry {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        QuotaRegistry::new(Arc::new(StockQuotaRepository::from_connection(conn)))
    }

    #[test]
    fn test_upsert_and_get() {
        let registry = setup();
        let quota = StockQuota::new("Q001", "DWG-100", "齿轮 A-12", 100, 500, 1000);
        registry.upsert(&quota).unwrap();

        let stored = registry.get("Q001").unwrap();
        assert_eq!(stored.low_quota, 100);
        assert_eq!(stored.reserve_quota, 500);
        assert_eq!(stored.high_quota, 1000);
        assert!(stored.updated_at.is_some());
    }

    #[test]
    fn test_reupsert_refreshes_updated_at() {
        let registry = setup();
        registry
            .upsert(&StockQuota::new("Q001", "DWG-100", "齿轮 A-12", 100, 500, 1000))
            .unwrap();

        // 调用方回写 get() 得到的旧时间戳
        let mut fetched = registry.get("Q001").unwrap();
        let stale_stamp = chrono::NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        fetched.updated_at = Some(stale_stamp);
        fetched.high_quota = 1200;
        registry.upsert(&fetched).unwrap();

        let stored = registry.get("Q001").unwrap();
        assert_eq!(stored.high_quota, 1200);
        assert!(stored.updated_at.unwrap() > stale_stamp, "每次写入都应刷新 updated_at");
    }

    #[test]
    fn test_invalid_range_preserves_prior_state() {
        let registry = setup();
        registry
            .upsert(&StockQuota::new("Q001", "DWG-100", "齿轮 A-12", 100, 500, 1000))
            .unwrap();

        let bad = StockQuota::new("Q001", "DWG-100", "齿轮 A-12", 600, 500, 1000);
        let err = registry.upsert(&bad).unwrap_err();
        assert!(matches!(err, EngineError::InvalidQuotaRange { .. }));

        let negative = StockQuota::new("Q001", "DWG-100", "齿轮 A-12", -1, 500, 1000);
        assert!(matches!(
            registry.upsert(&negative).unwrap_err(),
            EngineError::InvalidQuotaRange { .. }
        ));

        let stored = registry.get("Q001").unwrap();
        assert_eq!(stored.low_quota, 100, "非法写入后原定额应保持不变");
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let registry = setup();
        assert!(matches!(registry.get("NOPE").unwrap_err(), EngineError::NotFound(_)));
        assert!(registry.lookup("NOPE").unwrap().is_none());
    }

    #[test]
    fn test_blank_part_id_rejected() {
        let registry = setup();
        let quota = StockQuota::new("  ", "DWG-100", "齿轮 A-12", 1, 2, 3);
        assert!(matches!(registry.upsert(&quota).unwrap_err(), EngineError::InvalidInput(_)));
    }
}
