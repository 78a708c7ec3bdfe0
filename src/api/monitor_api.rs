// ==========================================
// 供应链管理系统 - 定额监控 API
// ==========================================
// 职责: 触发评估周期、查询当前判定/驾驶舱汇总/告警
// 约束: 每个周期开始前重新读取配置参数, 周期内不变
// ==========================================

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::warn;

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, QuotaEngineParams};
use crate::domain::alert::Alert;
use crate::domain::snapshot::{QuotaDashboardSummary, StockReading, ThresholdStatus};
use crate::engine::quota_cycle::{CycleReport, QuotaMonitorCycle};
use crate::engine::quota_registry::QuotaRegistry;
use crate::importer::snapshot_feed::SnapshotFeedReader;
use crate::repository::alert_repo::AlertRepository;
use crate::repository::plan_entry_repo::PlanEntryRepository;
use crate::repository::snapshot_repo::StockSnapshotRepository;

/// 告警查询默认条数上限
pub const DEFAULT_ALERT_LIMIT: usize = 200;

// ==========================================
// MonitorApi - 定额监控 API
// ==========================================
pub struct MonitorApi {
    registry: Arc<QuotaRegistry>,
    snapshot_repo: Arc<StockSnapshotRepository>,
    plan_repo: Arc<PlanEntryRepository>,
    alert_repo: Arc<AlertRepository>,
    config_manager: Arc<ConfigManager>,
}

impl MonitorApi {
    pub fn new(
        registry: Arc<QuotaRegistry>,
        snapshot_repo: Arc<StockSnapshotRepository>,
        plan_repo: Arc<PlanEntryRepository>,
        alert_repo: Arc<AlertRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            registry,
            snapshot_repo,
            plan_repo,
            alert_repo,
            config_manager,
        }
    }

    /// 读取本周期参数
    pub async fn load_params(&self) -> ApiResult<QuotaEngineParams> {
        QuotaEngineParams::load(self.config_manager.as_ref())
            .await
            .map_err(|e| ApiError::InternalError(format!("配置读取失败: {}", e)))
    }

    /// 构建评估周期 (参数固定)
    pub fn build_cycle(&self, params: QuotaEngineParams) -> QuotaMonitorCycle {
        QuotaMonitorCycle::new(
            self.registry.clone(),
            self.snapshot_repo.clone(),
            self.plan_repo.clone(),
            self.alert_repo.clone(),
            params,
        )
    }

    /// 以给定参数执行评估周期
    pub fn run_cycle_with(
        &self,
        params: QuotaEngineParams,
        readings: &[StockReading],
    ) -> ApiResult<CycleReport> {
        Ok(self.build_cycle(params).run_cycle(readings)?)
    }

    /// 读取最新配置后执行评估周期
    pub async fn run_cycle(&self, readings: &[StockReading]) -> ApiResult<CycleReport> {
        let params = self.load_params().await?;
        self.run_cycle_with(params, readings)
    }

    /// 读取 CSV 馈送后执行评估周期 (被拒绝的行只记日志)
    pub async fn run_cycle_from_feed<P: AsRef<Path>>(&self, feed_path: P) -> ApiResult<CycleReport> {
        let feed = SnapshotFeedReader::new().read_file(feed_path)?;
        for rejected in &feed.rejected {
            warn!(row = rejected.row, reason = %rejected.reason, "馈送行未接入");
        }
        self.run_cycle(&feed.readings).await
    }

    /// 当前判定结果 (不写库)
    pub fn current_statuses(&self) -> ApiResult<Vec<ThresholdStatus>> {
        Ok(self
            .build_cycle(QuotaEngineParams::default())
            .current_statuses()?)
    }

    /// 驾驶舱汇总 (低库存预警 / 高库存预警 / 总SKU)
    pub fn dashboard_summary(&self) -> ApiResult<QuotaDashboardSummary> {
        let statuses = self.current_statuses()?;
        Ok(QuotaDashboardSummary::from_statuses(&statuses))
    }

    /// 查询告警
    ///
    /// # 参数
    /// - part_id: 可选部件过滤
    /// - observed_since: 可选起始时间
    /// - limit: 条数上限 (None 时为 DEFAULT_ALERT_LIMIT)
    pub fn list_alerts(
        &self,
        part_id: Option<&str>,
        observed_since: Option<NaiveDateTime>,
        limit: Option<usize>,
    ) -> ApiResult<Vec<Alert>> {
        let limit = limit.unwrap_or(DEFAULT_ALERT_LIMIT);
        if limit == 0 {
            return Err(ApiError::InvalidInput("limit 必须大于0".to_string()));
        }
        Ok(self.alert_repo.list(part_id, observed_since, limit)?)
    }
}
