// ==========================================
// 供应链管理系统 - 定额评估周期
// ==========================================
// 流程: 接入读数 → 读取最新快照 → 阈值判定 → 补库规划 → 告警生成
// 约束:
// - 单周期同步执行, 周期之间不重叠 (由调用方保证)
// - 单部件问题转为 CycleWarning, 不中断周期
// - 参数在周期开始前确定, 周期内不变
// ==========================================

use crate::config::QuotaEngineParams;
use crate::domain::alert::Alert;
use crate::domain::plan_entry::ProcurementPlanEntry;
use crate::domain::snapshot::{
    QuotaDashboardSummary, ReplenishmentGap, StockReading, StockSnapshot, ThresholdStatus,
};
use crate::engine::alert_emitter::AlertEmitter;
use crate::engine::error::EngineResult;
use crate::engine::gap_planner::GapReplenishmentPlanner;
use crate::engine::quota_registry::QuotaRegistry;
use crate::engine::snapshot_ingester::{IngestBatchReport, StockSnapshotIngester};
use crate::engine::threshold::ThresholdEvaluator;
use crate::engine::warning::CycleWarning;
use crate::i18n::t;
use crate::repository::alert_repo::AlertRepository;
use crate::repository::plan_entry_repo::PlanEntryRepository;
use crate::repository::quota_repo::StockQuotaRepository;
use crate::repository::snapshot_repo::StockSnapshotRepository;
use chrono::{NaiveDateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use uuid::Uuid;

/// 单次评估周期报告
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle_id: String,
    pub started_at: NaiveDateTime,
    pub ingest: IngestBatchReport,
    pub statuses: Vec<ThresholdStatus>,
    pub gaps: Vec<ReplenishmentGap>,
    pub new_entries: Vec<ProcurementPlanEntry>,
    pub alerts: Vec<Alert>,
    pub new_alert_count: usize,
    pub warnings: Vec<CycleWarning>,
    pub summary: QuotaDashboardSummary,
}

// ==========================================
// QuotaMonitorCycle - 定额评估周期
// ==========================================
pub struct QuotaMonitorCycle {
    registry: Arc<QuotaRegistry>,
    snapshot_repo: Arc<StockSnapshotRepository>,
    ingester: StockSnapshotIngester,
    evaluator: ThresholdEvaluator,
    planner: GapReplenishmentPlanner,
    emitter: AlertEmitter,
}

impl QuotaMonitorCycle {
    pub fn new(
        registry: Arc<QuotaRegistry>,
        snapshot_repo: Arc<StockSnapshotRepository>,
        plan_repo: Arc<PlanEntryRepository>,
        alert_repo: Arc<AlertRepository>,
        params: QuotaEngineParams,
    ) -> Self {
        Self {
            ingester: StockSnapshotIngester::new(snapshot_repo.clone()),
            evaluator: ThresholdEvaluator::new(),
            planner: GapReplenishmentPlanner::new(
                plan_repo,
                registry.clone(),
                params.min_suggested_qty,
            ),
            emitter: AlertEmitter::new(alert_repo, registry.clone(), params),
            registry,
            snapshot_repo,
        }
    }

    /// 基于共享连接构建全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>, params: QuotaEngineParams) -> Self {
        Self::new(
            Arc::new(QuotaRegistry::new(Arc::new(
                StockQuotaRepository::from_connection(conn.clone()),
            ))),
            Arc::new(StockSnapshotRepository::from_connection(conn.clone())),
            Arc::new(PlanEntryRepository::from_connection(conn.clone())),
            Arc::new(AlertRepository::from_connection(conn)),
            params,
        )
    }

    /// 执行一次评估周期
    ///
    /// # 参数
    /// - `readings`: 本周期新到的库存读数 (可为空, 仅用已存快照判定)
    ///
    /// # 错误
    /// 仅在无法读取定额或快照全集时返回错误
    pub fn run_cycle(&self, readings: &[StockReading]) -> EngineResult<CycleReport> {
        let cycle_id = format!("CYCLE-{}", Uuid::new_v4());
        let started_at = Utc::now().naive_utc();
        let timer = Instant::now();
        tracing::info!(cycle_id = %cycle_id, readings = readings.len(), "{}", t("cycle.started"));

        // ===== 步骤1: 接入读数 =====
        let ingest = self.ingester.ingest_batch(readings);

        // ===== 步骤2: 判定 =====
        let mut warnings = Vec::new();
        let statuses = self.evaluate_all(&mut warnings)?;

        // ===== 步骤3: 补库规划 =====
        let planned = self.planner.plan_gaps(&statuses);
        warnings.extend(planned.warnings);

        // ===== 步骤4: 告警 =====
        let emitted = self.emitter.emit(&statuses);
        warnings.extend(emitted.warnings);

        let summary = QuotaDashboardSummary::from_statuses(&statuses);
        tracing::info!(
            cycle_id = %cycle_id,
            total = summary.total_skus,
            shortage = summary.shortage_count,
            excess = summary.excess_count,
            new_entries = planned.created.len(),
            new_alerts = emitted.new_alert_count,
            warnings = warnings.len(),
            elapsed_ms = timer.elapsed().as_millis() as u64,
            "{}",
            t("cycle.finished")
        );

        Ok(CycleReport {
            cycle_id,
            started_at,
            ingest,
            statuses,
            gaps: planned.gaps,
            new_entries: planned.created,
            alerts: emitted.alerts,
            new_alert_count: emitted.new_alert_count,
            warnings,
            summary,
        })
    }

    /// 按已存定额与最新快照判定全部部件 (不写库)
    pub fn current_statuses(&self) -> EngineResult<Vec<ThresholdStatus>> {
        let mut warnings = Vec::new();
        self.evaluate_all(&mut warnings)
    }

    fn evaluate_all(&self, warnings: &mut Vec<CycleWarning>) -> EngineResult<Vec<ThresholdStatus>> {
        let quotas = self.registry.list()?;
        let mut snapshots: HashMap<String, StockSnapshot> = self
            .snapshot_repo
            .list_latest()?
            .into_iter()
            .map(|s| (s.part_id.clone(), s))
            .collect();

        let mut statuses = Vec::with_capacity(quotas.len());
        for quota in &quotas {
            match snapshots.remove(&quota.part_id) {
                Some(snapshot) => {
                    let status = self.evaluator.evaluate(quota, &snapshot);
                    tracing::debug!(
                        part_id = %status.part_id,
                        classification = %status.classification,
                        current_stock = status.current_stock,
                        projected_stock = status.projected_stock,
                        "定额判定完成"
                    );
                    statuses.push(status);
                }
                None => {
                    tracing::debug!(part_id = %quota.part_id, "定额尚无库存快照");
                    warnings.push(CycleWarning::MissingSnapshot {
                        part_id: quota.part_id.clone(),
                    });
                }
            }
        }

        let mut orphaned: Vec<String> = snapshots.into_keys().collect();
        orphaned.sort();
        for part_id in orphaned {
            tracing::warn!(part_id = %part_id, "快照无对应定额，跳过该部件");
            warnings.push(CycleWarning::OrphanedSnapshot { part_id });
        }

        Ok(statuses)
    }
}
