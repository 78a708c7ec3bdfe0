// ==========================================
// 供应链管理系统 - 库存快照接入
// ==========================================
// 职责: 将外部库存读数归一化为统一的 StockSnapshot 并落库
// 规则:
// - 数量必须非负
// - 同一部件 observed_at 严格递增; 旧的或同时刻的快照为 StaleSnapshot
//   (不报错, 仅作为对账信号记录日志)
// ==========================================

use crate::domain::snapshot::{StockReading, StockSnapshot};
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::snapshot_repo::{SnapshotWriteOutcome, StockSnapshotRepository};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::sync::Arc;

/// 单条快照接入结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// 已接入 (成为该部件的最新快照)
    Accepted(StockSnapshot),
    /// 过期快照，未写入
    Stale(StaleSnapshot),
}

/// 过期快照信息 (对账信号)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleSnapshot {
    pub part_id: String,
    pub observed_at: NaiveDateTime,
    pub stored_observed_at: NaiveDateTime,
}

/// 接入失败的读数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestFailure {
    pub part_id: String,
    pub reason: String,
}

/// 批量接入报告
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestBatchReport {
    pub accepted: Vec<StockSnapshot>,
    pub stale: Vec<StaleSnapshot>,
    pub failed: Vec<IngestFailure>,
}

// ==========================================
// StockSnapshotIngester - 库存快照接入
// ==========================================
pub struct StockSnapshotIngester {
    snapshot_repo: Arc<StockSnapshotRepository>,
}

impl StockSnapshotIngester {
    pub fn new(snapshot_repo: Arc<StockSnapshotRepository>) -> Self {
        Self { snapshot_repo }
    }

    /// 接入单条快照
    ///
    /// # 错误
    /// - InvalidInput: part_id 为空
    /// - InvalidQuantity: 库存或在途为负
    /// - QuantityOverflow: 库存 + 在途超出 i64 范围
    pub fn ingest(
        &self,
        part_id: &str,
        current_stock: i64,
        pending_supply_qty: i64,
        observed_at: NaiveDateTime,
    ) -> EngineResult<IngestOutcome> {
        let part_id = part_id.trim();
        if part_id.is_empty() {
            return Err(EngineError::InvalidInput("部件ID不能为空".to_string()));
        }
        check_non_negative(part_id, "current_stock", current_stock)?;
        check_non_negative(part_id, "pending_supply_qty", pending_supply_qty)?;
        if current_stock.checked_add(pending_supply_qty).is_none() {
            return Err(EngineError::QuantityOverflow {
                part_id: part_id.to_string(),
                field: "projected_stock".to_string(),
            });
        }

        let snapshot = StockSnapshot {
            part_id: part_id.to_string(),
            current_stock,
            pending_supply_qty,
            observed_at,
        };

        match self.snapshot_repo.store_if_newer(&snapshot)? {
            SnapshotWriteOutcome::Stored => {
                tracing::debug!(
                    part_id = %snapshot.part_id,
                    current_stock,
                    pending_supply_qty,
                    observed_at = %observed_at,
                    "库存快照已接入"
                );
                Ok(IngestOutcome::Accepted(snapshot))
            }
            SnapshotWriteOutcome::Stale { stored_observed_at } => {
                tracing::warn!(
                    part_id = %snapshot.part_id,
                    observed_at = %observed_at,
                    stored_observed_at = %stored_observed_at,
                    "过期库存快照被忽略 (对账信号)"
                );
                Ok(IngestOutcome::Stale(StaleSnapshot {
                    part_id: snapshot.part_id,
                    observed_at,
                    stored_observed_at,
                }))
            }
        }
    }

    /// 接入外部读数 (先归一化在途量)
    ///
    /// 显式在途量与每条明细在归一化前分别校验, 负值不与明细相抵
    pub fn ingest_reading(&self, reading: &StockReading) -> EngineResult<IngestOutcome> {
        if let Some(pending) = reading.pending_supply_qty {
            check_non_negative(&reading.part_id, "pending_supply_qty", pending)?;
        }
        for line in &reading.supply_lines {
            check_non_negative(&reading.part_id, "ordered_qty", line.ordered_qty)?;
            check_non_negative(&reading.part_id, "arrived_qty", line.arrived_qty)?;
        }
        let pending_supply_qty =
            reading
                .normalized_pending_qty()
                .ok_or_else(|| EngineError::QuantityOverflow {
                    part_id: reading.part_id.trim().to_string(),
                    field: "pending_supply_qty".to_string(),
                })?;
        self.ingest(
            &reading.part_id,
            reading.current_stock,
            pending_supply_qty,
            reading.observed_at,
        )
    }

    /// 批量接入; 单条失败不影响其他读数
    pub fn ingest_batch(&self, readings: &[StockReading]) -> IngestBatchReport {
        let mut report = IngestBatchReport::default();

        for reading in readings {
            match self.ingest_reading(reading) {
                Ok(IngestOutcome::Accepted(snapshot)) => report.accepted.push(snapshot),
                Ok(IngestOutcome::Stale(stale)) => report.stale.push(stale),
                Err(e) => {
                    tracing::warn!(part_id = %reading.part_id, error = %e, "库存读数接入失败");
                    report.failed.push(IngestFailure {
                        part_id: reading.part_id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            accepted = report.accepted.len(),
            stale = report.stale.len(),
            failed = report.failed.len(),
            "库存读数批量接入完成"
        );
        report
    }
}

fn check_non_negative(part_id: &str, field: &str, value: i64) -> EngineResult<()> {
    if value < 0 {
        return Err(EngineError::InvalidQuantity {
            part_id: part_id.to_string(),
            field: field.to_string(),
            value,
        });
    }
    Ok(())
}
