// ==========================================
// 供应链管理系统 - 库存快照数据仓储
// ==========================================
// 每个部件只保留最新快照
// 并发规则: 按 observed_at 严格递增写入, 旧的或同时刻的快照被拒绝 (不合并)
// ==========================================

use crate::domain::snapshot::StockSnapshot;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row, TransactionBehavior};
use std::sync::{Arc, Mutex};

/// 快照写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotWriteOutcome {
    /// 已写入 (首次或覆盖旧快照)
    Stored,
    /// 已有同时刻或更新的快照，本次不写入
    Stale { stored_observed_at: NaiveDateTime },
}

// ==========================================
// StockSnapshotRepository - 库存快照仓储
// ==========================================
pub struct StockSnapshotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StockSnapshotRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 仅当快照比已存储的更新时写入
    ///
    /// 读取-比较-写入在同一个 IMMEDIATE 事务内完成
    pub fn store_if_newer(&self, snapshot: &StockSnapshot) -> RepositoryResult<SnapshotWriteOutcome> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let stored: Option<NaiveDateTime> = tx
            .query_row(
                "SELECT observed_at FROM stock_snapshot WHERE part_id = ?1",
                params![snapshot.part_id],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(stored_observed_at) = stored {
            if snapshot.observed_at <= stored_observed_at {
                tx.rollback()?;
                return Ok(SnapshotWriteOutcome::Stale { stored_observed_at });
            }
        }

        tx.execute(
            r#"
            INSERT INTO stock_snapshot (
                part_id, current_stock, pending_supply_qty, observed_at, ingested_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(part_id) DO UPDATE SET
                current_stock = excluded.current_stock,
                pending_supply_qty = excluded.pending_supply_qty,
                observed_at = excluded.observed_at,
                ingested_at = excluded.ingested_at
            "#,
            params![
                snapshot.part_id,
                snapshot.current_stock,
                snapshot.pending_supply_qty,
                snapshot.observed_at,
                Utc::now().naive_utc(),
            ],
        )?;
        tx.commit()?;

        Ok(SnapshotWriteOutcome::Stored)
    }

    /// 查询部件的最新快照
    pub fn find_latest(&self, part_id: &str) -> RepositoryResult<Option<StockSnapshot>> {
        let conn = self.get_conn()?;
        let snapshot = conn
            .query_row(
                r#"
                SELECT part_id, current_stock, pending_supply_qty, observed_at
                FROM stock_snapshot
                WHERE part_id = ?1
                "#,
                params![part_id],
                map_row,
            )
            .optional()?;
        Ok(snapshot)
    }

    /// 查询所有部件的最新快照
    pub fn list_latest(&self) -> RepositoryResult<Vec<StockSnapshot>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT part_id, current_stock, pending_supply_qty, observed_at
            FROM stock_snapshot
            ORDER BY part_id ASC
            "#,
        )?;
        let snapshots = stmt
            .query_map([], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(snapshots)
    }
}

fn map_row(row: &Row<'_>) -> SqliteResult<StockSnapshot> {
    Ok(StockSnapshot {
        part_id: row.get(0)?,
        current_stock: row.get(1)?,
        pending_supply_qty: row.get(2)?,
        observed_at: row.get(3)?,
    })
}
