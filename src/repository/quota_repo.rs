// ==========================================
// 供应链管理系统 - 储备定额数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑 (定额区间校验在 QuotaRegistry)
// 约束: 删除定额前必须确认没有未结的采购计划条目引用
// ==========================================

use crate::domain::quota::StockQuota;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row, TransactionBehavior};
use std::sync::{Arc, Mutex};

/// 删除定额的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDeleteOutcome {
    /// 已删除
    Deleted,
    /// 定额不存在
    NotFound,
    /// 仍有未结计划条目引用，拒绝删除
    InUse { open_entries: i64 },
}

// ==========================================
// StockQuotaRepository - 储备定额仓储
// ==========================================
/// 职责: 管理 stock_quota 表的 CRUD 操作
pub struct StockQuotaRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StockQuotaRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增或覆盖定额 (按 part_id)
    pub fn upsert(&self, quota: &StockQuota) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let updated_at = quota.updated_at.unwrap_or_else(|| Utc::now().naive_utc());
        conn.execute(
            r#"
            INSERT INTO stock_quota (
                part_id, drawing_no, part_name,
                low_quota, reserve_quota, high_quota, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(part_id) DO UPDATE SET
                drawing_no = excluded.drawing_no,
                part_name = excluded.part_name,
                low_quota = excluded.low_quota,
                reserve_quota = excluded.reserve_quota,
                high_quota = excluded.high_quota,
                updated_at = excluded.updated_at
            "#,
            params![
                quota.part_id,
                quota.drawing_no,
                quota.part_name,
                quota.low_quota,
                quota.reserve_quota,
                quota.high_quota,
                updated_at,
            ],
        )?;
        Ok(())
    }

    /// 按部件ID查询
    ///
    /// # 返回
    /// - Ok(Some(StockQuota)): 找到定额
    /// - Ok(None): 未找到
    /// - Err: 数据库错误
    pub fn find_by_part_id(&self, part_id: &str) -> RepositoryResult<Option<StockQuota>> {
        let conn = self.get_conn()?;
        let quota = conn
            .query_row(
                r#"
                SELECT part_id, drawing_no, part_name,
                       low_quota, reserve_quota, high_quota, updated_at
                FROM stock_quota
                WHERE part_id = ?1
                "#,
                params![part_id],
                map_row,
            )
            .optional()?;
        Ok(quota)
    }

    /// 查询全部定额 (按 part_id 排序)
    pub fn list_all(&self) -> RepositoryResult<Vec<StockQuota>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT part_id, drawing_no, part_name,
                   low_quota, reserve_quota, high_quota, updated_at
            FROM stock_quota
            ORDER BY part_id ASC
            "#,
        )?;

        let quotas = stmt
            .query_map([], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(quotas)
    }

    /// 删除定额 (无未结计划条目引用时)
    ///
    /// 检查与删除在同一个 IMMEDIATE 事务内完成
    pub fn delete_if_unreferenced(&self, part_id: &str) -> RepositoryResult<QuotaDeleteOutcome> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let open_entries: i64 = tx.query_row(
            r#"
            SELECT COUNT(*) FROM procurement_plan_entry
            WHERE part_id = ?1 AND status IN ('DRAFT', 'APPROVED')
            "#,
            params![part_id],
            |row| row.get(0),
        )?;

        if open_entries > 0 {
            tx.rollback()?;
            return Ok(QuotaDeleteOutcome::InUse { open_entries });
        }

        let affected = tx.execute("DELETE FROM stock_quota WHERE part_id = ?1", params![part_id])?;
        tx.commit()?;

        if affected == 0 {
            Ok(QuotaDeleteOutcome::NotFound)
        } else {
            Ok(QuotaDeleteOutcome::Deleted)
        }
    }

    /// 定额总数
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM stock_quota", [], |row| row.get(0))?;
        Ok(n)
    }
}

fn map_row(row: &Row<'_>) -> SqliteResult<StockQuota> {
    Ok(StockQuota {
        part_id: row.get(0)?,
        drawing_no: row.get(1)?,
        part_name: row.get(2)?,
        low_quota: row.get(3)?,
        reserve_quota: row.get(4)?,
        high_quota: row.get(5)?,
        updated_at: row.get(6)?,
    })
}
