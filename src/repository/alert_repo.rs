// ==========================================
// 供应链管理系统 - 库存告警数据仓储
// ==========================================
// 告警写入后不可变; 以 dedup_key 唯一约束去重 (INSERT OR IGNORE)
// 已读状态由通知中心维护，不在此表
// ==========================================

use crate::domain::alert::Alert;
use crate::domain::types::{AlertKind, AlertSeverity};
use crate::repository::error::{invalid_column, RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT id, dedup_key, part_id, kind, severity,
           current_stock, projected_stock, quota, observed_at,
           title, title_en, message, message_en, created_at
    FROM quota_alert
"#;

// ==========================================
// AlertRepository - 告警仓储
// ==========================================
pub struct AlertRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AlertRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入告警 (去重键已存在时忽略)
    ///
    /// # 返回
    /// - true: 新写入
    /// - false: 已存在相同去重键的告警
    pub fn insert_if_absent(&self, alert: &Alert) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            INSERT OR IGNORE INTO quota_alert (
                id, dedup_key, part_id, kind, severity,
                current_stock, projected_stock, quota, observed_at,
                title, title_en, message, message_en, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                alert.id,
                alert.dedup_key,
                alert.part_id,
                alert.kind.to_db_str(),
                alert.severity.to_db_str(),
                alert.current_stock,
                alert.projected_stock,
                alert.quota,
                alert.observed_at,
                alert.title,
                alert.title_en,
                alert.message,
                alert.message_en,
                alert.created_at,
            ],
        )?;
        Ok(affected > 0)
    }

    /// 查询告警 (新的在前)
    ///
    /// # 参数
    /// - `part_id`: 仅返回该部件的告警
    /// - `observed_since`: 仅返回 observed_at >= 该时间的告警
    /// - `limit`: 最大条数
    pub fn list(
        &self,
        part_id: Option<&str>,
        observed_since: Option<NaiveDateTime>,
        limit: usize,
    ) -> RepositoryResult<Vec<Alert>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"{}
            WHERE (?1 IS NULL OR part_id = ?1)
              AND (?2 IS NULL OR observed_at >= ?2)
            ORDER BY observed_at DESC, id ASC
            LIMIT ?3
            "#,
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let alerts = stmt
            .query_map(params![part_id, observed_since, limit as i64], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(alerts)
    }

    /// 告警总数
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM quota_alert", [], |row| row.get(0))?;
        Ok(n)
    }
}

fn map_row(row: &Row<'_>) -> SqliteResult<Alert> {
    let kind_raw: String = row.get(3)?;
    let severity_raw: String = row.get(4)?;
    Ok(Alert {
        id: row.get(0)?,
        dedup_key: row.get(1)?,
        part_id: row.get(2)?,
        kind: AlertKind::from_db_str(&kind_raw).ok_or_else(|| invalid_column(3, &kind_raw))?,
        severity: AlertSeverity::from_db_str(&severity_raw)
            .ok_or_else(|| invalid_column(4, &severity_raw))?,
        current_stock: row.get(5)?,
        projected_stock: row.get(6)?,
        quota: row.get(7)?,
        observed_at: row.get(8)?,
        title: row.get(9)?,
        title_en: row.get(10)?,
        message: row.get(11)?,
        message_en: row.get(12)?,
        created_at: row.get(13)?,
    })
}
