// ==========================================
// 供应链管理系统 - 采购计划条目数据仓储
// ==========================================
// 红线: 同一部件至多一条未结 AUTO 条目
//   1. insert_auto_if_absent 在 IMMEDIATE 事务内先查后写
//   2. 部分唯一索引 uq_plan_entry_open_auto 兜底
// ==========================================

use crate::domain::plan_entry::ProcurementPlanEntry;
use crate::domain::types::{PlanEntryStatus, PlanSource};
use crate::repository::error::{invalid_column, RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row, TransactionBehavior};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT id, part_id, drawing_no, part_name, quantity,
           source, status, created_at, updated_at
    FROM procurement_plan_entry
"#;

/// 自动条目写入结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoEntryOutcome {
    /// 新建成功
    Created,
    /// 已存在未结 AUTO 条目，跳过
    AlreadyOpen { existing_id: String },
}

// ==========================================
// PlanEntryRepository - 采购计划条目仓储
// ==========================================
pub struct PlanEntryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlanEntryRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入条目 (不做幂等检查，用于人工条目)
    pub fn insert(&self, entry: &ProcurementPlanEntry) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        insert_row(&conn, entry)?;
        Ok(())
    }

    /// 部件无未结 AUTO 条目时写入
    ///
    /// # 返回
    /// - Created: 已写入
    /// - AlreadyOpen: 已有未结 AUTO 条目，未写入
    pub fn insert_auto_if_absent(
        &self,
        entry: &ProcurementPlanEntry,
    ) -> RepositoryResult<AutoEntryOutcome> {
        if entry.source != PlanSource::Auto {
            return Err(RepositoryError::BusinessRuleViolation(format!(
                "仅 AUTO 条目可走幂等写入: id={}",
                entry.id
            )));
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(existing_id) = find_open_auto_id(&tx, &entry.part_id)? {
            tx.rollback()?;
            return Ok(AutoEntryOutcome::AlreadyOpen { existing_id });
        }

        match insert_row(&tx, entry).map_err(RepositoryError::from) {
            Ok(_) => {
                tx.commit()?;
                Ok(AutoEntryOutcome::Created)
            }
            // uq_plan_entry_open_auto 兜底: 按已存在处理
            Err(e) if e.is_unique_violation() => {
                let existing_id = find_open_auto_id(&tx, &entry.part_id)?;
                tx.rollback()?;
                match existing_id {
                    Some(existing_id) => {
                        tracing::warn!(
                            part_id = %entry.part_id,
                            existing_id = %existing_id,
                            "部分唯一索引拦截重复 AUTO 条目"
                        );
                        Ok(AutoEntryOutcome::AlreadyOpen { existing_id })
                    }
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// 按ID查询
    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<ProcurementPlanEntry>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        let entry = conn.query_row(&sql, params![id], map_row).optional()?;
        Ok(entry)
    }

    /// 查询部件的全部条目 (新的在前)
    pub fn list_by_part(&self, part_id: &str) -> RepositoryResult<Vec<ProcurementPlanEntry>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE part_id = ?1 ORDER BY created_at DESC, id ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params![part_id], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(entries)
    }

    /// 查询条目列表
    ///
    /// # 参数
    /// - `open_only`: 仅返回未结条目 (DRAFT / APPROVED)
    pub fn list(&self, open_only: bool) -> RepositoryResult<Vec<ProcurementPlanEntry>> {
        let conn = self.get_conn()?;
        let sql = if open_only {
            format!(
                "{} WHERE status IN ('DRAFT', 'APPROVED') ORDER BY created_at DESC, id ASC",
                SELECT_COLUMNS
            )
        } else {
            format!("{} ORDER BY created_at DESC, id ASC", SELECT_COLUMNS)
        };
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map([], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(entries)
    }

    /// 状态流转
    ///
    /// # 错误
    /// - NotFound: 条目不存在
    /// - InvalidStateTransition: 非法流转 (如 DRAFT → ORDERED)
    pub fn update_status(
        &self,
        id: &str,
        to: PlanEntryStatus,
    ) -> RepositoryResult<ProcurementPlanEntry> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        let mut entry = tx
            .query_row(&sql, params![id], map_row)
            .optional()?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "ProcurementPlanEntry".to_string(),
                id: id.to_string(),
            })?;

        if !entry.status.can_transition_to(to) {
            return Err(RepositoryError::InvalidStateTransition {
                from: entry.status.to_string(),
                to: to.to_string(),
            });
        }

        let now = Utc::now().naive_utc();
        tx.execute(
            "UPDATE procurement_plan_entry SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![to.to_db_str(), now, id],
        )?;
        tx.commit()?;

        entry.status = to;
        entry.updated_at = now;
        Ok(entry)
    }
}

fn find_open_auto_id(conn: &Connection, part_id: &str) -> SqliteResult<Option<String>> {
    conn.query_row(
        r#"
        SELECT id FROM procurement_plan_entry
        WHERE part_id = ?1 AND source = 'AUTO' AND status IN ('DRAFT', 'APPROVED')
        LIMIT 1
        "#,
        params![part_id],
        |row| row.get(0),
    )
    .optional()
}

fn insert_row(conn: &Connection, entry: &ProcurementPlanEntry) -> SqliteResult<usize> {
    conn.execute(
        r#"
        INSERT INTO procurement_plan_entry (
            id, part_id, drawing_no, part_name, quantity,
            source, status, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            entry.id,
            entry.part_id,
            entry.drawing_no,
            entry.part_name,
            entry.quantity,
            entry.source.to_db_str(),
            entry.status.to_db_str(),
            entry.created_at,
            entry.updated_at,
        ],
    )
}

fn map_row(row: &Row<'_>) -> SqliteResult<ProcurementPlanEntry> {
    let source_raw: String = row.get(5)?;
    let status_raw: String = row.get(6)?;
    Ok(ProcurementPlanEntry {
        id: row.get(0)?,
        part_id: row.get(1)?,
        drawing_no: row.get(2)?,
        part_name: row.get(3)?,
        quantity: row.get(4)?,
        source: PlanSource::from_db_str(&source_raw).ok_or_else(|| invalid_column(5, &source_raw))?,
        status: PlanEntryStatus::from_db_str(&status_raw)
            .ok_or_else(|| invalid_column(6, &status_raw))?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;

    fn setup() -> PlanEntryRepository {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        PlanEntryRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn auto_draft(part_id: &str) -> ProcurementPlanEntry {
        ProcurementPlanEntry::new_draft(part_id, "DWG-100", "齿轮 A-12", 415, PlanSource::Auto)
    }

    #[test]
    fn test_partial_unique_index_rejects_second_open_auto() {
        let repo = setup();
        let first = auto_draft("Q001");
        repo.insert(&first).unwrap();

        // 绕过幂等写入时由部分唯一索引拦截
        let err = repo.insert(&auto_draft("Q001")).unwrap_err();
        assert!(err.is_unique_violation(), "实际错误: {:?}", err);

        let outcome = repo.insert_auto_if_absent(&auto_draft("Q001")).unwrap();
        assert_eq!(
            outcome,
            AutoEntryOutcome::AlreadyOpen {
                existing_id: first.id.clone()
            }
        );
        assert_eq!(repo.list_by_part("Q001").unwrap().len(), 1);
    }

    #[test]
    fn test_closed_auto_entry_does_not_block() {
        let repo = setup();
        let first = auto_draft("Q001");
        repo.insert(&first).unwrap();
        repo.update_status(&first.id, PlanEntryStatus::Rejected).unwrap();

        let outcome = repo.insert_auto_if_absent(&auto_draft("Q001")).unwrap();
        assert_eq!(outcome, AutoEntryOutcome::Created);
    }
}
