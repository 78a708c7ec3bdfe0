// ==========================================
// 供应链管理系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 集中维护定额引擎所需的表结构 (幂等建表)
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开连接并确保表结构存在
pub fn open_and_migrate(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = open_sqlite_connection(db_path)?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// 幂等建表
///
/// 表:
/// - schema_version / config_scope / config_kv
/// - stock_quota: 储备定额
/// - stock_snapshot: 每个部件的最新库存快照
/// - procurement_plan_entry: 采购计划条目
/// - quota_alert: 库存告警
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS stock_quota (
            part_id TEXT PRIMARY KEY,
            drawing_no TEXT NOT NULL,
            part_name TEXT NOT NULL,
            low_quota INTEGER NOT NULL CHECK(low_quota >= 0),
            reserve_quota INTEGER NOT NULL,
            high_quota INTEGER NOT NULL,
            updated_at TEXT NOT NULL,
            CHECK(low_quota <= reserve_quota AND reserve_quota <= high_quota)
        );

        CREATE TABLE IF NOT EXISTS stock_snapshot (
            part_id TEXT PRIMARY KEY,
            current_stock INTEGER NOT NULL CHECK(current_stock >= 0),
            pending_supply_qty INTEGER NOT NULL CHECK(pending_supply_qty >= 0),
            observed_at TEXT NOT NULL,
            ingested_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS procurement_plan_entry (
            id TEXT PRIMARY KEY,
            part_id TEXT NOT NULL,
            drawing_no TEXT NOT NULL,
            part_name TEXT NOT NULL,
            quantity INTEGER NOT NULL CHECK(quantity > 0),
            source TEXT NOT NULL CHECK(source IN ('AUTO', 'MANUAL')),
            status TEXT NOT NULL CHECK(status IN ('DRAFT', 'APPROVED', 'ORDERED', 'REJECTED')),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_plan_entry_part ON procurement_plan_entry(part_id);
        CREATE UNIQUE INDEX IF NOT EXISTS uq_plan_entry_open_auto
            ON procurement_plan_entry(part_id)
            WHERE source = 'AUTO' AND status IN ('DRAFT', 'APPROVED');

        CREATE TABLE IF NOT EXISTS quota_alert (
            id TEXT PRIMARY KEY,
            dedup_key TEXT NOT NULL UNIQUE,
            part_id TEXT NOT NULL,
            kind TEXT NOT NULL CHECK(kind IN ('SHORTAGE', 'EXCESS')),
            severity TEXT NOT NULL CHECK(severity IN ('INFO', 'WARNING', 'CRITICAL')),
            current_stock INTEGER NOT NULL,
            projected_stock INTEGER NOT NULL,
            quota INTEGER NOT NULL,
            observed_at TEXT NOT NULL,
            title TEXT NOT NULL,
            title_en TEXT NOT NULL,
            message TEXT NOT NULL,
            message_en TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_quota_alert_part ON quota_alert(part_id);
        CREATE INDEX IF NOT EXISTS idx_quota_alert_created_at ON quota_alert(created_at DESC);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
