// ==========================================
// 供应链管理系统 - 库存告警
// ==========================================
// 对齐: quota_alert 表
// 写入后不可变, 由通知中心消费 (已读状态不在本系统)
// 去重键: (part_id, kind, observed_at)
// ==========================================

use crate::domain::types::{AlertKind, AlertSeverity};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 去重键中 observed_at 的格式 (纳秒精度, 与快照过期判定的精度一致)
const OBSERVED_AT_KEY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9f";

// ==========================================
// Alert - 库存告警
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub dedup_key: String,
    pub part_id: String,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub current_stock: i64,
    pub projected_stock: i64,
    /// 被突破的定额 (Shortage → 低储, Excess → 高储)
    pub quota: i64,
    pub observed_at: NaiveDateTime,

    // ===== 通知文案 (中/英) =====
    pub title: String,
    pub title_en: String,
    pub message: String,
    pub message_en: String,

    pub created_at: NaiveDateTime,
}

/// 生成告警去重键
pub fn alert_dedup_key(part_id: &str, kind: AlertKind, observed_at: &NaiveDateTime) -> String {
    format!(
        "{}|{}|{}",
        part_id,
        kind.to_db_str(),
        observed_at.format(OBSERVED_AT_KEY_FORMAT)
    )
}

/// 由去重键派生确定性告警 ID
pub fn alert_id_from_key(dedup_key: &str) -> String {
    format!(
        "ALERT-{}",
        Uuid::new_v5(&Uuid::NAMESPACE_OID, dedup_key.as_bytes())
    )
}
