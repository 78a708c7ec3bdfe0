// ==========================================
// 供应链管理系统 - 库存告警生成
// ==========================================
// 职责: SHORTAGE / EXCESS 判定结果 → 告警记录 (供通知中心消费)
// 规则:
// - NORMAL 不产生告警, 不生成 "已恢复" 告警
// - 去重键 (part_id, kind, observed_at); 告警ID 由去重键确定性派生
// - 写入采用 INSERT OR IGNORE, 重放同一快照不重复落库
// 严重度:
// - SHORTAGE: current <= low * shortage_critical_ratio → CRITICAL, 否则 WARNING
// - EXCESS:   projected >= high * excess_warning_ratio → WARNING,  否则 INFO
// ==========================================

use crate::config::QuotaEngineParams;
use crate::domain::alert::{alert_dedup_key, alert_id_from_key, Alert};
use crate::domain::quota::StockQuota;
use crate::domain::snapshot::ThresholdStatus;
use crate::domain::types::{AlertKind, AlertSeverity};
use crate::engine::quota_registry::{resolve_quota, QuotaLookup};
use crate::engine::warning::CycleWarning;
use crate::i18n::t_in;
use crate::repository::alert_repo::AlertRepository;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

/// 告警生成结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmitResult {
    /// 本次构建的告警 (重放时 ID 不变)
    pub alerts: Vec<Alert>,
    /// 新落库的告警数
    pub new_alert_count: usize,
    pub warnings: Vec<CycleWarning>,
}

// ==========================================
// AlertEmitter - 告警生成
// ==========================================
pub struct AlertEmitter {
    alert_repo: Arc<AlertRepository>,
    quotas: Arc<dyn QuotaLookup>,
    params: QuotaEngineParams,
}

impl AlertEmitter {
    pub fn new(
        alert_repo: Arc<AlertRepository>,
        quotas: Arc<dyn QuotaLookup>,
        params: QuotaEngineParams,
    ) -> Self {
        Self {
            alert_repo,
            quotas,
            params,
        }
    }

    /// 生成并写入告警
    pub fn emit(&self, statuses: &[ThresholdStatus]) -> EmitResult {
        let mut result = EmitResult::default();

        for status in statuses {
            let Some(kind) = AlertKind::from_classification(status.classification) else {
                continue;
            };

            let quota = match resolve_quota(self.quotas.as_ref(), &status.part_id) {
                Ok(quota) => quota,
                Err(warning) => {
                    result.warnings.push(warning);
                    continue;
                }
            };

            let alert = self.build_alert(&quota, status, kind);
            match self.alert_repo.insert_if_absent(&alert) {
                Ok(true) => {
                    tracing::info!(
                        part_id = %alert.part_id,
                        kind = %alert.kind,
                        severity = %alert.severity,
                        "库存告警已生成"
                    );
                    result.new_alert_count += 1;
                }
                Ok(false) => {
                    tracing::debug!(dedup_key = %alert.dedup_key, "告警已存在，跳过写入");
                }
                Err(e) => {
                    tracing::warn!(part_id = %status.part_id, error = %e, "告警写入失败");
                    result.warnings.push(CycleWarning::AlertWriteFailed {
                        part_id: status.part_id.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            }
            result.alerts.push(alert);
        }

        result
    }

    /// 构建告警 (不落库)
    pub fn build_alert(&self, quota: &StockQuota, status: &ThresholdStatus, kind: AlertKind) -> Alert {
        let dedup_key = alert_dedup_key(&status.part_id, kind, &status.observed_at);
        let severity = self.severity(quota, status, kind);

        let (crossed, title_key, message_key) = match kind {
            AlertKind::Shortage => (
                quota.low_quota,
                "alert.shortage_title",
                "alert.shortage_message",
            ),
            AlertKind::Excess => (
                quota.high_quota,
                "alert.excess_title",
                "alert.excess_message",
            ),
        };

        let current_stock = status.current_stock.to_string();
        let projected_stock = status.projected_stock.to_string();
        let crossed_str = crossed.to_string();
        let reserve_quota = quota.reserve_quota.to_string();
        let args = [
            ("part_name", quota.part_name.as_str()),
            ("drawing_no", quota.drawing_no.as_str()),
            ("current_stock", current_stock.as_str()),
            ("projected_stock", projected_stock.as_str()),
            ("quota", crossed_str.as_str()),
            ("reserve_quota", reserve_quota.as_str()),
        ];

        Alert {
            id: alert_id_from_key(&dedup_key),
            dedup_key,
            part_id: status.part_id.clone(),
            kind,
            severity,
            current_stock: status.current_stock,
            projected_stock: status.projected_stock,
            quota: crossed,
            observed_at: status.observed_at,
            title: t_in("zh-CN", title_key, &args),
            title_en: t_in("en", title_key, &args),
            message: t_in("zh-CN", message_key, &args),
            message_en: t_in("en", message_key, &args),
            created_at: Utc::now().naive_utc(),
        }
    }

    /// 计算告警严重度
    pub fn severity(&self, quota: &StockQuota, status: &ThresholdStatus, kind: AlertKind) -> AlertSeverity {
        match kind {
            AlertKind::Shortage => {
                let critical_line = quota.low_quota as f64 * self.params.shortage_critical_ratio;
                if status.current_stock as f64 <= critical_line {
                    AlertSeverity::Critical
                } else {
                    AlertSeverity::Warning
                }
            }
            AlertKind::Excess => {
                let warning_line = quota.high_quota as f64 * self.params.excess_warning_ratio;
                if status.projected_stock as f64 >= warning_line {
                    AlertSeverity::Warning
                } else {
                    AlertSeverity::Info
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;
    use crate::domain::types::QuotaClassification;
    use crate::engine::quota_registry::QuotaRegistry;
    use crate::repository::quota_repo::StockQuotaRepository;
    use chrono::{NaiveDate, NaiveDateTime};
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn setup() -> (AlertEmitter, Arc<AlertRepository>) {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));

        let registry = Arc::new(QuotaRegistry::new(Arc::new(
            StockQuotaRepository::from_connection(conn.clone()),
        )));
        registry
            .upsert(&StockQuota::new("Q001", "DWG-100", "齿轮 A-12", 100, 500, 1000))
            .unwrap();

        let alert_repo = Arc::new(AlertRepository::from_connection(conn));
        let emitter = AlertEmitter::new(alert_repo.clone(), registry, QuotaEngineParams::default());
        (emitter, alert_repo)
    }

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn status(classification: QuotaClassification, current: i64, projected: i64) -> ThresholdStatus {
        ThresholdStatus {
            part_id: "Q001".to_string(),
            classification,
            current_stock: current,
            projected_stock: projected,
            observed_at: ts(),
        }
    }

    #[test]
    fn test_one_alert_per_alerting_status() {
        let (emitter, repo) = setup();
        let result = emitter.emit(&[
            status(QuotaClassification::Shortage, 85, 85),
            status(QuotaClassification::Normal, 300, 300),
        ]);
        assert_eq!(result.alerts.len(), 1);
        assert_eq!(result.new_alert_count, 1);

        let alert = &result.alerts[0];
        assert_eq!(alert.kind, AlertKind::Shortage);
        assert_eq!(alert.quota, 100);
        assert_eq!(alert.severity, AlertSeverity::Warning);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_replay_is_deduplicated() {
        let (emitter, repo) = setup();
        let statuses = vec![status(QuotaClassification::Excess, 300, 1050)];

        let first = emitter.emit(&statuses);
        let second = emitter.emit(&statuses);
        assert_eq!(first.new_alert_count, 1);
        assert_eq!(second.new_alert_count, 0);
        assert_eq!(first.alerts[0].id, second.alerts[0].id, "重放时告警ID应保持不变");
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_severity_thresholds() {
        let (emitter, _repo) = setup();
        let quota = StockQuota::new("Q001", "DWG-100", "齿轮 A-12", 100, 500, 1000);

        let s = status(QuotaClassification::Shortage, 50, 50);
        assert_eq!(emitter.severity(&quota, &s, AlertKind::Shortage), AlertSeverity::Critical);
        let s = status(QuotaClassification::Shortage, 51, 51);
        assert_eq!(emitter.severity(&quota, &s, AlertKind::Shortage), AlertSeverity::Warning);

        let s = status(QuotaClassification::Excess, 300, 1500);
        assert_eq!(emitter.severity(&quota, &s, AlertKind::Excess), AlertSeverity::Warning);
        let s = status(QuotaClassification::Excess, 300, 1499);
        assert_eq!(emitter.severity(&quota, &s, AlertKind::Excess), AlertSeverity::Info);
    }

    #[test]
    fn test_bilingual_text() {
        let (emitter, _repo) = setup();
        let quota = StockQuota::new("Q001", "DWG-100", "齿轮 A-12", 100, 500, 1000);
        let alert = emitter.build_alert(
            &quota,
            &status(QuotaClassification::Shortage, 85, 85),
            AlertKind::Shortage,
        );
        assert_eq!(alert.title, "低库存预警: 齿轮 A-12");
        assert_eq!(alert.title_en, "Low stock: 齿轮 A-12");
        assert!(alert.message.contains("85"));
        assert!(alert.message_en.contains("DWG-100"));
    }
}
