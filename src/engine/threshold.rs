// ==========================================
// 供应链管理系统 - 定额阈值判定引擎
// ==========================================
// 职责: 快照 + 定额 → 判定结果 (纯函数, 无副作用)
// 规则:
//   1. current_stock < low_quota                 → SHORTAGE
//   2. current_stock + pending_supply_qty > high → EXCESS
//   3. 否则                                      → NORMAL
// 边界: 等于 low / 等于 high 均判 NORMAL (避免告警抖动)
// 口径: 不足只看现有库存 (在途不能缓解眼前缺料)，
//       积压看预计库存 (在途到货后才会压库)
// ==========================================

use crate::domain::quota::StockQuota;
use crate::domain::snapshot::{ReplenishmentGap, StockSnapshot, ThresholdStatus};
use crate::domain::types::QuotaClassification;
use serde_json::json;

// ==========================================
// ThresholdEvaluator - 阈值判定引擎
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdEvaluator {
    // 无状态引擎
}

impl ThresholdEvaluator {
    pub fn new() -> Self {
        Self {}
    }

    /// 判定库存状态
    ///
    /// 相同输入总是得到相同输出
    pub fn evaluate(&self, quota: &StockQuota, snapshot: &StockSnapshot) -> ThresholdStatus {
        let projected_stock = snapshot.projected_stock();

        let classification = if snapshot.current_stock < quota.low_quota {
            QuotaClassification::Shortage
        } else if projected_stock > quota.high_quota {
            QuotaClassification::Excess
        } else {
            QuotaClassification::Normal
        };

        ThresholdStatus {
            part_id: snapshot.part_id.clone(),
            classification,
            current_stock: snapshot.current_stock,
            projected_stock,
            observed_at: snapshot.observed_at,
        }
    }

    /// 计算补库缺口 (仅 SHORTAGE)
    ///
    /// # 参数
    /// - `min_qty`: 建议量下限 (小于 1 时按 1)
    ///
    /// # 返回
    /// - deficit_qty = low_quota - current_stock
    /// - suggested_qty = max(reserve_quota - current_stock, min_qty)
    pub fn replenishment_gap(
        &self,
        quota: &StockQuota,
        status: &ThresholdStatus,
        min_qty: i64,
    ) -> Option<ReplenishmentGap> {
        if status.classification != QuotaClassification::Shortage {
            return None;
        }

        Some(ReplenishmentGap {
            part_id: status.part_id.clone(),
            deficit_qty: quota.low_quota - status.current_stock,
            suggested_qty: quota.suggested_qty(status.current_stock, min_qty),
        })
    }

    /// 生成判定原因 (可解释性)
    ///
    /// # 返回
    /// JSON 格式的原因说明
    pub fn generate_reason(&self, quota: &StockQuota, status: &ThresholdStatus) -> String {
        let reason = match status.classification {
            QuotaClassification::Shortage => "现有库存低于低储",
            QuotaClassification::Excess => "预计库存(含在途)高于高储",
            QuotaClassification::Normal => "库存处于定额区间内",
        };

        json!({
            "part_id": status.part_id,
            "classification": status.classification.to_db_str(),
            "reason": reason,
            "current_stock": status.current_stock,
            "projected_stock": status.projected_stock,
            "low_quota": quota.low_quota,
            "reserve_quota": quota.reserve_quota,
            "high_quota": quota.high_quota,
            "observed_at": status.observed_at.to_string(),
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn quota() -> StockQuota {
        StockQuota::new("Q001", "DWG-100", "齿轮 A-12", 100, 500, 1000)
    }

    fn snapshot(current: i64, pending: i64) -> StockSnapshot {
        StockSnapshot {
            part_id: "Q001".to_string(),
            current_stock: current,
            pending_supply_qty: pending,
            observed_at: ts(),
        }
    }

    #[test]
    fn test_low_boundary() {
        let engine = ThresholdEvaluator::new();
        assert_eq!(
            engine.evaluate(&quota(), &snapshot(100, 0)).classification,
            QuotaClassification::Normal
        );
        assert_eq!(
            engine.evaluate(&quota(), &snapshot(99, 0)).classification,
            QuotaClassification::Shortage
        );
    }

    #[test]
    fn test_high_boundary_uses_projected_stock() {
        let engine = ThresholdEvaluator::new();
        assert_eq!(
            engine.evaluate(&quota(), &snapshot(400, 600)).classification,
            QuotaClassification::Normal
        );
        assert_eq!(
            engine.evaluate(&quota(), &snapshot(400, 601)).classification,
            QuotaClassification::Excess
        );
    }

    #[test]
    fn test_pending_supply_does_not_relieve_shortage() {
        let engine = ThresholdEvaluator::new();
        // 在途很多也仍然是不足 (SHORTAGE 优先判定)
        let status = engine.evaluate(&quota(), &snapshot(50, 5000));
        assert_eq!(status.classification, QuotaClassification::Shortage);
        assert_eq!(status.projected_stock, 5050);
    }

    #[test]
    fn test_gap_only_for_shortage() {
        let engine = ThresholdEvaluator::new();
        let short = engine.evaluate(&quota(), &snapshot(85, 0));
        let gap = engine.replenishment_gap(&quota(), &short, 1).unwrap();
        assert_eq!(gap.deficit_qty, 15);
        assert_eq!(gap.suggested_qty, 415);

        let normal = engine.evaluate(&quota(), &snapshot(300, 0));
        assert!(engine.replenishment_gap(&quota(), &normal, 1).is_none());
    }

    #[test]
    fn test_reason_is_json() {
        let engine = ThresholdEvaluator::new();
        let status = engine.evaluate(&quota(), &snapshot(300, 750));
        let reason: serde_json::Value =
            serde_json::from_str(&engine.generate_reason(&quota(), &status)).unwrap();
        assert_eq!(reason["classification"], "EXCESS");
        assert_eq!(reason["projected_stock"], 1050);
    }
}
