// ==========================================
// 供应链管理系统 - 库存快照与判定结果
// ==========================================
// StockSnapshot: 入库后不可变, 仅被同部件更新的快照替换
// ThresholdStatus: 派生值, 每个周期重新计算, 不做权威存储
// ==========================================

use crate::domain::types::QuotaClassification;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// SupplyLine - 在途供货行
// ==========================================
// 对应计划跟踪表的 供货量 / 到货量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyLine {
    pub ordered_qty: i64, // 供货量 (已承诺)
    pub arrived_qty: i64, // 到货量
}

impl SupplyLine {
    /// 未到货数量 (不为负)
    pub fn outstanding_qty(&self) -> i64 {
        self.ordered_qty.saturating_sub(self.arrived_qty).max(0)
    }
}

// ==========================================
// StockReading - 外部库存读数 (未归一化)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockReading {
    pub part_id: String,
    pub current_stock: i64,
    /// 显式给出的在途量
    pub pending_supply_qty: Option<i64>,
    /// 逐行在途明细, 与显式在途量累加
    #[serde(default)]
    pub supply_lines: Vec<SupplyLine>,
    pub observed_at: NaiveDateTime,
}

impl StockReading {
    pub fn new(
        part_id: impl Into<String>,
        current_stock: i64,
        pending_supply_qty: i64,
        observed_at: NaiveDateTime,
    ) -> Self {
        Self {
            part_id: part_id.into(),
            current_stock,
            pending_supply_qty: Some(pending_supply_qty),
            supply_lines: Vec::new(),
            observed_at,
        }
    }

    /// 归一化后的在途量
    ///
    /// # 返回
    /// - None: 累加超出 i64 范围
    pub fn normalized_pending_qty(&self) -> Option<i64> {
        self.supply_lines
            .iter()
            .map(SupplyLine::outstanding_qty)
            .try_fold(self.pending_supply_qty.unwrap_or(0), i64::checked_add)
    }
}

// ==========================================
// StockSnapshot - 库存快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub part_id: String,
    pub current_stock: i64,      // 现有库存 (>=0)
    pub pending_supply_qty: i64, // 在途量 (>=0)
    pub observed_at: NaiveDateTime,
}

impl StockSnapshot {
    /// 预计库存 = 现有 + 在途 (饱和加法, 接入时已拒绝溢出)
    pub fn projected_stock(&self) -> i64 {
        self.current_stock.saturating_add(self.pending_supply_qty)
    }
}

// ==========================================
// ThresholdStatus - 定额判定结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdStatus {
    pub part_id: String,
    pub classification: QuotaClassification,
    pub current_stock: i64,
    pub projected_stock: i64,
    pub observed_at: NaiveDateTime,
}

// ==========================================
// ReplenishmentGap - 补库缺口
// ==========================================
// 仅针对 Shortage 生成
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplenishmentGap {
    pub part_id: String,
    pub deficit_qty: i64,   // 低于低储的差额
    pub suggested_qty: i64, // 补至储备的建议量 (>=1)
}

// ==========================================
// QuotaDashboardSummary - 驾驶舱汇总
// ==========================================
// 低库存预警 / 高库存预警 / 总SKU
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaDashboardSummary {
    pub total_skus: usize,
    pub shortage_count: usize,
    pub normal_count: usize,
    pub excess_count: usize,
}

impl QuotaDashboardSummary {
    pub fn from_statuses(statuses: &[ThresholdStatus]) -> Self {
        let mut summary = Self {
            total_skus: statuses.len(),
            ..Self::default()
        };
        for status in statuses {
            match status.classification {
                QuotaClassification::Shortage => summary.shortage_count += 1,
                QuotaClassification::Normal => summary.normal_count += 1,
                QuotaClassification::Excess => summary.excess_count += 1,
            }
        }
        summary
    }
}
