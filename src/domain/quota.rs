// ==========================================
// 供应链管理系统 - 储备定额领域模型
// ==========================================
// 对齐: stock_quota 表
// 红线: 0 <= low_quota <= reserve_quota <= high_quota
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// StockQuota - 储备定额
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockQuota {
    // ===== 主键 =====
    pub part_id: String, // 部件ID

    // ===== 部件信息 =====
    pub drawing_no: String, // 图号
    pub part_name: String,  // 部件名称

    // ===== 定额 =====
    pub low_quota: i64,     // 低储 (安全下限)
    pub reserve_quota: i64, // 储备 (目标库存)
    pub high_quota: i64,    // 高储 (上限)

    pub updated_at: Option<NaiveDateTime>,
}

impl StockQuota {
    /// 创建新的储备定额
    pub fn new(
        part_id: impl Into<String>,
        drawing_no: impl Into<String>,
        part_name: impl Into<String>,
        low_quota: i64,
        reserve_quota: i64,
        high_quota: i64,
    ) -> Self {
        Self {
            part_id: part_id.into(),
            drawing_no: drawing_no.into(),
            part_name: part_name.into(),
            low_quota,
            reserve_quota,
            high_quota,
            updated_at: None,
        }
    }

    /// 定额区间是否合法
    pub fn has_valid_range(&self) -> bool {
        self.low_quota >= 0
            && self.low_quota <= self.reserve_quota
            && self.reserve_quota <= self.high_quota
    }

    /// 补库建议量 (补至储备, 至少 min_qty)
    pub fn suggested_qty(&self, current_stock: i64, min_qty: i64) -> i64 {
        (self.reserve_quota - current_stock).max(min_qty.max(1))
    }
}
