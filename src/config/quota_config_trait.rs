// ==========================================
// 供应链管理系统 - 定额引擎配置读取 Trait
// ==========================================
// 职责: 定义定额引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;

// ==========================================
// QuotaEngineConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait QuotaEngineConfigReader: Send + Sync {
    /// 评估周期间隔（秒）
    ///
    /// # 默认值
    /// - 300
    async fn get_cycle_interval_secs(&self) -> Result<u64, Box<dyn Error + Send + Sync>>;

    /// 补库建议量下限
    ///
    /// # 默认值
    /// - 1（配置值小于 1 时按 1 处理）
    async fn get_min_suggested_qty(&self) -> Result<i64, Box<dyn Error + Send + Sync>>;

    /// 低储告警升级为 CRITICAL 的比例
    ///
    /// current_stock <= low_quota * ratio → CRITICAL
    ///
    /// # 默认值
    /// - 0.5
    async fn get_shortage_critical_ratio(&self) -> Result<f64, Box<dyn Error + Send + Sync>>;

    /// 高储告警升级为 WARNING 的比例
    ///
    /// projected_stock >= high_quota * ratio → WARNING，否则 INFO
    ///
    /// # 默认值
    /// - 1.5
    async fn get_excess_warning_ratio(&self) -> Result<f64, Box<dyn Error + Send + Sync>>;

    /// 日志/界面默认语言
    ///
    /// # 默认值
    /// - zh-CN
    async fn get_alert_locale(&self) -> Result<String, Box<dyn Error + Send + Sync>>;
}

// ==========================================
// QuotaEngineParams - 单个评估周期使用的参数
// ==========================================
// 周期开始前一次性读取，周期内保持不变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaEngineParams {
    pub min_suggested_qty: i64,
    pub shortage_critical_ratio: f64,
    pub excess_warning_ratio: f64,
}

impl Default for QuotaEngineParams {
    fn default() -> Self {
        Self {
            min_suggested_qty: 1,
            shortage_critical_ratio: 0.5,
            excess_warning_ratio: 1.5,
        }
    }
}

impl QuotaEngineParams {
    /// 从配置读取器加载
    pub async fn load(
        reader: &dyn QuotaEngineConfigReader,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(Self {
            min_suggested_qty: reader.get_min_suggested_qty().await?.max(1),
            shortage_critical_ratio: reader.get_shortage_critical_ratio().await?,
            excess_warning_ratio: reader.get_excess_warning_ratio().await?,
        })
    }
}
