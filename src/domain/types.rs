// ==========================================
// 供应链管理系统 - 领域类型定义
// ==========================================
// 依据: 储备定额定义表 (低储/储备/高储) 与采购计划表
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 定额判定结果 (Quota Classification)
// ==========================================
// 顺序: Shortage < Normal < Excess (按库存水位)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuotaClassification {
    Shortage, // 不足 (低于低储)
    Normal,   // 正常
    Excess,   // 积压 (预计库存高于高储)
}

impl fmt::Display for QuotaClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl QuotaClassification {
    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            QuotaClassification::Shortage => "SHORTAGE",
            QuotaClassification::Normal => "NORMAL",
            QuotaClassification::Excess => "EXCESS",
        }
    }

    /// 从字符串解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SHORTAGE" => Some(QuotaClassification::Shortage),
            "NORMAL" => Some(QuotaClassification::Normal),
            "EXCESS" => Some(QuotaClassification::Excess),
            _ => None,
        }
    }

    /// 是否需要告警 (Normal 不告警)
    pub fn is_alerting(&self) -> bool {
        !matches!(self, QuotaClassification::Normal)
    }
}

// ==========================================
// 采购计划来源 (Plan Source)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanSource {
    Auto,   // 引擎自动生成
    Manual, // 人工录入
}

impl fmt::Display for PlanSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl PlanSource {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PlanSource::Auto => "AUTO",
            PlanSource::Manual => "MANUAL",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "AUTO" => Some(PlanSource::Auto),
            "MANUAL" => Some(PlanSource::Manual),
            _ => None,
        }
    }
}

// ==========================================
// 采购计划状态 (Plan Entry Status)
// ==========================================
// 生命周期:
//   DRAFT → APPROVED → ORDERED (终态)
//   DRAFT → REJECTED (终态)
// 未结 (open) = DRAFT | APPROVED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanEntryStatus {
    Draft,    // 草稿
    Approved, // 已审批
    Ordered,  // 已下单
    Rejected, // 已驳回
}

impl fmt::Display for PlanEntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl PlanEntryStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PlanEntryStatus::Draft => "DRAFT",
            PlanEntryStatus::Approved => "APPROVED",
            PlanEntryStatus::Ordered => "ORDERED",
            PlanEntryStatus::Rejected => "REJECTED",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "DRAFT" => Some(PlanEntryStatus::Draft),
            "APPROVED" => Some(PlanEntryStatus::Approved),
            "ORDERED" => Some(PlanEntryStatus::Ordered),
            "REJECTED" => Some(PlanEntryStatus::Rejected),
            _ => None,
        }
    }

    /// 是否为未结状态
    pub fn is_open(&self) -> bool {
        matches!(self, PlanEntryStatus::Draft | PlanEntryStatus::Approved)
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        !self.is_open()
    }

    /// 判断状态转换是否合法
    pub fn can_transition_to(&self, to: PlanEntryStatus) -> bool {
        matches!(
            (self, to),
            (PlanEntryStatus::Draft, PlanEntryStatus::Approved)
                | (PlanEntryStatus::Draft, PlanEntryStatus::Rejected)
                | (PlanEntryStatus::Approved, PlanEntryStatus::Ordered)
        )
    }
}

// ==========================================
// 告警类型 (Alert Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    Shortage, // 低储预警
    Excess,   // 高储预警
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl AlertKind {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AlertKind::Shortage => "SHORTAGE",
            AlertKind::Excess => "EXCESS",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SHORTAGE" => Some(AlertKind::Shortage),
            "EXCESS" => Some(AlertKind::Excess),
            _ => None,
        }
    }

    /// 从判定结果映射 (Normal 无告警)
    pub fn from_classification(classification: QuotaClassification) -> Option<Self> {
        match classification {
            QuotaClassification::Shortage => Some(AlertKind::Shortage),
            QuotaClassification::Excess => Some(AlertKind::Excess),
            QuotaClassification::Normal => None,
        }
    }
}

// ==========================================
// 告警级别 (Alert Severity)
// ==========================================
// 顺序: Info < Warning < Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl AlertSeverity {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "INFO",
            AlertSeverity::Warning => "WARNING",
            AlertSeverity::Critical => "CRITICAL",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "INFO" => Some(AlertSeverity::Info),
            "WARNING" => Some(AlertSeverity::Warning),
            "CRITICAL" => Some(AlertSeverity::Critical),
            _ => None,
        }
    }

    /// 通知中心的消息类型 (error / warning / info)
    pub fn notification_type(&self) -> &'static str {
        match self {
            AlertSeverity::Info => "info",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "error",
        }
    }
}
