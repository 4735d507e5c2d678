// ==========================================
// 库存盘点对账系统 - 领域类型定义
// ==========================================
// 职责: 语义字段、扫码结果、列表页签等枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 语义字段 (Semantic Field Key)
// ==========================================
// 导入数据的列通过 FieldMapping 绑定到这五个语义字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKey {
    Stock,     // 库存编号（条码内容）
    Condition, // 成色（新/二手）
    Model,     // 型号
    Make,      // 品牌
    Calibre,   // 口径
}

impl FieldKey {
    /// 全部语义字段（固定顺序）
    pub const ALL: [FieldKey; 5] = [
        FieldKey::Stock,
        FieldKey::Condition,
        FieldKey::Model,
        FieldKey::Make,
        FieldKey::Calibre,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Stock => "stock",
            FieldKey::Condition => "condition",
            FieldKey::Model => "model",
            FieldKey::Make => "make",
            FieldKey::Calibre => "calibre",
        }
    }

    /// 从字符串解析字段键（大小写不敏感）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "stock" => Some(FieldKey::Stock),
            "condition" => Some(FieldKey::Condition),
            "model" => Some(FieldKey::Model),
            "make" => Some(FieldKey::Make),
            "calibre" | "caliber" => Some(FieldKey::Calibre),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 扫码结果 (Scan Outcome)
// ==========================================
// 只有 Recorded 会修改台账，其余均为可恢复的提示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanOutcome {
    NotFound,       // 整个数据集中不存在该编号
    OutOfFilter,    // 存在但不在当前筛选集合内
    AlreadyScanned, // 已扫过
    Recorded,       // 新记录
}

impl ScanOutcome {
    /// 是否修改了台账
    pub fn is_recorded(&self) -> bool {
        matches!(self, ScanOutcome::Recorded)
    }

    /// 对应的国际化消息键
    pub fn message_key(&self) -> &'static str {
        match self {
            ScanOutcome::NotFound => "scan.not_found",
            ScanOutcome::OutOfFilter => "scan.out_of_filter",
            ScanOutcome::AlreadyScanned => "scan.already_scanned",
            ScanOutcome::Recorded => "scan.recorded",
        }
    }
}

impl fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanOutcome::NotFound => write!(f, "NOT_FOUND"),
            ScanOutcome::OutOfFilter => write!(f, "OUT_OF_FILTER"),
            ScanOutcome::AlreadyScanned => write!(f, "ALREADY_SCANNED"),
            ScanOutcome::Recorded => write!(f, "RECORDED"),
        }
    }
}

// ==========================================
// 盘点状态 (Scan Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanStatus {
    Scanned,
    Missing,
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanStatus::Scanned => write!(f, "SCANNED"),
            ScanStatus::Missing => write!(f, "MISSING"),
        }
    }
}

// ==========================================
// 列表页签 (List Tab)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListTab {
    #[default]
    Missing,
    Scanned,
    All,
}

impl ListTab {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "missing" => Some(ListTab::Missing),
            "scanned" => Some(ListTab::Scanned),
            "all" => Some(ListTab::All),
            _ => None,
        }
    }
}

impl fmt::Display for ListTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListTab::Missing => write!(f, "missing"),
            ListTab::Scanned => write!(f, "scanned"),
            ListTab::All => write!(f, "all"),
        }
    }
}
