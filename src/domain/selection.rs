// ==========================================
// 库存盘点对账系统 - 筛选选择与界面状态
// ==========================================
// 职责: 当前分面选择（成色/品牌/型号）+ 列表页签
// 规则: 上游分面变化时清空下游选择，避免引用已不可选的值
// ==========================================

use crate::domain::types::ListTab;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 成色通配值
pub const CONDITION_ALL: &str = "All";

// ==========================================
// ConditionFilter - 成色筛选
// ==========================================
// 序列化为字符串: "All" 或数据中的原始成色值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionFilter {
    All,
    Value(String),
}

impl ConditionFilter {
    pub fn is_all(&self) -> bool {
        matches!(self, ConditionFilter::All)
    }

    /// 成色匹配: 去空白+小写后相等；All 为通配
    pub fn matches(&self, condition: &str) -> bool {
        match self {
            ConditionFilter::All => true,
            ConditionFilter::Value(target) => normalize(condition) == normalize(target),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ConditionFilter::All => CONDITION_ALL,
            ConditionFilter::Value(v) => v.as_str(),
        }
    }
}

impl From<String> for ConditionFilter {
    fn from(value: String) -> Self {
        if value.trim() == CONDITION_ALL {
            ConditionFilter::All
        } else {
            ConditionFilter::Value(value)
        }
    }
}

impl From<&str> for ConditionFilter {
    fn from(value: &str) -> Self {
        ConditionFilter::from(value.to_string())
    }
}

impl From<ConditionFilter> for String {
    fn from(value: ConditionFilter) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ConditionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 规范化比较键（去空白 + 小写）
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

// ==========================================
// FilterSelection - 分面选择
// ==========================================
// make/model 为空串时表示通配
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub condition: ConditionFilter,
    #[serde(default)]
    pub make: String,
    #[serde(default)]
    pub model: String,
}

impl FilterSelection {
    pub fn new(condition: impl Into<ConditionFilter>) -> Self {
        Self {
            condition: condition.into(),
            make: String::new(),
            model: String::new(),
        }
    }

    /// 切换成色，同时清空品牌与型号
    pub fn set_condition(&mut self, condition: impl Into<ConditionFilter>) {
        self.condition = condition.into();
        self.make.clear();
        self.model.clear();
    }

    /// 切换品牌，同时清空型号
    pub fn set_make(&mut self, make: &str) {
        self.make = make.trim().to_string();
        self.model.clear();
    }

    pub fn set_model(&mut self, model: &str) {
        self.model = model.trim().to_string();
    }
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self::new("New")
    }
}

// ==========================================
// UiState - 界面状态（持久化为一个整体）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UiState {
    #[serde(flatten)]
    pub selection: FilterSelection,
    #[serde(default)]
    pub tab: ListTab,
}

impl UiState {
    /// 以指定默认成色创建初始界面状态
    pub fn with_default_condition(condition: &str) -> Self {
        Self {
            selection: FilterSelection::new(condition),
            tab: ListTab::default(),
        }
    }
}
