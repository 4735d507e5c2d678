// ==========================================
// 库存盘点对账系统 - 分面索引
// ==========================================
// 职责: 计算某列的去重取值（受成色及上游分面约束），供选择器展示
// 后置条件: 当前选中值不在新索引中时，必须清空该选择（级联）
// ==========================================

use crate::domain::dataset::{field_value, Record};
use crate::domain::mapping::ResolvedMapping;
use crate::domain::selection::{ConditionFilter, FilterSelection, CONDITION_ALL};
use crate::importer::data_cleaner::DataCleaner;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

/// 展示排序: 先按不区分大小写比较，再让小写排在大写之前
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// 某列的去重非空取值（升序）
///
/// # 参数
/// - records: 记录集合
/// - value_field: 取值列
/// - condition_field: 成色列
/// - condition_filter: 成色筛选（All 为通配，否则 TRIM+小写 相等）
/// - predicate: 在成色判断之前应用的附加条件（如已选品牌）
pub fn unique_values(
    records: &[Record],
    value_field: &str,
    condition_field: &str,
    condition_filter: &ConditionFilter,
    predicate: Option<&dyn Fn(&Record) -> bool>,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut values: Vec<String> = records
        .iter()
        .filter(|r| predicate.map_or(true, |p| p(r)))
        .filter(|r| condition_filter.matches(field_value(r, Some(condition_field))))
        .map(|r| field_value(r, Some(value_field)))
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(v.to_string()))
        .map(str::to_string)
        .collect();

    values.sort_by(|a, b| locale_compare(a, b));
    values
}

/// 成色选项: "All" + 数据中出现的成色（规范化后不区分大小写去重）
pub fn condition_options(records: &[Record], condition_field: &str) -> Vec<String> {
    let cleaner = DataCleaner;
    let mut seen = HashSet::new();
    let mut values: Vec<String> = records
        .iter()
        .map(|r| cleaner.canonical_condition(field_value(r, Some(condition_field))))
        .filter(|v| !v.is_empty() && v != CONDITION_ALL)
        .filter(|v| seen.insert(cleaner.normalize_key(v)))
        .collect();

    values.sort_by(|a, b| locale_compare(a, b));
    values.insert(0, CONDITION_ALL.to_string());
    values
}

// ==========================================
// FacetIndex - 选择器可选值
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetIndex {
    pub conditions: Vec<String>,
    pub makes: Vec<String>, // 品牌列未映射时为空
    pub models: Vec<String>,
}

/// 计算分面索引并修正失效的选择
///
/// # 返回
/// - FacetIndex: 当前选择下的可选值
/// - FilterSelection: 修正后的选择（失效的品牌/型号被重置为通配）
pub fn cascade(
    records: &[Record],
    mapping: &ResolvedMapping,
    selection: &FilterSelection,
) -> (FacetIndex, FilterSelection) {
    let mut next = selection.clone();

    let conditions = condition_options(records, &mapping.condition);

    let makes = match mapping.make.as_deref() {
        Some(make_col) => {
            unique_values(records, make_col, &mapping.condition, &next.condition, None)
        }
        None => Vec::new(),
    };
    if !next.make.is_empty() && !makes.contains(&next.make) {
        debug!(make = %next.make, "品牌选择已失效，重置为全部");
        next.make.clear();
        next.model.clear();
    }

    let make_col = mapping.make.clone();
    let selected_make = next.make.clone();
    let make_filter = move |r: &Record| -> bool {
        selected_make.is_empty() || field_value(r, make_col.as_deref()) == selected_make
    };
    let models = unique_values(
        records,
        &mapping.model,
        &mapping.condition,
        &next.condition,
        Some(&make_filter),
    );
    if !next.model.is_empty() && !models.contains(&next.model) {
        debug!(model = %next.model, "型号选择已失效，重置为全部");
        next.model.clear();
    }

    (
        FacetIndex {
            conditions,
            makes,
            models,
        },
        next,
    )
}
