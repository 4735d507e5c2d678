// ==========================================
// 库存盘点对账系统 - 筛选引擎
// ==========================================
// 职责: 数据集 + 映射 + 筛选选择 → 匹配记录（保持原始顺序）
// 匹配规则:
//   (a) 库存编号非空
//   (b) 成色: TRIM+小写 相等，"All" 为通配
//   (c) 品牌/型号: 非空时精确（区分大小写）相等，空为通配
// 说明: 只接受 ResolvedMapping，未完成的映射无法进入筛选
// ==========================================

use crate::domain::dataset::{field_value, Record};
use crate::domain::mapping::ResolvedMapping;
use crate::domain::selection::FilterSelection;

// ==========================================
// FilterEngine - 筛选引擎
// ==========================================
pub struct FilterEngine;

impl FilterEngine {
    pub fn new() -> Self {
        Self
    }

    /// 单条记录是否命中当前筛选
    pub fn matches(
        &self,
        record: &Record,
        mapping: &ResolvedMapping,
        selection: &FilterSelection,
    ) -> bool {
        if field_value(record, Some(&mapping.stock)).is_empty() {
            return false;
        }

        if !selection
            .condition
            .matches(field_value(record, Some(&mapping.condition)))
        {
            return false;
        }

        if !selection.make.is_empty()
            && field_value(record, mapping.make.as_deref()) != selection.make
        {
            return false;
        }

        if !selection.model.is_empty()
            && field_value(record, Some(&mapping.model)) != selection.model
        {
            return false;
        }

        true
    }

    /// 筛选记录
    ///
    /// # 返回
    /// 命中记录的引用，顺序与原数据集一致
    pub fn filter<'a>(
        &self,
        records: &'a [Record],
        mapping: &ResolvedMapping,
        selection: &FilterSelection,
    ) -> Vec<&'a Record> {
        records
            .iter()
            .filter(|r| self.matches(r, mapping, selection))
            .collect()
    }
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// 便捷函数: 使用默认引擎筛选
pub fn filter_records<'a>(
    records: &'a [Record],
    mapping: &ResolvedMapping,
    selection: &FilterSelection,
) -> Vec<&'a Record> {
    FilterEngine::new().filter(records, mapping, selection)
}
