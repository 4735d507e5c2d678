// ==========================================
// 库存盘点对账系统 - 字段映射器实现
// ==========================================
// 职责: 源表头 → 语义字段 自动映射 + 完整性校验
// 说明: 同义词表为数据（按优先级排序），新增别名无需改动匹配逻辑
// ==========================================

use crate::domain::mapping::{FieldMapping, ResolvedMapping};
use crate::domain::types::FieldKey;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::stock_importer_trait::FieldMapper as FieldMapperTrait;
use tracing::warn;

// ==========================================
// 表头同义词表（优先级从高到低）
// ==========================================
pub const HEADER_SYNONYMS: &[(FieldKey, &[&str])] = &[
    (
        FieldKey::Stock,
        &[
            "stocknumber",
            "stock number",
            "stock no",
            "stockno",
            "stock",
            "stock#",
            "stock #",
            "stock_num",
            "stock num",
            "stockid",
            "stock id",
            "item",
            "item number",
            "item no",
        ],
    ),
    (FieldKey::Condition, &["condition", "cond", "state", "status"]),
    (FieldKey::Model, &["model", "rifle model", "product model"]),
    (FieldKey::Make, &["make", "brand", "manufacturer"]),
    (
        FieldKey::Calibre,
        &["calibre", "caliber", "cal", "caliber/ga", "calibre/ga"],
    ),
];

pub struct FieldMapper;

impl FieldMapperTrait for FieldMapper {
    fn auto_map(&self, headers: &[String]) -> FieldMapping {
        let cleaner = DataCleaner;
        let normalized: Vec<String> = headers.iter().map(|h| cleaner.normalize_key(h)).collect();

        let mut mapping = FieldMapping::default();
        for (key, synonyms) in HEADER_SYNONYMS {
            let hit = synonyms
                .iter()
                .find_map(|syn| normalized.iter().position(|h| h == syn));
            if let Some(idx) = hit {
                mapping.set(*key, Some(headers[idx].clone()));
            }
        }
        mapping
    }

    fn missing_fields(&self, mapping: &FieldMapping, required: &[FieldKey]) -> Vec<FieldKey> {
        required
            .iter()
            .copied()
            .filter(|key| mapping.get(*key).is_none())
            .collect()
    }

    fn resolve(
        &self,
        mapping: &FieldMapping,
        headers: &[String],
        required: &[FieldKey],
    ) -> ImportResult<ResolvedMapping> {
        let missing = self.missing_fields(mapping, required);
        if !missing.is_empty() {
            return Err(ImportError::MappingIncomplete { missing });
        }

        let has = |column: &str| headers.iter().any(|h| h == column);

        // 必填字段必须指向存在的列
        for key in required {
            if let Some(column) = mapping.get(*key) {
                if !has(column) {
                    return Err(ImportError::UnknownColumn {
                        field: *key,
                        column: column.to_string(),
                    });
                }
            }
        }

        // 可选字段指向不存在的列时按未绑定处理
        let optional = |key: FieldKey| -> Option<String> {
            let column = mapping.get(key)?;
            if has(column) {
                Some(column.to_string())
            } else {
                warn!(field = %key, column = %column, "可选字段映射的列不存在，按未绑定处理");
                None
            }
        };

        // stock/condition/model 总在必填集合内，这里一定存在
        let column = |key: FieldKey| -> ImportResult<String> {
            mapping
                .get(key)
                .map(str::to_string)
                .ok_or(ImportError::MappingIncomplete { missing: vec![key] })
        };

        Ok(ResolvedMapping {
            stock: column(FieldKey::Stock)?,
            condition: column(FieldKey::Condition)?,
            model: column(FieldKey::Model)?,
            make: optional(FieldKey::Make),
            calibre: optional(FieldKey::Calibre),
        })
    }
}

impl FieldMapper {
    /// 校验用户提交的映射: 必填项齐全，且所有已绑定的列都存在
    pub fn validate_user_mapping(
        &self,
        mapping: &FieldMapping,
        headers: &[String],
        required: &[FieldKey],
    ) -> ImportResult<()> {
        let missing = self.missing_fields(mapping, required);
        if !missing.is_empty() {
            return Err(ImportError::MappingIncomplete { missing });
        }
        for key in FieldKey::ALL {
            if let Some(column) = mapping.get(key) {
                if !headers.iter().any(|h| h == column) {
                    return Err(ImportError::UnknownColumn {
                        field: key,
                        column: column.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mapping::required_fields;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_auto_map_basic() {
        let h = headers(&["Stock Number", " Condition ", "Model", "Brand", "Caliber"]);
        let mapping = FieldMapper.auto_map(&h);

        assert_eq!(mapping.stock.as_deref(), Some("Stock Number"));
        // 保留原始表头文本
        assert_eq!(mapping.condition.as_deref(), Some(" Condition "));
        assert_eq!(mapping.model.as_deref(), Some("Model"));
        assert_eq!(mapping.make.as_deref(), Some("Brand"));
        assert_eq!(mapping.calibre.as_deref(), Some("Caliber"));
    }

    #[test]
    fn test_auto_map_synonym_priority_over_header_order() {
        // "item" 在表头中靠前，但 "stock" 同义词优先级更高
        let h = headers(&["Item", "Stock", "Status", "Condition", "Model"]);
        let mapping = FieldMapper.auto_map(&h);

        assert_eq!(mapping.stock.as_deref(), Some("Stock"));
        assert_eq!(mapping.condition.as_deref(), Some("Condition"));
    }

    #[test]
    fn test_auto_map_exact_match_only() {
        let h = headers(&["Stock Number Ref", "Conditions", "Model Name"]);
        let mapping = FieldMapper.auto_map(&h);
        assert_eq!(mapping, FieldMapping::default());
    }

    #[test]
    fn test_is_complete() {
        let h = headers(&["Stock", "Condition", "Model"]);
        let mapping = FieldMapper.auto_map(&h);
        assert!(FieldMapper.is_complete(&mapping, &required_fields(false)));
        assert_eq!(
            FieldMapper.missing_fields(&mapping, &required_fields(true)),
            vec![FieldKey::Make]
        );
    }

    #[test]
    fn test_resolve_incomplete_mapping() {
        let h = headers(&["Stock", "Model"]);
        let mapping = FieldMapper.auto_map(&h);
        let err = FieldMapper
            .resolve(&mapping, &h, &required_fields(false))
            .unwrap_err();
        assert!(matches!(
            err,
            ImportError::MappingIncomplete { ref missing } if missing == &vec![FieldKey::Condition]
        ));
    }

    #[test]
    fn test_resolve_unknown_required_column() {
        let h = headers(&["Stock", "Condition", "Model"]);
        let mut mapping = FieldMapper.auto_map(&h);
        mapping.set(FieldKey::Model, Some("Gone".to_string()));

        let err = FieldMapper
            .resolve(&mapping, &h, &required_fields(false))
            .unwrap_err();
        assert!(matches!(err, ImportError::UnknownColumn { field: FieldKey::Model, .. }));
    }

    #[test]
    fn test_resolve_drops_missing_optional_column() {
        let h = headers(&["Stock", "Condition", "Model"]);
        let mut mapping = FieldMapper.auto_map(&h);
        mapping.set(FieldKey::Calibre, Some("Cal".to_string()));

        let resolved = FieldMapper
            .resolve(&mapping, &h, &required_fields(false))
            .unwrap();
        assert_eq!(resolved.calibre, None);
        assert_eq!(resolved.stock, "Stock");
    }

    #[test]
    fn test_validate_user_mapping_rejects_unknown_optional() {
        let h = headers(&["Stock", "Condition", "Model"]);
        let mut mapping = FieldMapper.auto_map(&h);
        assert!(FieldMapper
            .validate_user_mapping(&mapping, &h, &required_fields(false))
            .is_ok());

        mapping.set(FieldKey::Make, Some("Brand".to_string()));
        assert!(FieldMapper
            .validate_user_mapping(&mapping, &h, &required_fields(false))
            .is_err());
    }
}
