// ==========================================
// 库存盘点对账系统 - 字段映射领域模型
// ==========================================
// 职责: 语义字段 → 实际列名的绑定
// 说明: FieldMapping 允许缺项（导入时自动推导/用户修正中）；
//       ResolvedMapping 只能由校验通过的 FieldMapping 得到，筛选引擎只接受后者
// ==========================================

use crate::domain::types::FieldKey;
use serde::{Deserialize, Serialize};

// ==========================================
// FieldMapping - 字段映射（可能不完整）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub stock: Option<String>,
    pub condition: Option<String>,
    pub model: Option<String>,
    pub make: Option<String>,
    pub calibre: Option<String>,
}

impl FieldMapping {
    /// 读取某语义字段绑定的列名（空串视为未绑定）
    pub fn get(&self, key: FieldKey) -> Option<&str> {
        let slot = match key {
            FieldKey::Stock => &self.stock,
            FieldKey::Condition => &self.condition,
            FieldKey::Model => &self.model,
            FieldKey::Make => &self.make,
            FieldKey::Calibre => &self.calibre,
        };
        slot.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// 绑定/解绑某语义字段
    pub fn set(&mut self, key: FieldKey, column: Option<String>) {
        let column = column.filter(|c| !c.trim().is_empty());
        match key {
            FieldKey::Stock => self.stock = column,
            FieldKey::Condition => self.condition = column,
            FieldKey::Model => self.model = column,
            FieldKey::Make => self.make = column,
            FieldKey::Calibre => self.calibre = column,
        }
    }
}

/// 必填字段集合
///
/// 基础版本: stock / condition / model；扩展版本额外要求 make。
pub fn required_fields(require_make: bool) -> Vec<FieldKey> {
    let mut keys = vec![FieldKey::Stock, FieldKey::Condition, FieldKey::Model];
    if require_make {
        keys.push(FieldKey::Make);
    }
    keys
}

// ==========================================
// ResolvedMapping - 已校验的完整映射
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMapping {
    pub stock: String,
    pub condition: String,
    pub model: String,
    pub make: Option<String>,
    pub calibre: Option<String>,
}
