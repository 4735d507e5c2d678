// ==========================================
// 库存盘点对账系统 - 数据集领域模型
// ==========================================
// 职责: 一次导入的库存清单快照（不可变）
// 生命周期: 导入成功时整体创建，重新导入时整体替换，清除时删除
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 单行记录: 列名 → 去空白后的字符串值
///
/// 重复列名不去重，同名列以靠后的单元格为准。
pub type Record = HashMap<String, String>;

// ==========================================
// Dataset - 库存清单快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: String,                 // 原文内容指纹（FNV-1a 32 位，小写十六进制）
    pub name: String,               // 来源文件名
    pub loaded_at: DateTime<Utc>,   // 导入时间
    pub headers: Vec<String>,       // 列名（保持导入顺序）
    pub rows: Vec<Record>,          // 数据行（保持导入顺序）
}

impl Dataset {
    /// 列名是否存在于表头中
    pub fn has_header(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    /// 数据行数
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// 读取记录中某列的值（列未绑定或缺失时返回空串）
pub fn field_value<'a>(record: &'a Record, column: Option<&str>) -> &'a str {
    match column {
        Some(col) if !col.is_empty() => record.get(col).map(|v| v.trim()).unwrap_or(""),
        _ => "",
    }
}
