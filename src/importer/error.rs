// ==========================================
// 库存盘点对账系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 导入失败只上报，不修改任何已持久化状态
// ==========================================

use crate::domain::types::FieldKey;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("CSV 内容为空或无效: 有效行数 {rows}（至少需要 2 行）")]
    EmptyInput { rows: usize },

    // ===== 表头识别错误 =====
    #[error("无法识别表头行: 第 {row} 行仅有 {found} 个有效列名（至少需要 {required} 个）")]
    HeaderNotDetected {
        row: usize,
        found: usize,
        required: usize,
    },

    // ===== 字段映射错误 =====
    #[error("字段映射不完整: 缺少 {}", format_keys(.missing))]
    MappingIncomplete { missing: Vec<FieldKey> },

    #[error("字段映射引用了不存在的列 (字段 {field}): {column}")]
    UnknownColumn { field: FieldKey, column: String },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn format_keys(keys: &[FieldKey]) -> String {
    keys.iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
