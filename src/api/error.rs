// ==========================================
// 库存盘点对账系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，把各层技术错误转换为用户可读的错误消息
// 说明: 扫码判定（未找到/不在筛选内/已扫）不是错误，见 ScanOutcome
// ==========================================

use crate::domain::types::FieldKey;
use crate::engine::error::EngineError;
use crate::i18n::{t, t_with_args};
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 映射不完整，需要用户补全后才能计算筛选视图
    #[error("{message}")]
    MappingIncomplete {
        missing: Vec<FieldKey>,
        message: String,
    },

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 导入导出错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("文件导出失败: {0}")]
    ExportError(String),

    #[error("扫码会话错误: {0}")]
    ScanSessionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 映射不完整（消息随必填集合变化）
    pub fn mapping_incomplete(missing: Vec<FieldKey>, require_make: bool) -> Self {
        let key = if require_make {
            "mapping.required_with_make"
        } else {
            "mapping.required"
        };
        ApiError::MappingIncomplete {
            missing,
            message: t(key),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::CorruptValue { key, message } => {
                ApiError::DatabaseError(format!("存储内容损坏 (key={}): {}", key, message))
            }
            RepositoryError::SerializationError(msg) => ApiError::InternalError(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::FileReadError(msg) => ApiError::ImportError(msg),
            ImportError::EmptyInput { .. } => ApiError::ImportError(t("import.empty")),
            ImportError::HeaderNotDetected { .. } => {
                ApiError::ImportError(t("import.header_not_detected"))
            }
            ImportError::MappingIncomplete { missing } => {
                let require_make = missing.contains(&FieldKey::Make);
                ApiError::mapping_incomplete(missing, require_make)
            }
            ImportError::UnknownColumn { column, .. } => ApiError::ValidationError(t_with_args(
                "mapping.unknown_column",
                &[("column", column.as_str())],
            )),
            ImportError::InternalError(msg) => ApiError::InternalError(msg),
            ImportError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::ExportError(msg) => ApiError::ExportError(msg),
            EngineError::SessionStopped => {
                ApiError::ScanSessionError("扫码会话已停止".to_string())
            }
            EngineError::SessionJoinError(msg) | EngineError::ScanSourceError(msg) => {
                ApiError::ScanSessionError(msg)
            }
            EngineError::InternalError(msg) => ApiError::InternalError(msg),
            EngineError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "config_key".to_string(),
            id: "x.y".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("config_key"));
                assert!(msg.contains("x.y"));
            }
            _ => panic!("Expected NotFound"),
        }
    }

    #[test]
    fn test_import_error_conversion() {
        let api_err: ApiError = ImportError::MappingIncomplete {
            missing: vec![FieldKey::Stock],
        }
        .into();
        match api_err {
            ApiError::MappingIncomplete { missing, .. } => {
                assert_eq!(missing, vec![FieldKey::Stock]);
            }
            _ => panic!("Expected MappingIncomplete"),
        }

        let api_err: ApiError = ImportError::EmptyInput { rows: 1 }.into();
        assert!(matches!(api_err, ApiError::ImportError(_)));
    }

    #[test]
    fn test_engine_error_conversion() {
        let api_err: ApiError = EngineError::ExportError("boom".to_string()).into();
        assert!(matches!(api_err, ApiError::ExportError(msg) if msg == "boom"));
    }
}
