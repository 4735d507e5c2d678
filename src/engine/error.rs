// ==========================================
// 库存盘点对账系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 扫码结果（未找到/不在筛选内/已扫）是返回值，不是错误
// ==========================================

use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 导出错误 =====
    #[error("CSV 导出失败: {0}")]
    ExportError(String),

    // ===== 扫码会话错误 =====
    #[error("扫码会话已停止")]
    SessionStopped,

    #[error("扫码会话任务异常退出: {0}")]
    SessionJoinError(String),

    #[error("扫码设备错误: {0}")]
    ScanSourceError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<csv::Error>
impl From<csv::Error> for EngineError {
    fn from(err: csv::Error) -> Self {
        EngineError::ExportError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(err: tokio::task::JoinError) -> Self {
        EngineError::SessionJoinError(err.to_string())
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
