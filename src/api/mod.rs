// ==========================================
// 库存盘点对账系统 - API 层
// ==========================================
// 职责: 对外业务接口（CLI 及其他前端共用）
// 红线: API 只编排，不实现规则；规则在 engine / importer
// ==========================================

pub mod error;
pub mod stockcheck_api;

// 重导出
pub use error::{ApiError, ApiResult};
pub use stockcheck_api::{ImportSummary, ScanReport, StockCheckApi};
