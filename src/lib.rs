// ==========================================
// 库存盘点对账系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite（本地键值存储）
// 系统定位: 离线扫码盘点（导入清单 → 筛选 → 扫码对账 → 导出）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - 外部数据
pub mod importer;

// 引擎层 - 业务规则
pub mod engine;

// 数据仓储层 - 数据访问
pub mod repository;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 共享状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{FieldKey, ListTab, ScanOutcome, ScanStatus};

// 领域实体
pub use domain::{
    ConditionFilter, Dataset, FieldMapping, FilterSelection, Record, ResolvedMapping, ScanLedger,
    StockCheckState, UiState,
};

// 引擎
pub use engine::{
    Counters, ExportFile, ExportScope, FacetIndex, FilterEngine, ScanSession, StockCheckView,
};

// API
pub use api::{ApiError, ApiResult, ImportSummary, ScanReport, StockCheckApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "stockcheck";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
