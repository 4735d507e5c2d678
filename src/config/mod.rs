// ==========================================
// 库存盘点对账系统 - 配置层
// ==========================================
// 职责: 系统配置读写（带默认值）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod config_reader_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, default_value, ConfigManager};
pub use config_reader_trait::StockCheckConfigReader;
