// ==========================================
// 库存盘点对账系统 - 数据仓储层
// ==========================================
// 职责: 持久化存取，不含业务规则
// 红线: Repository 只做数据读写与序列化
// ==========================================

pub mod error;
pub mod kv_store;
pub mod kv_store_impl;
pub mod stockcheck_repo;

// 重导出
pub use error::{RepositoryError, RepositoryResult};
pub use kv_store::KvStore;
pub use kv_store_impl::SqliteKvStore;
pub use stockcheck_repo::{keys, StockCheckRepository};
