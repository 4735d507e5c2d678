// ==========================================
// 库存盘点对账系统 - 键值存储 Trait
// ==========================================
// 职责: 按键读写/删除一整块不透明文本（JSON）
// 红线: 不理解内容，不提供跨键事务
// ==========================================

use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// KvStore Trait
// ==========================================
// 实现者: SqliteKvStore（使用 rusqlite）
#[async_trait]
pub trait KvStore: Send + Sync {
    /// 读取
    ///
    /// # 返回
    /// - Ok(Some(value)): 已存在
    /// - Ok(None): 不存在
    async fn get(&self, key: &str) -> RepositoryResult<Option<String>>;

    /// 写入（覆盖）
    async fn set(&self, key: &str, value: &str) -> RepositoryResult<()>;

    /// 删除（不存在时无操作）
    async fn delete(&self, key: &str) -> RepositoryResult<()>;
}
