// ==========================================
// 库存盘点对账系统 - SQLite 键值存储实现
// ==========================================
// 表: app_kv (key, value, updated_at)
// 单值写入即原子写入，不需要显式事务
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::kv_store::KvStore;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use tracing::debug;

// ==========================================
// SqliteKvStore
// ==========================================
pub struct SqliteKvStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteKvStore {
    /// 从已有连接创建（调用方负责建表）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

#[async_trait]
impl KvStore for SqliteKvStore {
    async fn get(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM app_kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        debug!(key = key, hit = value.is_some(), "kv get");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO app_kv (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        debug!(key = key, bytes = value.len(), "kv set");
        Ok(())
    }

    async fn delete(&self, key: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let removed = conn.execute("DELETE FROM app_kv WHERE key = ?1", params![key])?;
        debug!(key = key, removed = removed, "kv delete");
        Ok(())
    }
}
