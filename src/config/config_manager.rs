// ==========================================
// 库存盘点对账系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value)，与盘点数据同库
// 缺省: 未配置或格式错误时使用默认值（格式错误记 warn）
// ==========================================

use crate::config::config_reader_trait::StockCheckConfigReader;
use crate::engine::export::DEFAULT_STATUS_COLUMN;
use crate::engine::scan_session::DEFAULT_DEBOUNCE_MS;
use crate::importer::header_detector::{DEFAULT_HEADER_SCAN_ROWS, DEFAULT_MIN_HEADER_NAMES};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 扫码
    pub const SCAN_DEBOUNCE_MS: &str = "scan.debounce_ms";

    // 导入
    pub const HEADER_SCAN_ROWS: &str = "import.header_scan_rows";
    pub const MIN_HEADER_NAMES: &str = "import.min_header_names";

    // 映射
    pub const REQUIRE_MAKE: &str = "mapping.require_make";

    // 界面
    pub const DEFAULT_CONDITION: &str = "ui.default_condition";

    // 导出
    pub const STATUS_COLUMN: &str = "export.status_column";

    pub const ALL: [&str; 6] = [
        SCAN_DEBOUNCE_MS,
        HEADER_SCAN_ROWS,
        MIN_HEADER_NAMES,
        REQUIRE_MAKE,
        DEFAULT_CONDITION,
        STATUS_COLUMN,
    ];
}

/// 配置键默认值
pub fn default_value(key: &str) -> Option<String> {
    let value = match key {
        config_keys::SCAN_DEBOUNCE_MS => DEFAULT_DEBOUNCE_MS.to_string(),
        config_keys::HEADER_SCAN_ROWS => DEFAULT_HEADER_SCAN_ROWS.to_string(),
        config_keys::MIN_HEADER_NAMES => DEFAULT_MIN_HEADER_NAMES.to_string(),
        config_keys::REQUIRE_MAKE => "false".to_string(),
        config_keys::DEFAULT_CONDITION => "New".to_string(),
        config_keys::STATUS_COLUMN => DEFAULT_STATUS_COLUMN.to_string(),
        _ => return None,
    };
    Some(value)
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager（与 SqliteKvStore 共用连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取生效值（未配置时为默认值）
    pub fn get_effective_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        match self.get_config_value(key)? {
            Some(v) => Ok(Some(v)),
            None => Ok(default_value(key)),
        }
    }

    /// 读取并解析配置，缺失或格式错误时使用默认值
    fn get_parsed_or_default<T: FromStr>(&self, key: &str, default: T) -> RepositoryResult<T> {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                warn!(config_key = key, raw_value = %raw, "配置格式错误，使用默认值");
                Ok(default)
            }
        }
    }

    /// 写入配置（只接受已知键，且值必须可解析）
    ///
    /// # 参数
    /// - key: 配置键
    /// - value: 配置值
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        validate_value(key, value)?;

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value.trim()],
        )?;

        info!(config_key = key, value = value.trim(), "配置已更新");
        Ok(())
    }

    /// 获取所有配置的生效值快照（JSON格式）
    ///
    /// # 返回
    /// - Ok(String): {key: value} 的 JSON 字符串，按键排序
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for key in config_keys::ALL {
            if let Some(value) = self.get_effective_value(key)? {
                config_map.insert(key.to_string(), value);
            }
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }
}

/// 校验配置写入
fn validate_value(key: &str, value: &str) -> RepositoryResult<()> {
    let value = value.trim();
    let invalid = |expect: &str| {
        Err(RepositoryError::InternalError(format!(
            "配置值无效 (key={}): {:?}，期望 {}",
            key, value, expect
        )))
    };

    match key {
        config_keys::SCAN_DEBOUNCE_MS => match value.parse::<u64>() {
            Ok(_) => Ok(()),
            Err(_) => invalid("非负整数（毫秒）"),
        },
        config_keys::HEADER_SCAN_ROWS | config_keys::MIN_HEADER_NAMES => {
            match value.parse::<usize>() {
                Ok(n) if n > 0 => Ok(()),
                _ => invalid("正整数"),
            }
        }
        config_keys::REQUIRE_MAKE => match value.parse::<bool>() {
            Ok(_) => Ok(()),
            Err(_) => invalid("true / false"),
        },
        config_keys::DEFAULT_CONDITION | config_keys::STATUS_COLUMN => {
            if value.is_empty() {
                invalid("非空字符串")
            } else {
                Ok(())
            }
        }
        _ => Err(RepositoryError::NotFound {
            entity: "config_key".to_string(),
            id: key.to_string(),
        }),
    }
}

// ==========================================
// StockCheckConfigReader Trait 实现
// ==========================================
#[async_trait]
impl StockCheckConfigReader for ConfigManager {
    async fn get_header_scan_rows(&self) -> RepositoryResult<usize> {
        self.get_parsed_or_default(config_keys::HEADER_SCAN_ROWS, DEFAULT_HEADER_SCAN_ROWS)
    }

    async fn get_min_header_names(&self) -> RepositoryResult<usize> {
        self.get_parsed_or_default(config_keys::MIN_HEADER_NAMES, DEFAULT_MIN_HEADER_NAMES)
    }

    async fn get_require_make(&self) -> RepositoryResult<bool> {
        self.get_parsed_or_default(config_keys::REQUIRE_MAKE, false)
    }

    async fn get_default_condition(&self) -> RepositoryResult<String> {
        let value = self
            .get_config_value(config_keys::DEFAULT_CONDITION)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        Ok(value.unwrap_or_else(|| "New".to_string()))
    }

    async fn get_scan_debounce_ms(&self) -> RepositoryResult<u64> {
        self.get_parsed_or_default(config_keys::SCAN_DEBOUNCE_MS, DEFAULT_DEBOUNCE_MS)
    }

    async fn get_export_status_column(&self) -> RepositoryResult<String> {
        let value = self
            .get_config_value(config_keys::STATUS_COLUMN)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        Ok(value.unwrap_or_else(|| DEFAULT_STATUS_COLUMN.to_string()))
    }
}
