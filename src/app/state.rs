// ==========================================
// 库存盘点对账系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 说明: 盘点数据与配置同库，共用一个连接
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::StockCheckApi;
use crate::config::config_manager::ConfigManager;
use crate::config::StockCheckConfigReader;
use crate::db::open_and_init;
use crate::repository::{KvStore, SqliteKvStore};

/// 应用状态
///
/// 包含 API 实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 盘点API
    pub stockcheck_api: Arc<StockCheckApi>,

    /// 配置管理器（config get/set 直接使用）
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接），建表并记录 schema 版本
        let conn = open_and_init(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository / 配置
        // ==========================================
        let kv_store: Arc<dyn KvStore> = Arc::new(SqliteKvStore::from_connection(conn.clone()));
        let config_manager = Arc::new(ConfigManager::from_connection(conn));

        // ==========================================
        // 初始化API层
        // ==========================================
        let config_reader: Arc<dyn StockCheckConfigReader> = config_manager.clone();
        let stockcheck_api = Arc::new(StockCheckApi::new(kv_store, config_reader));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            stockcheck_api,
            config_manager,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 STOCKCHECK_DB_PATH（非空时优先）
/// - 开发环境: 用户数据目录/stockcheck-dev/stockcheck.db
/// - 生产环境: 用户数据目录/stockcheck/stockcheck.db
/// - 取不到用户数据目录时: ./stockcheck.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("STOCKCHECK_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./stockcheck.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染实际盘点数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("stockcheck-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("stockcheck");
        }

        // 确保目录存在
        std::fs::create_dir_all(&path).ok();
        path = path.join("stockcheck.db");
    }

    path.to_string_lossy().to_string()
}
