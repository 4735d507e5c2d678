// ==========================================
// 库存盘点对账系统 - 配置读取 Trait
// ==========================================
// 职责: 定义导入/扫码/导出所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// StockCheckConfigReader Trait
// ==========================================
// 用途: API 层在每次操作前读取当前配置
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait StockCheckConfigReader: Send + Sync {
    // ===== 导入配置 =====

    /// 表头定位最多检查的行数
    ///
    /// # 默认值
    /// - 10
    async fn get_header_scan_rows(&self) -> RepositoryResult<usize>;

    /// 表头行至少需要的非空列名数
    ///
    /// # 默认值
    /// - 3
    async fn get_min_header_names(&self) -> RepositoryResult<usize>;

    // ===== 映射配置 =====

    /// 品牌是否为必填映射字段
    ///
    /// # 默认值
    /// - false（stock / condition / model 必填）
    async fn get_require_make(&self) -> RepositoryResult<bool>;

    // ===== 界面配置 =====

    /// 初始成色筛选
    ///
    /// # 默认值
    /// - "New"
    async fn get_default_condition(&self) -> RepositoryResult<String>;

    // ===== 扫码配置 =====

    /// 扫码去抖窗口（毫秒）
    ///
    /// # 默认值
    /// - 700
    async fn get_scan_debounce_ms(&self) -> RepositoryResult<u64>;

    // ===== 导出配置 =====

    /// 导出状态列名
    ///
    /// # 默认值
    /// - "StockCheckStatus"
    async fn get_export_status_column(&self) -> RepositoryResult<String>;
}
