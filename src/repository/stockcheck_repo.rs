// ==========================================
// 库存盘点对账系统 - 盘点状态仓储
// ==========================================
// 职责: 四个顶层实体（数据集/台账/映射/界面状态）各自作为一整块 JSON 读写
// 键名: 记录形状不兼容变更时换新键（_v2 ...），不做迁移
// 红线: 只做序列化与存取，不含业务规则
// ==========================================

use crate::domain::dataset::Dataset;
use crate::domain::ledger::ScanLedger;
use crate::domain::mapping::FieldMapping;
use crate::domain::selection::UiState;
use crate::domain::state::StockCheckState;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::kv_store::KvStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// 存储键
pub mod keys {
    pub const DATASET: &str = "dataset_v1";
    pub const SCANNED: &str = "scanned_v1";
    pub const MAPPING: &str = "mapping_v1";
    pub const UI: &str = "ui_v1";

    pub const ALL: [&str; 4] = [DATASET, SCANNED, MAPPING, UI];
}

// ==========================================
// StockCheckRepository
// ==========================================
pub struct StockCheckRepository {
    store: Arc<dyn KvStore>,
}

impl StockCheckRepository {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> RepositoryResult<Option<T>> {
        match self.store.get(key).await? {
            Some(text) => serde_json::from_str(&text).map(Some).map_err(|e| {
                RepositoryError::CorruptValue {
                    key: key.to_string(),
                    message: e.to_string(),
                }
            }),
            None => Ok(None),
        }
    }

    async fn write<T: Serialize + Sync>(&self, key: &str, value: &T) -> RepositoryResult<()> {
        let text = serde_json::to_string(value)?;
        self.store.set(key, &text).await
    }

    // ===== 数据集 =====

    pub async fn load_dataset(&self) -> RepositoryResult<Option<Dataset>> {
        self.read(keys::DATASET).await
    }

    pub async fn save_dataset(&self, dataset: &Dataset) -> RepositoryResult<()> {
        self.write(keys::DATASET, dataset).await
    }

    // ===== 扫码台账 =====

    /// 读取台账（不存在时为空台账）
    pub async fn load_ledger(&self) -> RepositoryResult<ScanLedger> {
        Ok(self.read(keys::SCANNED).await?.unwrap_or_default())
    }

    pub async fn save_ledger(&self, ledger: &ScanLedger) -> RepositoryResult<()> {
        self.write(keys::SCANNED, ledger).await
    }

    // ===== 字段映射 =====

    pub async fn load_mapping(&self) -> RepositoryResult<FieldMapping> {
        Ok(self.read(keys::MAPPING).await?.unwrap_or_default())
    }

    pub async fn save_mapping(&self, mapping: &FieldMapping) -> RepositoryResult<()> {
        self.write(keys::MAPPING, mapping).await
    }

    // ===== 界面状态 =====

    pub async fn load_ui(&self) -> RepositoryResult<Option<UiState>> {
        self.read(keys::UI).await
    }

    pub async fn save_ui(&self, ui: &UiState) -> RepositoryResult<()> {
        self.write(keys::UI, ui).await
    }

    // ===== 快照 =====

    /// 读取四个实体组成一份快照
    ///
    /// # 参数
    /// - default_ui: 未保存过界面状态时使用的默认值
    #[instrument(skip(self, default_ui))]
    pub async fn load_snapshot(&self, default_ui: UiState) -> RepositoryResult<StockCheckState> {
        let dataset = self.load_dataset().await?;
        let mapping = self.load_mapping().await?;
        let ledger = self.load_ledger().await?;
        let ui = self.load_ui().await?.unwrap_or(default_ui);

        debug!(
            has_dataset = dataset.is_some(),
            scanned = ledger.scanned_total(),
            "快照已读取"
        );

        Ok(StockCheckState {
            dataset,
            mapping,
            ledger,
            ui,
        })
    }

    /// 删除全部四个实体
    pub async fn clear_all(&self) -> RepositoryResult<()> {
        for key in keys::ALL {
            self.store.delete(key).await?;
        }
        Ok(())
    }
}
