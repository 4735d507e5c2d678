// ==========================================
// 库存盘点对账系统 - 盘点 API
// ==========================================
// 职责: 导入、字段映射、筛选、扫码、导出、重置/清除
// 流程: 读取快照 → 纯函数状态转换 → 只回写变化的实体 → 重新计算视图
// 并发: 所有操作串行执行（单一逻辑线程），扫码会话同样经过此处
// ==========================================

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::StockCheckConfigReader;
use crate::domain::mapping::{required_fields, FieldMapping, ResolvedMapping};
use crate::domain::selection::UiState;
use crate::domain::state::StockCheckState;
use crate::domain::types::{FieldKey, ListTab, ScanOutcome};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::export::{self, ExportFile, ExportScope};
use crate::engine::facet::cascade;
use crate::engine::reconcile::apply_scan;
use crate::engine::scan_session::ScanSink;
use crate::engine::view::{build_view, DatasetSummary, StockCheckView};
use crate::i18n::{t, t_with_args};
use crate::importer::error::ImportError;
use crate::importer::field_mapper::FieldMapper as FieldMapperImpl;
use crate::importer::file_parser::CsvParser;
use crate::importer::header_detector::HeaderDetector;
use crate::importer::stock_importer_impl::StockImporterImpl;
use crate::importer::stock_importer_trait::{FieldMapper, StockImporter};
use crate::repository::kv_store::KvStore;
use crate::repository::stockcheck_repo::StockCheckRepository;

// ==========================================
// 响应结构
// ==========================================

/// 导入结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub dataset: DatasetSummary,
    pub mapping: FieldMapping,
    pub missing_fields: Vec<FieldKey>, // 非空时需要用户补全映射
    pub delimiter: char,
    pub header_row: usize,
    pub message: String,
}

impl ImportSummary {
    pub fn mapping_complete(&self) -> bool {
        self.missing_fields.is_empty()
    }
}

/// 扫码结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub code: String,
    pub outcome: ScanOutcome,
    pub message: String,
    pub view: StockCheckView,
}

// ==========================================
// StockCheckApi - 盘点 API
// ==========================================

/// 盘点 API
///
/// 职责：
/// 1. 导入清单并自动映射（导入成功即清空台账、重置界面状态）
/// 2. 字段映射校验与保存
/// 3. 筛选/页签切换（分面级联）
/// 4. 扫码记录（幂等）
/// 5. 导出、重置、清除
pub struct StockCheckApi {
    repo: StockCheckRepository,
    config: Arc<dyn StockCheckConfigReader>,
    op_lock: Mutex<()>,
}

impl StockCheckApi {
    /// 创建新的StockCheckApi实例
    ///
    /// # 参数
    /// - store: 键值存储
    /// - config: 配置读取器
    pub fn new(store: Arc<dyn KvStore>, config: Arc<dyn StockCheckConfigReader>) -> Self {
        Self {
            repo: StockCheckRepository::new(store),
            config,
            op_lock: Mutex::new(()),
        }
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    async fn default_ui(&self) -> ApiResult<UiState> {
        let condition = self.config.get_default_condition().await?;
        Ok(UiState::with_default_condition(&condition))
    }

    async fn load_state(&self) -> ApiResult<StockCheckState> {
        let default_ui = self.default_ui().await?;
        Ok(self.repo.load_snapshot(default_ui).await?)
    }

    async fn required(&self) -> ApiResult<(Vec<FieldKey>, bool)> {
        let require_make = self.config.get_require_make().await?;
        Ok((required_fields(require_make), require_make))
    }

    /// 映射校验（不完整时返回 None，由视图提示补全）
    fn resolve(state: &StockCheckState, required: &[FieldKey]) -> Option<ResolvedMapping> {
        let dataset = state.dataset.as_ref()?;
        match FieldMapperImpl.resolve(&state.mapping, &dataset.headers, required) {
            Ok(resolved) => Some(resolved),
            Err(e) => {
                debug!(error = %e, "映射不可用");
                None
            }
        }
    }

    /// 要求数据集存在且映射完整
    async fn require_resolved(&self, state: &StockCheckState) -> ApiResult<ResolvedMapping> {
        let dataset = state
            .dataset
            .as_ref()
            .ok_or_else(|| ApiError::NotFound(t("common.no_dataset")))?;
        let (required, require_make) = self.required().await?;

        FieldMapperImpl
            .resolve(&state.mapping, &dataset.headers, &required)
            .map_err(|e| match e {
                ImportError::MappingIncomplete { missing } => {
                    ApiError::mapping_incomplete(missing, require_make)
                }
                other => ApiError::from(other),
            })
    }

    /// 计算视图；级联修正了选择时回写界面状态
    async fn render(&self, state: &StockCheckState, query: &str) -> ApiResult<StockCheckView> {
        let (required, _) = self.required().await?;
        let resolved = Self::resolve(state, &required);
        let outcome = build_view(state, resolved.as_ref(), query);

        if outcome.ui_changed {
            info!(
                make = %outcome.ui.selection.make,
                model = %outcome.ui.selection.model,
                "失效的筛选已重置"
            );
            self.repo.save_ui(&outcome.ui).await?;
        }
        Ok(outcome.view)
    }

    // ==========================================
    // 导入
    // ==========================================

    /// 导入清单文本
    ///
    /// # 参数
    /// - name: 文件名（展示用）
    /// - text: 原始文本
    ///
    /// # 返回
    /// - Ok(ImportSummary): 导入成功（映射可能不完整）
    /// - Err(ApiError::ImportError): 内容为空/无法识别表头（不修改任何状态）
    #[instrument(skip(self, text), fields(name = %name))]
    pub async fn import_csv(&self, name: &str, text: &str) -> ApiResult<ImportSummary> {
        let _guard = self.op_lock.lock().await;

        let detector = HeaderDetector::new(
            self.config.get_header_scan_rows().await?,
            self.config.get_min_header_names().await?,
        );
        let (_, require_make) = self.required().await?;
        let importer = StockImporterImpl::with_defaults(detector, require_make);

        // 数据集完整构建后才写存储
        let imported = importer.import_text(name, text, Utc::now())?;

        let default_ui = self.default_ui().await?;
        let state = StockCheckState::default().with_import(
            imported.dataset,
            imported.mapping,
            default_ui,
        );

        let dataset = state
            .dataset
            .as_ref()
            .ok_or_else(|| ApiError::InternalError("导入后数据集缺失".to_string()))?;
        self.repo.save_dataset(dataset).await?;
        self.repo.save_mapping(&state.mapping).await?;
        self.repo.save_ledger(&state.ledger).await?;
        self.repo.save_ui(&state.ui).await?;

        let summary = DatasetSummary::from(dataset);
        let message = if imported.missing_fields.is_empty() {
            t_with_args(
                "import.loaded",
                &[
                    ("rows", summary.rows.to_string().as_str()),
                    ("name", summary.name.as_str()),
                ],
            )
        } else {
            let fields = imported
                .missing_fields
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            warn!(missing = %fields, "自动映射不完整，需要用户补全");
            t_with_args("import.mapping_needed", &[("fields", fields.as_str())])
        };

        info!(
            dataset_id = %summary.id,
            rows = summary.rows,
            mapping_complete = imported.missing_fields.is_empty(),
            "清单导入完成"
        );

        Ok(ImportSummary {
            dataset: summary,
            mapping: state.mapping,
            missing_fields: imported.missing_fields,
            delimiter: imported.delimiter,
            header_row: imported.header_row,
            message,
        })
    }

    /// 从文件导入
    pub async fn import_file(&self, path: &Path) -> ApiResult<ImportSummary> {
        let text = CsvParser::read_text(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        self.import_csv(&name, &text).await
    }

    // ==========================================
    // 字段映射
    // ==========================================

    /// 当前映射与数据集表头
    pub async fn get_mapping(&self) -> ApiResult<(FieldMapping, Vec<String>)> {
        let state = self.load_state().await?;
        let headers = state
            .dataset
            .map(|d| d.headers)
            .ok_or_else(|| ApiError::NotFound(t("common.no_dataset")))?;
        Ok((state.mapping, headers))
    }

    /// 保存用户修正的映射
    ///
    /// 必填项缺失或引用不存在的列时拒绝，不修改存储
    #[instrument(skip(self, mapping))]
    pub async fn save_mapping(&self, mapping: FieldMapping) -> ApiResult<StockCheckView> {
        let _guard = self.op_lock.lock().await;
        let state = self.load_state().await?;
        let dataset = state
            .dataset
            .as_ref()
            .ok_or_else(|| ApiError::NotFound(t("common.no_dataset")))?;

        let (required, require_make) = self.required().await?;
        FieldMapperImpl
            .validate_user_mapping(&mapping, &dataset.headers, &required)
            .map_err(|e| match e {
                ImportError::MappingIncomplete { missing } => {
                    ApiError::mapping_incomplete(missing, require_make)
                }
                other => ApiError::from(other),
            })?;

        let next = state.with_mapping(mapping);
        self.repo.save_mapping(&next.mapping).await?;
        info!("字段映射已保存");

        self.render(&next, "").await
    }

    // ==========================================
    // 筛选与页签
    // ==========================================

    /// 切换成色（品牌与型号随之清空）
    pub async fn set_condition(&self, condition: &str) -> ApiResult<StockCheckView> {
        self.update_ui(|s| s.with_condition(condition)).await
    }

    /// 切换品牌（型号随之清空；空串为全部）
    pub async fn set_make(&self, make: &str) -> ApiResult<StockCheckView> {
        self.update_ui(|s| s.with_make(make)).await
    }

    /// 切换型号（空串为全部）
    pub async fn set_model(&self, model: &str) -> ApiResult<StockCheckView> {
        self.update_ui(|s| s.with_model(model)).await
    }

    pub async fn set_tab(&self, tab: ListTab) -> ApiResult<StockCheckView> {
        self.update_ui(|s| s.with_tab(tab)).await
    }

    async fn update_ui<F>(&self, transition: F) -> ApiResult<StockCheckView>
    where
        F: FnOnce(&StockCheckState) -> StockCheckState + Send,
    {
        let _guard = self.op_lock.lock().await;
        let state = self.load_state().await?;
        let next = transition(&state);
        if next.ui != state.ui {
            self.repo.save_ui(&next.ui).await?;
            debug!(ui = ?next.ui, "界面状态已更新");
        }
        self.render(&next, "").await
    }

    /// 计算当前视图
    ///
    /// # 参数
    /// - query: 搜索词（库存编号或 品牌/型号/口径 子串，不区分大小写）
    pub async fn view(&self, query: &str) -> ApiResult<StockCheckView> {
        let _guard = self.op_lock.lock().await;
        let state = self.load_state().await?;
        self.render(&state, query).await
    }

    // ==========================================
    // 扫码
    // ==========================================

    /// 记录一次扫码/手工输入
    ///
    /// # 返回
    /// - Ok(ScanReport): 判定结果（未找到/不在筛选内/已扫 均为正常返回）
    /// - Err(ApiError::InvalidInput): 编号为空
    /// - Err(ApiError::MappingIncomplete): 映射未完成，不能扫码
    #[instrument(skip(self))]
    pub async fn record_scan(&self, code: &str) -> ApiResult<ScanReport> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ApiError::InvalidInput(t("scan.blank")));
        }

        let _guard = self.op_lock.lock().await;
        let state = self.load_state().await?;
        let resolved = self.require_resolved(&state).await?;

        // 级联修正后的选择才是界面上实际生效的筛选
        let state = match state.dataset.as_ref() {
            Some(ds) => {
                let (_, selection) = cascade(&ds.rows, &resolved, &state.ui.selection);
                let mut ui = state.ui.clone();
                ui.selection = selection;
                state.with_ui(ui)
            }
            None => state,
        };

        let (next, outcome) = apply_scan(&state, code, &resolved);
        if outcome.is_recorded() {
            self.repo.save_ledger(&next.ledger).await?;
        }

        let message = t_with_args(outcome.message_key(), &[("code", code)]);
        info!(code = %code, outcome = %outcome, "扫码处理完成");

        let view = self.render(&next, "").await?;
        Ok(ScanReport {
            code: code.to_string(),
            outcome,
            message,
            view,
        })
    }

    /// 扫码会话去抖窗口（毫秒）
    pub async fn scan_debounce_ms(&self) -> ApiResult<u64> {
        Ok(self.config.get_scan_debounce_ms().await?)
    }

    // ==========================================
    // 导出
    // ==========================================

    /// 导出
    ///
    /// # 参数
    /// - scope: Filtered（当前筛选，SCANNED/MISSING）或 All（全部，SCANNED/空）
    #[instrument(skip(self))]
    pub async fn export(&self, scope: ExportScope) -> ApiResult<ExportFile> {
        let _guard = self.op_lock.lock().await;
        let state = self.load_state().await?;
        let resolved = self.require_resolved(&state).await?;
        let dataset = state
            .dataset
            .as_ref()
            .ok_or_else(|| ApiError::NotFound(t("common.no_dataset")))?;
        let status_column = self.config.get_export_status_column().await?;

        let file = match scope {
            ExportScope::Filtered => {
                let (_, selection) = cascade(&dataset.rows, &resolved, &state.ui.selection);
                export::export_filtered(dataset, &resolved, &selection, &state.ledger, &status_column)?
            }
            ExportScope::All => {
                export::export_all(dataset, &resolved, &state.ledger, &status_column)?
            }
        };
        Ok(file)
    }

    pub async fn export_filtered(&self) -> ApiResult<ExportFile> {
        self.export(ExportScope::Filtered).await
    }

    pub async fn export_all(&self) -> ApiResult<ExportFile> {
        self.export(ExportScope::All).await
    }

    // ==========================================
    // 重置与清除
    // ==========================================

    /// 重置扫码记录（数据集与映射保留）
    pub async fn reset_scans(&self) -> ApiResult<StockCheckView> {
        let _guard = self.op_lock.lock().await;
        let state = self.load_state().await?;
        let next = state.with_reset();
        self.repo.save_ledger(&next.ledger).await?;
        info!(cleared = state.ledger.scanned_total(), "扫码记录已重置");
        self.render(&next, "").await
    }

    /// 清除数据集（连同映射、台账、界面状态）
    pub async fn clear_dataset(&self) -> ApiResult<StockCheckView> {
        let _guard = self.op_lock.lock().await;
        self.repo.clear_all().await?;
        info!("数据集已清除");
        let next = StockCheckState::cleared(self.default_ui().await?);
        self.render(&next, "").await
    }
}

// ==========================================
// ScanSink 实现: 扫码会话直接写入盘点状态
// ==========================================
#[async_trait]
impl ScanSink for StockCheckApi {
    async fn on_scan(&self, code: &str) -> EngineResult<ScanOutcome> {
        match self.record_scan(code).await {
            Ok(report) => {
                debug!(message = %report.message, "会话扫码");
                Ok(report.outcome)
            }
            Err(e) => Err(EngineError::Other(anyhow::Error::new(e))),
        }
    }
}
