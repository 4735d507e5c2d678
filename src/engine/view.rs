// ==========================================
// 库存盘点对账系统 - 视图计算
// ==========================================
// 职责: 从一次状态快照重新计算全部展示内容
//       （数据集信息、筛选摘要、分面选项、计数、当前页签列表、完成标记）
// 说明: 每次状态变更后整体重算，不做增量更新
// ==========================================

use crate::domain::dataset::Dataset;
use crate::domain::mapping::ResolvedMapping;
use crate::domain::selection::{FilterSelection, UiState, CONDITION_ALL};
use crate::domain::state::StockCheckState;
use crate::domain::types::ListTab;
use crate::engine::facet::{cascade, FacetIndex};
use crate::engine::filter::FilterEngine;
use crate::engine::reconcile::{partition, reconcile, Counters, RowLine};
use crate::i18n::{t, t_with_args};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 数据集概要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub id: String,
    pub name: String,
    pub rows: usize,
    pub loaded_at: DateTime<Utc>,
}

impl From<&Dataset> for DatasetSummary {
    fn from(dataset: &Dataset) -> Self {
        Self {
            id: dataset.id.clone(),
            name: dataset.name.clone(),
            rows: dataset.row_count(),
            loaded_at: dataset.loaded_at,
        }
    }
}

// ==========================================
// StockCheckView - 展示模型
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockCheckView {
    pub dataset: Option<DatasetSummary>,
    pub info_line: String,
    pub needs_mapping: bool, // 有数据集但映射不完整
    pub selection: FilterSelection,
    pub tab: ListTab,
    pub filter_summary: String,
    pub facets: FacetIndex,
    pub counters: Counters,
    pub rows: Vec<RowLine>, // 当前页签（已应用搜索词）
    pub complete: bool,
    pub status_line: String,
}

/// 视图计算结果
#[derive(Debug, Clone)]
pub struct ViewOutcome {
    pub view: StockCheckView,
    pub ui: UiState,         // 级联修正后的 UI 状态
    pub ui_changed: bool,    // 需要回写存储
}

fn filter_summary(selection: &FilterSelection, has_make: bool) -> String {
    let all = t("view.all");
    let or_all = |v: &str| if v.is_empty() { all.clone() } else { v.to_string() };
    let condition = if selection.condition.is_all() {
        all.clone()
    } else {
        selection.condition.as_str().to_string()
    };

    if has_make {
        t_with_args(
            "view.filter_summary",
            &[
                ("condition", condition.as_str()),
                ("make", or_all(&selection.make).as_str()),
                ("model", or_all(&selection.model).as_str()),
            ],
        )
    } else {
        t_with_args(
            "view.filter_summary_no_make",
            &[("condition", condition.as_str()), ("model", or_all(&selection.model).as_str())],
        )
    }
}

fn info_line(dataset: Option<&Dataset>) -> String {
    match dataset {
        Some(ds) => t_with_args(
            "view.dataset_info",
            &[
                ("name", ds.name.as_str()),
                ("rows", ds.row_count().to_string().as_str()),
                ("loaded_at", ds.loaded_at.format("%Y-%m-%d %H:%M").to_string().as_str()),
            ],
        ),
        None => t("view.no_dataset"),
    }
}

/// 计算视图
///
/// # 参数
/// - state: 状态快照
/// - resolved: 已校验映射（None 表示映射不完整或无数据集）
/// - query: 搜索词
pub fn build_view(
    state: &StockCheckState,
    resolved: Option<&ResolvedMapping>,
    query: &str,
) -> ViewOutcome {
    let tab = state.ui.tab;
    let dataset = state.dataset.as_ref();

    let (dataset, mapping) = match (dataset, resolved) {
        (Some(ds), Some(m)) => (ds, m),
        _ => {
            let selection = state.ui.selection.clone();
            let view = StockCheckView {
                dataset: dataset.map(DatasetSummary::from),
                info_line: info_line(dataset),
                needs_mapping: dataset.is_some(),
                filter_summary: filter_summary(&selection, false),
                selection,
                tab,
                facets: FacetIndex {
                    conditions: vec![CONDITION_ALL.to_string()],
                    ..FacetIndex::default()
                },
                counters: Counters::default(),
                rows: Vec::new(),
                complete: false,
                status_line: String::new(),
            };
            return ViewOutcome {
                view,
                ui: state.ui.clone(),
                ui_changed: false,
            };
        }
    };

    // 分面级联: 失效的品牌/型号重置为通配
    let (facets, selection) = cascade(&dataset.rows, mapping, &state.ui.selection);
    let ui_changed = selection != state.ui.selection;

    let filtered = FilterEngine::new().filter(&dataset.rows, mapping, &selection);
    let counters = reconcile(&filtered, mapping, &state.ledger);
    let parts = partition(&filtered, mapping, &state.ledger, query);

    let rows = match tab {
        ListTab::Missing => parts.missing,
        ListTab::Scanned => parts.scanned,
        ListTab::All => parts.all,
    };

    let complete = counters.is_complete();
    let status_line = if complete {
        t("view.complete")
    } else if rows.is_empty() {
        t("view.empty_list")
    } else {
        String::new()
    };

    let view = StockCheckView {
        dataset: Some(DatasetSummary::from(dataset)),
        info_line: info_line(Some(dataset)),
        needs_mapping: false,
        filter_summary: filter_summary(&selection, mapping.make.is_some()),
        selection: selection.clone(),
        tab,
        facets,
        counters,
        rows,
        complete,
        status_line,
    };

    ViewOutcome {
        view,
        ui: UiState {
            selection,
            tab,
        },
        ui_changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::Record;
    use crate::domain::mapping::FieldMapping;

    fn record(stock: &str, condition: &str, model: &str) -> Record {
        [("Stock", stock), ("Condition", condition), ("Model", model)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn state() -> StockCheckState {
        let dataset = Dataset {
            id: "f00".to_string(),
            name: "stock.csv".to_string(),
            loaded_at: Utc::now(),
            headers: vec!["Stock".into(), "Condition".into(), "Model".into()],
            rows: vec![record("A1", "New", "X"), record("A2", "Used", "Y")],
        };
        StockCheckState::default().with_import(
            dataset,
            FieldMapping::default(),
            UiState::with_default_condition("New"),
        )
    }

    fn mapping() -> ResolvedMapping {
        ResolvedMapping {
            stock: "Stock".to_string(),
            condition: "Condition".to_string(),
            model: "Model".to_string(),
            make: None,
            calibre: None,
        }
    }

    #[test]
    fn test_view_counts_and_tab() {
        let st = state();
        let outcome = build_view(&st, Some(&mapping()), "");
        let view = outcome.view;
        assert_eq!(view.counters.expected, 1);
        assert_eq!(view.counters.missing, 1);
        assert_eq!(view.tab, ListTab::Missing);
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].stock, "A1");
        assert!(!view.complete);
        assert!(!outcome.ui_changed);
        assert_eq!(view.facets.conditions, vec!["All", "New", "Used"]);
    }

    #[test]
    fn test_view_complete_flag() {
        let st = state();
        let mut ledger = st.ledger.clone();
        ledger.mark("A1");
        let st = st.with_ledger(ledger);

        let view = build_view(&st, Some(&mapping()), "").view;
        assert!(view.complete);
        assert!(view.rows.is_empty());
    }

    #[test]
    fn test_view_stale_model_reset() {
        let st = state();
        let mut ui = st.ui.clone();
        ui.selection.model = "Y".to_string();
        let st = st.with_ui(ui);

        let outcome = build_view(&st, Some(&mapping()), "");
        assert!(outcome.ui_changed);
        assert!(outcome.ui.selection.model.is_empty());
        assert_eq!(outcome.view.counters.expected, 1);
    }

    #[test]
    fn test_view_without_mapping() {
        let st = state();
        let view = build_view(&st, None, "").view;
        assert!(view.needs_mapping);
        assert_eq!(view.counters, Counters::default());

        let empty = build_view(&StockCheckState::default(), None, "").view;
        assert!(empty.dataset.is_none());
        assert!(!empty.needs_mapping);
    }
}
