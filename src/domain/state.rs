// ==========================================
// 库存盘点对账系统 - 应用状态快照
// ==========================================
// 职责: 数据集 / 字段映射 / 扫码台账 / 界面状态 四元组
// 规则: 每个用户动作基于一份快照产生新快照，不原地修改共享状态
// ==========================================

use crate::domain::dataset::Dataset;
use crate::domain::ledger::ScanLedger;
use crate::domain::mapping::FieldMapping;
use crate::domain::selection::UiState;
use crate::domain::types::ListTab;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockCheckState {
    pub dataset: Option<Dataset>,
    pub mapping: FieldMapping,
    pub ledger: ScanLedger,
    pub ui: UiState,
}

impl StockCheckState {
    /// 导入新数据集: 替换数据集与映射，清空台账，界面状态回到默认
    pub fn with_import(&self, dataset: Dataset, mapping: FieldMapping, ui: UiState) -> Self {
        Self {
            dataset: Some(dataset),
            mapping,
            ledger: ScanLedger::new(),
            ui,
        }
    }

    /// 用户修正字段映射
    pub fn with_mapping(&self, mapping: FieldMapping) -> Self {
        Self {
            mapping,
            ..self.clone()
        }
    }

    /// 替换界面状态
    pub fn with_ui(&self, ui: UiState) -> Self {
        Self {
            ui,
            ..self.clone()
        }
    }

    /// 替换扫码台账
    pub fn with_ledger(&self, ledger: ScanLedger) -> Self {
        Self {
            ledger,
            ..self.clone()
        }
    }

    /// 切换成色（清空品牌与型号）
    pub fn with_condition(&self, condition: &str) -> Self {
        let mut ui = self.ui.clone();
        ui.selection.set_condition(condition);
        self.with_ui(ui)
    }

    /// 切换品牌（清空型号）
    pub fn with_make(&self, make: &str) -> Self {
        let mut ui = self.ui.clone();
        ui.selection.set_make(make);
        self.with_ui(ui)
    }

    pub fn with_model(&self, model: &str) -> Self {
        let mut ui = self.ui.clone();
        ui.selection.set_model(model);
        self.with_ui(ui)
    }

    pub fn with_tab(&self, tab: ListTab) -> Self {
        let mut ui = self.ui.clone();
        ui.tab = tab;
        self.with_ui(ui)
    }

    /// 重置盘点: 仅清空台账，数据集与映射保留
    pub fn with_reset(&self) -> Self {
        self.with_ledger(ScanLedger::new())
    }

    /// 清除数据集: 四项全部回到初始值
    pub fn cleared(default_ui: UiState) -> Self {
        Self {
            ui: default_ui,
            ..Self::default()
        }
    }
}
