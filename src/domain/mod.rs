// ==========================================
// 库存盘点对账系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod dataset;
pub mod ledger;
pub mod mapping;
pub mod selection;
pub mod state;
pub mod types;

// 重导出核心类型
pub use dataset::{field_value, Dataset, Record};
pub use ledger::ScanLedger;
pub use mapping::{required_fields, FieldMapping, ResolvedMapping};
pub use selection::{ConditionFilter, FilterSelection, UiState, CONDITION_ALL};
pub use state::StockCheckState;
pub use types::{FieldKey, ListTab, ScanOutcome, ScanStatus};
