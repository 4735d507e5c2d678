// ==========================================
// 库存盘点对账系统 - 引擎层
// ==========================================
// 职责: 分面、筛选、扫码对账、导出、扫码会话
// 红线: 引擎不读写存储；计数与列表每次由状态快照重新计算
// ==========================================

pub mod error;
pub mod export;
pub mod facet;
pub mod filter;
pub mod reconcile;
pub mod scan_session;
pub mod view;

// 重导出核心引擎
pub use error::{EngineError, EngineResult};
pub use export::{
    export_all, export_filtered, serialize, ExportFile, ExportScope, DEFAULT_STATUS_COLUMN,
};
pub use facet::{cascade, condition_options, locale_compare, unique_values, FacetIndex};
pub use filter::{filter_records, FilterEngine};
pub use reconcile::{
    apply_scan, partition, reconcile, record_scan, Counters, Partition, RowLine, ScanResult,
    META_SEPARATOR,
};
pub use scan_session::{
    Debouncer, ReaderScanSource, ScanSession, ScanSink, ScanSource, SessionReport,
    StreamScanSource, DEFAULT_DEBOUNCE_MS,
};
pub use view::{build_view, DatasetSummary, StockCheckView, ViewOutcome};
