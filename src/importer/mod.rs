// ==========================================
// 库存盘点对账系统 - 导入层
// ==========================================
// 职责: 外部库存清单导入,生成内部数据集
// 支持: CSV / TSV / 分号分隔文本（含报表前导行）
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod fingerprint;
pub mod header_detector;
pub mod stock_importer_impl;
pub mod stock_importer_trait;

// 重导出核心类型
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use error::{ImportError, ImportResult};
pub use field_mapper::{FieldMapper as FieldMapperImpl, HEADER_SYNONYMS};
pub use file_parser::{detect_delimiter, is_junk_line, tokenize, CsvParser, ParsedGrid};
pub use fingerprint::fingerprint;
pub use header_detector::HeaderDetector;
pub use stock_importer_impl::{ImportedDataset, StockImporterImpl};

// 重导出 Trait 接口
pub use stock_importer_trait::{FieldMapper, FileParser, StockImporter};
