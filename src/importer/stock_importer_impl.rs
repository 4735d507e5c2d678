// ==========================================
// 库存盘点对账系统 - 库存清单导入器实现
// ==========================================
// 职责: 整合导入流程，从原始文本到完整数据集
// 流程: 解析 → 表头定位 → 行转记录 → 指纹 → 自动映射
// 红线: 不写存储；数据集完整构建后才交给调用方
// ==========================================

use crate::domain::dataset::{Dataset, Record};
use crate::domain::mapping::{required_fields, FieldMapping};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper as FieldMapperImpl;
use crate::importer::file_parser::{strip_bom, CsvParser};
use crate::importer::fingerprint::fingerprint;
use crate::importer::header_detector::HeaderDetector;
use crate::importer::stock_importer_trait::{FieldMapper, FileParser, StockImporter};
use crate::domain::types::FieldKey;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

/// 导入结果
#[derive(Debug, Clone)]
pub struct ImportedDataset {
    pub dataset: Dataset,           // 完整数据集
    pub mapping: FieldMapping,      // 自动推导的映射
    pub missing_fields: Vec<FieldKey>, // 自动映射后仍缺失的必填字段
    pub delimiter: char,            // 检测到的分隔符
    pub header_row: usize,          // 表头所在行（0 起）
}

impl ImportedDataset {
    /// 自动映射是否已完整（不完整时需要用户修正）
    pub fn mapping_complete(&self) -> bool {
        self.missing_fields.is_empty()
    }
}

// ==========================================
// StockImporterImpl - 库存清单导入器
// ==========================================
pub struct StockImporterImpl {
    file_parser: Box<dyn FileParser>,
    field_mapper: Box<dyn FieldMapper>,
    header_detector: HeaderDetector,
    required: Vec<FieldKey>,
}

impl StockImporterImpl {
    /// 创建导入器
    ///
    /// # 参数
    /// - file_parser: 文本解析器
    /// - field_mapper: 字段映射器
    /// - header_detector: 表头定位器
    /// - require_make: 是否将品牌作为必填字段
    pub fn new(
        file_parser: Box<dyn FileParser>,
        field_mapper: Box<dyn FieldMapper>,
        header_detector: HeaderDetector,
        require_make: bool,
    ) -> Self {
        Self {
            file_parser,
            field_mapper,
            header_detector,
            required: required_fields(require_make),
        }
    }

    /// 使用默认组件创建导入器
    pub fn with_defaults(header_detector: HeaderDetector, require_make: bool) -> Self {
        Self::new(
            Box::new(CsvParser),
            Box::new(FieldMapperImpl),
            header_detector,
            require_make,
        )
    }
}

/// 行转记录: 按位置与表头对齐，缺失单元格补空串，所有值 TRIM
pub fn to_records(headers: &[String], rows: &[Vec<String>]) -> Vec<Record> {
    let cleaner = DataCleaner;
    rows.iter()
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .map(|(idx, header)| {
                    let value = row.get(idx).map(String::as_str).unwrap_or("");
                    (header.clone(), cleaner.clean_text(value, false))
                })
                .collect()
        })
        .collect()
}

impl StockImporter for StockImporterImpl {
    #[instrument(skip(self, text), fields(name = %name, bytes = text.len()))]
    fn import_text(
        &self,
        name: &str,
        text: &str,
        loaded_at: DateTime<Utc>,
    ) -> ImportResult<ImportedDataset> {
        let text = strip_bom(text);

        // === 步骤 1: 解析文本 ===
        let grid = self.file_parser.parse_text(text);
        debug!(
            rows = grid.rows.len(),
            delimiter = ?grid.delimiter,
            "文本解析完成"
        );
        if grid.rows.len() < 2 {
            warn!(rows = grid.rows.len(), "CSV 内容为空或无效");
            return Err(ImportError::EmptyInput {
                rows: grid.rows.len(),
            });
        }

        // === 步骤 2: 表头定位 ===
        let header_row = self.header_detector.locate_header_row(&grid.rows)?;
        let cleaner = DataCleaner;
        let headers: Vec<String> = grid.rows[header_row]
            .iter()
            .map(|h| cleaner.clean_text(h, false))
            .collect();

        // === 步骤 3: 行转记录 ===
        let records = to_records(&headers, &grid.rows[header_row + 1..]);

        // === 步骤 4: 自动映射 ===
        let mapping = self.field_mapper.auto_map(&headers);
        let missing_fields = self.field_mapper.missing_fields(&mapping, &self.required);

        let dataset = Dataset {
            id: fingerprint(text),
            name: name.to_string(),
            loaded_at,
            headers,
            rows: records,
        };

        info!(
            dataset_id = %dataset.id,
            header_row = header_row,
            rows = dataset.rows.len(),
            mapping_complete = missing_fields.is_empty(),
            "库存清单解析完成"
        );

        Ok(ImportedDataset {
            dataset,
            mapping,
            missing_fields,
            delimiter: grid.delimiter,
            header_row,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn importer() -> StockImporterImpl {
        StockImporterImpl::with_defaults(HeaderDetector::default(), false)
    }

    #[test]
    fn test_import_basic() {
        let text = "Stock,Condition,Model\nA1,New,X\nA2,Used,Y\n";
        let result = importer().import_text("a.csv", text, Utc::now()).unwrap();

        assert_eq!(result.dataset.headers, vec!["Stock", "Condition", "Model"]);
        assert_eq!(result.dataset.rows.len(), 2);
        assert_eq!(result.dataset.rows[1]["Model"], "Y");
        assert_eq!(result.dataset.id, fingerprint(text));
        assert!(result.mapping_complete());
        assert_eq!(result.header_row, 0);
    }

    #[test]
    fn test_missing_trailing_cells_become_empty() {
        let text = "Stock,Condition,Model,Calibre\nA1, New \n";
        let result = importer().import_text("a.csv", text, Utc::now()).unwrap();
        let row = &result.dataset.rows[0];
        assert_eq!(row["Condition"], "New");
        assert_eq!(row["Model"], "");
        assert_eq!(row["Calibre"], "");
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = importer().import_text("a.csv", "Stock,Condition,Model\n", Utc::now());
        assert!(matches!(err, Err(ImportError::EmptyInput { rows: 1 })));

        let err = importer().import_text("a.csv", "", Utc::now());
        assert!(matches!(err, Err(ImportError::EmptyInput { rows: 0 })));
    }

    #[test]
    fn test_messy_export_with_preamble() {
        let text = "Rifle Stock Report;;\nFrom 01/01/2024 to 31/01/2024;;\n;;\nStock No;Condition;Model\nA1;New;X\n";
        let result = importer().import_text("report.csv", text, Utc::now()).unwrap();

        assert_eq!(result.delimiter, ';');
        assert_eq!(result.header_row, 1);
        assert_eq!(result.dataset.headers, vec!["Stock No", "Condition", "Model"]);
        assert_eq!(result.dataset.rows.len(), 1);
        assert_eq!(result.mapping.stock.as_deref(), Some("Stock No"));
    }

    #[test]
    fn test_incomplete_mapping_still_imports() {
        let text = "Ref,Condition,Model\nA1,New,X\n";
        let result = importer().import_text("a.csv", text, Utc::now()).unwrap();
        assert!(!result.mapping_complete());
        assert_eq!(result.missing_fields, vec![FieldKey::Stock]);
    }

    #[test]
    fn test_bom_is_ignored() {
        let text = "\u{feff}Stock,Condition,Model\nA1,New,X";
        let result = importer().import_text("a.csv", text, Utc::now()).unwrap();
        assert_eq!(result.dataset.headers[0], "Stock");
        assert_eq!(result.dataset.id, fingerprint("Stock,Condition,Model\nA1,New,X"));
    }
}
