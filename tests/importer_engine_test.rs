// ==========================================
// 库存盘点对账系统 - 清单导入集成测试
// ==========================================
// 覆盖: 报表前导行、BOM/CRLF、分隔符嗅探、表头定位、自动映射、指纹
// ==========================================

use chrono::Utc;
use stockcheck::domain::types::FieldKey;
use stockcheck::importer::{
    HeaderDetector, ImportError, StockImporter, StockImporterImpl,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn importer(require_make: bool) -> StockImporterImpl {
    StockImporterImpl::with_defaults(HeaderDetector::new(10, 3), require_make)
}

// ==========================================
// 测试用例 1: 带前导行的导出报表
// ==========================================
#[test]
fn test_report_with_preamble_and_crlf() {
    let text = "\u{feff}From 01/01/2024 to 31/01/2024\r\n\
                Page 1 of 2\r\n\
                ,,,\r\n\
                Stock Number,Condition,Make,Model,Caliber\r\n \
                A1 , New ,Ruger,10/22,22LR\r\n\
                A2,Used,Ruger,10/22\r\n";

    let result = importer(false)
        .import_text("report.csv", text, Utc::now())
        .unwrap();

    assert_eq!(result.delimiter, ',');
    assert_eq!(result.header_row, 0);
    assert!(result.mapping_complete());

    let ds = &result.dataset;
    assert_eq!(
        ds.headers,
        vec!["Stock Number", "Condition", "Make", "Model", "Caliber"]
    );
    assert_eq!(ds.row_count(), 2);
    assert_eq!(ds.rows[0]["Stock Number"], "A1");
    assert_eq!(ds.rows[0]["Condition"], "New");
    // 缺失的单元格补空串
    assert_eq!(ds.rows[1]["Caliber"], "");

    assert_eq!(result.mapping.get(FieldKey::Stock), Some("Stock Number"));
    assert_eq!(result.mapping.get(FieldKey::Calibre), Some("Caliber"));
}

// ==========================================
// 测试用例 2: 分号分隔 + 品牌必填开关
// ==========================================
#[test]
fn test_semicolon_file_and_require_make() {
    let text = "Stock;Condition;Model\nX1;New;M1\nX2;Used;M2\n";

    let relaxed = importer(false)
        .import_text("semi.csv", text, Utc::now())
        .unwrap();
    assert_eq!(relaxed.delimiter, ';');
    assert!(relaxed.missing_fields.is_empty());
    assert_eq!(relaxed.mapping.get(FieldKey::Make), None);

    let strict = importer(true)
        .import_text("semi.csv", text, Utc::now())
        .unwrap();
    assert_eq!(strict.missing_fields, vec![FieldKey::Make]);
}

// ==========================================
// 测试用例 3: 引号字段（逗号与转义引号）
// ==========================================
#[test]
fn test_quoted_cells_survive_import() {
    let text = "Stock,Condition,Model\nA1,New,\"Model 70, \"\"Classic\"\"\"\n";
    let result = importer(false)
        .import_text("quoted.csv", text, Utc::now())
        .unwrap();
    assert_eq!(result.dataset.rows[0]["Model"], "Model 70, \"Classic\"");
}

// ==========================================
// 测试用例 4: 无效输入
// ==========================================
#[test]
fn test_header_only_is_empty_input() {
    let err = importer(false)
        .import_text("empty.csv", "Stock,Condition,Model\n", Utc::now())
        .unwrap_err();
    assert!(matches!(err, ImportError::EmptyInput { rows: 1 }));

    let err = importer(false)
        .import_text("blank.csv", "\n\n  \n", Utc::now())
        .unwrap_err();
    assert!(matches!(err, ImportError::EmptyInput { rows: 0 }));
}

#[test]
fn test_single_column_text_has_no_header() {
    let err = importer(false)
        .import_text("notes.txt", "alpha\nbeta\ngamma\n", Utc::now())
        .unwrap_err();
    match err {
        ImportError::HeaderNotDetected { found, required, .. } => {
            assert_eq!(found, 1);
            assert_eq!(required, 3);
        }
        other => panic!("Expected HeaderNotDetected, got {:?}", other),
    }
}

// ==========================================
// 测试用例 5: 数据集指纹
// ==========================================
#[test]
fn test_dataset_id_is_content_fingerprint() {
    let text = "Stock,Condition,Model\nA1,New,X\n";
    let first = importer(false).import_text("a.csv", text, Utc::now()).unwrap();
    let again = importer(false).import_text("b.csv", text, Utc::now()).unwrap();
    let other = importer(false)
        .import_text("a.csv", "Stock,Condition,Model\nA2,New,X\n", Utc::now())
        .unwrap();

    // 相同原文 → 相同 ID（与文件名无关）
    assert_eq!(first.dataset.id, again.dataset.id);
    assert_ne!(first.dataset.id, other.dataset.id);
    assert!(first
        .dataset
        .id
        .chars()
        .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

// ==========================================
// 测试用例 6: 从文件读取（BOM 去除）
// ==========================================
#[test]
fn test_read_file_strips_bom() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "\u{feff}Stock,Condition,Model\nA1,New,X\n").unwrap();

    let text = stockcheck::importer::CsvParser::read_text(file.path()).unwrap();
    assert!(text.starts_with("Stock"));

    let result = importer(false).import_text("f.csv", &text, Utc::now()).unwrap();
    assert_eq!(result.dataset.headers[0], "Stock");
}
