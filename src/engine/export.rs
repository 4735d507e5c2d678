// ==========================================
// 库存盘点对账系统 - 导出序列化
// ==========================================
// 职责: 记录集 + 盘点状态列 → 逗号分隔文本
// 转义: 含逗号/双引号/换行的字段整体加引号，内部引号翻倍
// 状态列: 表头中不存在时追加；存在时覆盖原值
// ==========================================

use crate::domain::dataset::{field_value, Dataset, Record};
use crate::domain::ledger::ScanLedger;
use crate::domain::mapping::ResolvedMapping;
use crate::domain::selection::FilterSelection;
use crate::domain::types::ScanStatus;
use crate::engine::error::EngineResult;
use crate::engine::filter::FilterEngine;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};
use tracing::info;

/// 默认状态列名
pub const DEFAULT_STATUS_COLUMN: &str = "StockCheckStatus";

// ==========================================
// ExportScope - 导出范围
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportScope {
    Filtered, // 当前筛选集合，状态 SCANNED / MISSING
    All,      // 全部记录，状态 SCANNED / 空
}

impl ExportScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportScope::Filtered => "filtered",
            ExportScope::All => "all",
        }
    }

    /// 导出文件名
    pub fn filename(&self, dataset_id: &str) -> String {
        format!("stockcheck_{}_{}.csv", self.as_str(), dataset_id)
    }
}

// ==========================================
// ExportFile - 导出结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFile {
    pub filename: String,
    pub content: String,
    pub rows: usize,
}

/// 序列化表头与记录
///
/// 记录中缺少某列时写空串
pub fn serialize(headers: &[String], records: &[Record]) -> EngineResult<String> {
    let mut writer = WriterBuilder::new()
        .delimiter(b',')
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(headers)?;
    for record in records {
        writer.write_record(
            headers
                .iter()
                .map(|h| record.get(h).map(String::as_str).unwrap_or("")),
        )?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("CSV 缓冲区写出失败: {}", e))?;
    let content =
        String::from_utf8(bytes).map_err(|e| anyhow::anyhow!("CSV 内容不是合法 UTF-8: {}", e))?;
    Ok(content)
}

/// 表头副本，必要时追加状态列
fn headers_with_status(dataset: &Dataset, status_column: &str) -> Vec<String> {
    let mut headers = dataset.headers.clone();
    if !headers.iter().any(|h| h == status_column) {
        headers.push(status_column.to_string());
    }
    headers
}

fn with_status(record: &Record, status_column: &str, status: &str) -> Record {
    let mut out = record.clone();
    out.insert(status_column.to_string(), status.to_string());
    out
}

/// 导出当前筛选集合
pub fn export_filtered(
    dataset: &Dataset,
    mapping: &ResolvedMapping,
    selection: &FilterSelection,
    ledger: &ScanLedger,
    status_column: &str,
) -> EngineResult<ExportFile> {
    let filtered = FilterEngine::new().filter(&dataset.rows, mapping, selection);

    let rows: Vec<Record> = filtered
        .iter()
        .map(|r| {
            let status = if ledger.is_scanned(field_value(r, Some(&mapping.stock))) {
                ScanStatus::Scanned
            } else {
                ScanStatus::Missing
            };
            with_status(r, status_column, &status.to_string())
        })
        .collect();

    let content = serialize(&headers_with_status(dataset, status_column), &rows)?;
    let file = ExportFile {
        filename: ExportScope::Filtered.filename(&dataset.id),
        content,
        rows: rows.len(),
    };

    info!(filename = %file.filename, rows = file.rows, "导出筛选集合");
    Ok(file)
}

/// 导出全部记录（未扫为空状态）
pub fn export_all(
    dataset: &Dataset,
    mapping: &ResolvedMapping,
    ledger: &ScanLedger,
    status_column: &str,
) -> EngineResult<ExportFile> {
    let rows: Vec<Record> = dataset
        .rows
        .iter()
        .map(|r| {
            let status = if ledger.is_scanned(field_value(r, Some(&mapping.stock))) {
                ScanStatus::Scanned.to_string()
            } else {
                String::new()
            };
            with_status(r, status_column, &status)
        })
        .collect();

    let content = serialize(&headers_with_status(dataset, status_column), &rows)?;
    let file = ExportFile {
        filename: ExportScope::All.filename(&dataset.id),
        content,
        rows: rows.len(),
    };

    info!(filename = %file.filename, rows = file.rows, "导出全部记录");
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn dataset() -> Dataset {
        Dataset {
            id: "abc123".to_string(),
            name: "stock.csv".to_string(),
            loaded_at: Utc::now(),
            headers: vec!["Stock".into(), "Condition".into(), "Model".into()],
            rows: vec![
                record(&[("Stock", "A1"), ("Condition", "New"), ("Model", "X, \"deluxe\"")]),
                record(&[("Stock", "A2"), ("Condition", "Used"), ("Model", "Y")]),
                record(&[("Stock", "A3"), ("Condition", "New"), ("Model", "Z")]),
            ],
        }
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
    fn test_serialize_quoting() {
        let headers = vec!["a".to_string(), "b".to_string()];
        let rows = vec![
            record(&[("a", "plain"), ("b", "has,comma")]),
            record(&[("a", "say \"hi\""), ("b", "line\nbreak")]),
            record(&[("a", "only-a")]),
        ];
        let text = serialize(&headers, &rows).unwrap();
        assert_eq!(
            text,
            "a,b\nplain,\"has,comma\"\n\"say \"\"hi\"\"\",\"line\nbreak\"\nonly-a,\n"
        );
    }

    #[test]
    fn test_export_filtered_status() {
        let mut ledger = ScanLedger::new();
        ledger.mark("A1");
        let file = export_filtered(
            &dataset(),
            &mapping(),
            &FilterSelection::new("New"),
            &ledger,
            DEFAULT_STATUS_COLUMN,
        )
        .unwrap();

        assert_eq!(file.filename, "stockcheck_filtered_abc123.csv");
        assert_eq!(file.rows, 2);
        assert_eq!(
            file.content,
            "Stock,Condition,Model,StockCheckStatus\nA1,New,\"X, \"\"deluxe\"\"\",SCANNED\nA3,New,Z,MISSING\n"
        );
    }

    #[test]
    fn test_export_all_blank_for_unscanned() {
        let mut ledger = ScanLedger::new();
        ledger.mark("A2");
        let file = export_all(&dataset(), &mapping(), &ledger, DEFAULT_STATUS_COLUMN).unwrap();

        assert_eq!(file.filename, "stockcheck_all_abc123.csv");
        let lines: Vec<&str> = file.content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].ends_with(",\"X, \"\"deluxe\"\"\","));
        assert_eq!(lines[2], "A2,Used,Y,SCANNED");
        assert_eq!(lines[3], "A3,New,Z,");
    }

    #[test]
    fn test_existing_status_column_overwritten() {
        let mut ds = dataset();
        ds.headers.push("StockCheckStatus".to_string());
        for row in ds.rows.iter_mut() {
            row.insert("StockCheckStatus".to_string(), "stale".to_string());
        }
        let file = export_all(&ds, &mapping(), &ScanLedger::new(), DEFAULT_STATUS_COLUMN).unwrap();
        let header = file.content.lines().next().unwrap();
        assert_eq!(header.matches("StockCheckStatus").count(), 1);
        assert!(!file.content.contains("stale"));
    }
}
