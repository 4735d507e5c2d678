// ==========================================
// 库存盘点对账系统 - 表头行定位
// ==========================================
// 职责: 对带前导行的杂乱导出文件，在前若干行中按关键词打分选出表头行
// 规则:
// - 行内单元格 TRIM+小写 后以空格拼接，按关键词子串命中累加权重
// - 严格大于才替换，平分时保留靠前的行
// - 胜出行的有效列名不足下限时判定失败
// ==========================================

use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use tracing::debug;

/// 表头关键词权重
pub const HEADER_KEYWORD_WEIGHTS: &[(&str, u32)] = &[
    ("stock", 3),
    ("condition", 3),
    ("model", 2),
    ("make", 2),
];

/// 默认扫描行数
pub const DEFAULT_HEADER_SCAN_ROWS: usize = 10;

/// 默认最少有效列名数
pub const DEFAULT_MIN_HEADER_NAMES: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct HeaderDetector {
    scan_rows: usize,
    min_header_names: usize,
}

impl Default for HeaderDetector {
    fn default() -> Self {
        Self::new(DEFAULT_HEADER_SCAN_ROWS, DEFAULT_MIN_HEADER_NAMES)
    }
}

impl HeaderDetector {
    pub fn new(scan_rows: usize, min_header_names: usize) -> Self {
        Self {
            scan_rows: scan_rows.max(1),
            min_header_names,
        }
    }

    /// 单行得分
    pub fn score_row(&self, row: &[String]) -> u32 {
        let cleaner = DataCleaner;
        let text = row
            .iter()
            .map(|cell| cleaner.normalize_key(cell))
            .collect::<Vec<_>>()
            .join(" ");

        HEADER_KEYWORD_WEIGHTS
            .iter()
            .filter(|(keyword, _)| text.contains(keyword))
            .map(|(_, weight)| weight)
            .sum()
    }

    /// 定位表头行下标
    ///
    /// # 返回
    /// - Ok(usize): 表头行下标
    /// - Err(HeaderNotDetected): 胜出行有效列名不足
    pub fn locate_header_row(&self, rows: &[Vec<String>]) -> ImportResult<usize> {
        let mut best_idx = 0usize;
        let mut best_score: Option<u32> = None;

        for (idx, row) in rows.iter().take(self.scan_rows).enumerate() {
            let score = self.score_row(row);
            if best_score.map_or(true, |best| score > best) {
                best_idx = idx;
                best_score = Some(score);
            }
        }

        let found = rows
            .get(best_idx)
            .map(|row| row.iter().filter(|cell| !cell.trim().is_empty()).count())
            .unwrap_or(0);

        debug!(
            header_row = best_idx,
            score = best_score.unwrap_or(0),
            header_names = found,
            "表头行定位完成"
        );

        if found < self.min_header_names {
            return Err(ImportError::HeaderNotDetected {
                row: best_idx + 1,
                found,
                required: self.min_header_names,
            });
        }
        Ok(best_idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_score_row_weights() {
        let detector = HeaderDetector::default();
        assert_eq!(detector.score_row(&row(&["Stock No", "Condition", "Model", "Make"])), 10);
        assert_eq!(detector.score_row(&row(&["Rifle Model", "x"])), 2);
        // 同一关键词只计一次
        assert_eq!(detector.score_row(&row(&["Stock", "Stock ID"])), 3);
        assert_eq!(detector.score_row(&row(&["A1", "New", "X"])), 0);
    }

    #[test]
    fn test_locate_header_after_preamble() {
        let rows = vec![
            row(&["Inventory Report", "", ""]),
            row(&["Branch: North", "", ""]),
            row(&["Stock", "Condition", "Model"]),
            row(&["A1", "New", "X"]),
        ];
        assert_eq!(HeaderDetector::default().locate_header_row(&rows).unwrap(), 2);
    }

    #[test]
    fn test_tie_keeps_earliest_row() {
        let rows = vec![
            row(&["Stock", "Condition", "Model"]),
            row(&["Stock", "Condition", "Model"]),
        ];
        assert_eq!(HeaderDetector::default().locate_header_row(&rows).unwrap(), 0);
    }

    #[test]
    fn test_no_keywords_falls_back_to_first_row() {
        let rows = vec![row(&["Ref", "Kind", "Desc"]), row(&["1", "2", "3"])];
        assert_eq!(HeaderDetector::default().locate_header_row(&rows).unwrap(), 0);
    }

    #[test]
    fn test_only_first_rows_are_scanned() {
        let mut rows: Vec<Vec<String>> = (0..3).map(|i| row(&[&format!("r{i}"), "a", "b"])).collect();
        rows.push(row(&["Stock", "Condition", "Model"]));

        let detector = HeaderDetector::new(3, 3);
        assert_eq!(detector.locate_header_row(&rows).unwrap(), 0);
        assert_eq!(HeaderDetector::default().locate_header_row(&rows).unwrap(), 3);
    }

    #[test]
    fn test_too_few_header_names() {
        let rows = vec![row(&["Stock", "Condition", ""]), row(&["A1", "New", ""])];
        let err = HeaderDetector::default().locate_header_row(&rows).unwrap_err();
        assert!(matches!(
            err,
            ImportError::HeaderNotDetected { found: 2, required: 3, .. }
        ));
    }
}
