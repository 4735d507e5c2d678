// ==========================================
// 库存盘点对账系统 - 扫码台账与对账
// ==========================================
// 职责: 扫码记录（幂等）、对账计数、列表分区
// 判定顺序: 未找到 → 不在当前筛选 → 已扫 → 记录
// 红线: 只有 Recorded 会产生新台账；计数每次从状态重新计算，不做增量缓存
// 重复编号: 查找取数据集中第一次出现；筛选成员判断取任一命中记录
// ==========================================

use crate::domain::dataset::{field_value, Record};
use crate::domain::ledger::ScanLedger;
use crate::domain::mapping::ResolvedMapping;
use crate::domain::selection::{normalize, FilterSelection};
use crate::domain::state::StockCheckState;
use crate::domain::types::{ScanOutcome, ScanStatus};
use crate::engine::filter::FilterEngine;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 行摘要分隔符
pub const META_SEPARATOR: &str = " • ";

// ==========================================
// ScanResult - 扫码结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub code: String,         // TRIM 后的编号
    pub outcome: ScanOutcome, // 判定结果
    pub ledger: ScanLedger,   // 新台账（非 Recorded 时与输入相同）
    pub row_index: Option<usize>, // 数据集中第一条匹配记录的位置
}

/// 记录一次扫码
///
/// # 参数
/// - code: 原始扫码内容（会 TRIM）
/// - records: 完整数据集记录
/// - mapping: 已校验映射
/// - selection: 扫码时生效的筛选选择
/// - ledger: 当前台账（不修改）
pub fn record_scan(
    code: &str,
    records: &[Record],
    mapping: &ResolvedMapping,
    selection: &FilterSelection,
    ledger: &ScanLedger,
) -> ScanResult {
    let code = code.trim().to_string();
    let engine = FilterEngine::new();

    let stock_of = |r: &Record| field_value(r, Some(&mapping.stock)) == code;

    let row_index = if code.is_empty() {
        None
    } else {
        records.iter().position(|r| stock_of(r))
    };

    let in_filter = row_index.is_some()
        && records
            .iter()
            .any(|r| stock_of(r) && engine.matches(r, mapping, selection));

    let outcome = match row_index {
        None => ScanOutcome::NotFound,
        Some(_) if !in_filter => ScanOutcome::OutOfFilter,
        Some(_) if ledger.is_scanned(&code) => ScanOutcome::AlreadyScanned,
        Some(_) => ScanOutcome::Recorded,
    };

    let ledger = if outcome.is_recorded() {
        let mut next = ledger.clone();
        next.mark(&code);
        next
    } else {
        ledger.clone()
    };

    debug!(code = %code, outcome = ?outcome, "扫码判定完成");

    ScanResult {
        code,
        outcome,
        ledger,
        row_index,
    }
}

/// 在状态快照上记录一次扫码，返回新快照与判定结果
///
/// 没有数据集时一律视为未找到；非 Recorded 时快照不变
pub fn apply_scan(
    state: &StockCheckState,
    code: &str,
    mapping: &ResolvedMapping,
) -> (StockCheckState, ScanOutcome) {
    let Some(dataset) = state.dataset.as_ref() else {
        return (state.clone(), ScanOutcome::NotFound);
    };
    let result = record_scan(code, &dataset.rows, mapping, &state.ui.selection, &state.ledger);
    if result.outcome.is_recorded() {
        (state.with_ledger(result.ledger), result.outcome)
    } else {
        (state.clone(), result.outcome)
    }
}

// ==========================================
// Counters - 对账计数
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counters {
    pub expected: usize,
    pub scanned: usize,
    pub missing: usize,
}

impl Counters {
    /// 当前筛选已全部盘点
    pub fn is_complete(&self) -> bool {
        self.missing == 0 && self.expected > 0
    }
}

/// 对账: expected = 筛选集合大小；scanned = 台账命中数；missing = 差值
pub fn reconcile(
    filtered: &[&Record],
    mapping: &ResolvedMapping,
    ledger: &ScanLedger,
) -> Counters {
    let expected = filtered.len();
    let scanned = filtered
        .iter()
        .filter(|r| ledger.is_scanned(field_value(r, Some(&mapping.stock))))
        .count();

    Counters {
        expected,
        scanned,
        missing: expected - scanned,
    }
}

// ==========================================
// RowLine - 列表行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowLine {
    pub stock: String,
    pub meta: String, // 品牌 • 型号 • 口径（仅非空部分）
    pub status: ScanStatus,
}

impl RowLine {
    pub fn from_record(record: &Record, mapping: &ResolvedMapping, ledger: &ScanLedger) -> Self {
        let stock = field_value(record, Some(&mapping.stock)).to_string();
        let meta = [
            mapping.make.as_deref(),
            Some(mapping.model.as_str()),
            mapping.calibre.as_deref(),
        ]
        .into_iter()
        .map(|col| field_value(record, col))
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(META_SEPARATOR);

        let status = if ledger.is_scanned(&stock) {
            ScanStatus::Scanned
        } else {
            ScanStatus::Missing
        };

        Self {
            stock,
            meta,
            status,
        }
    }

    /// 搜索匹配（query 已规范化；空串不过滤）
    pub fn matches_query(&self, query: &str) -> bool {
        query.is_empty()
            || self.stock.to_lowercase().contains(query)
            || self.meta.to_lowercase().contains(query)
    }
}

// ==========================================
// Partition - 列表分区
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub all: Vec<RowLine>,
    pub scanned: Vec<RowLine>,
    pub missing: Vec<RowLine>,
}

/// 按搜索词过滤后，按台账拆分为已扫/缺失
///
/// all = scanned ∪ missing，两者不相交，顺序与筛选集合一致
pub fn partition(
    filtered: &[&Record],
    mapping: &ResolvedMapping,
    ledger: &ScanLedger,
    query: &str,
) -> Partition {
    let query = normalize(query);

    let all: Vec<RowLine> = filtered
        .iter()
        .map(|r| RowLine::from_record(r, mapping, ledger))
        .filter(|line| line.matches_query(&query))
        .collect();

    let (scanned, missing): (Vec<RowLine>, Vec<RowLine>) = all
        .iter()
        .cloned()
        .partition(|line| line.status == ScanStatus::Scanned);

    Partition {
        all,
        scanned,
        missing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::Dataset;
    use crate::domain::mapping::FieldMapping;
    use crate::domain::selection::UiState;
    use crate::engine::filter::filter_records;
    use chrono::Utc;

    fn record(stock: &str, condition: &str, make: &str, model: &str, calibre: &str) -> Record {
        [
            ("Stock", stock),
            ("Condition", condition),
            ("Make", make),
            ("Model", model),
            ("Calibre", calibre),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn mapping() -> ResolvedMapping {
        ResolvedMapping {
            stock: "Stock".to_string(),
            condition: "Condition".to_string(),
            model: "Model".to_string(),
            make: Some("Make".to_string()),
            calibre: Some("Calibre".to_string()),
        }
    }

    fn records() -> Vec<Record> {
        vec![
            record("A1", "New", "Tikka", "T3x", ".308"),
            record("A2", "Used", "Sako", "S20", ""),
            record("A3", "New", "Sako", "85", "6.5CM"),
        ]
    }

    #[test]
    fn test_outcome_order() {
        let recs = records();
        let selection = FilterSelection::new("New");
        let ledger = ScanLedger::new();

        let r = record_scan("ZZ", &recs, &mapping(), &selection, &ledger);
        assert_eq!(r.outcome, ScanOutcome::NotFound);
        assert_eq!(r.row_index, None);

        let r = record_scan("A2", &recs, &mapping(), &selection, &ledger);
        assert_eq!(r.outcome, ScanOutcome::OutOfFilter);
        assert!(r.ledger.is_empty());

        let r = record_scan(" A1 ", &recs, &mapping(), &selection, &ledger);
        assert_eq!(r.outcome, ScanOutcome::Recorded);
        assert_eq!(r.code, "A1");
        assert!(r.ledger.is_scanned("A1"));

        let again = record_scan("A1", &recs, &mapping(), &selection, &r.ledger);
        assert_eq!(again.outcome, ScanOutcome::AlreadyScanned);
        assert_eq!(again.ledger, r.ledger);
    }

    #[test]
    fn test_blank_code_not_found() {
        let recs = records();
        let r = record_scan("   ", &recs, &mapping(), &FilterSelection::new("All"), &ScanLedger::new());
        assert_eq!(r.outcome, ScanOutcome::NotFound);
    }

    #[test]
    fn test_duplicate_stock_first_occurrence_and_any_in_filter() {
        let recs = vec![
            record("D1", "Used", "Sako", "S20", ""),
            record("D1", "New", "Sako", "S20", ""),
        ];
        let r = record_scan("D1", &recs, &mapping(), &FilterSelection::new("New"), &ScanLedger::new());
        assert_eq!(r.row_index, Some(0));
        assert_eq!(r.outcome, ScanOutcome::Recorded);
    }

    #[test]
    fn test_apply_scan_only_records_once() {
        let dataset = Dataset {
            id: "1".to_string(),
            name: "a.csv".to_string(),
            loaded_at: Utc::now(),
            headers: vec!["Stock".into(), "Condition".into(), "Model".into()],
            rows: records(),
        };
        let state = StockCheckState::default().with_import(
            dataset,
            FieldMapping::default(),
            UiState::with_default_condition("New"),
        );

        let (next, outcome) = apply_scan(&state, "A1", &mapping());
        assert_eq!(outcome, ScanOutcome::Recorded);
        assert!(state.ledger.is_empty());

        let (again, outcome) = apply_scan(&next, "A1", &mapping());
        assert_eq!(outcome, ScanOutcome::AlreadyScanned);
        assert_eq!(again, next);

        let (_, outcome) = apply_scan(&StockCheckState::default(), "A1", &mapping());
        assert_eq!(outcome, ScanOutcome::NotFound);
    }

    #[test]
    fn test_reconcile_conservation() {
        let recs = records();
        let selection = FilterSelection::new("All");
        let filtered = filter_records(&recs, &mapping(), &selection);

        let mut ledger = ScanLedger::new();
        ledger.mark("A3");
        ledger.mark("OTHER");

        let counters = reconcile(&filtered, &mapping(), &ledger);
        assert_eq!(counters.expected, 3);
        assert_eq!(counters.scanned, 1);
        assert_eq!(counters.missing, 2);
        assert!(!counters.is_complete());
    }

    #[test]
    fn test_complete_requires_expected() {
        assert!(!Counters::default().is_complete());
        let done = Counters {
            expected: 2,
            scanned: 2,
            missing: 0,
        };
        assert!(done.is_complete());
    }

    #[test]
    fn test_row_line_meta() {
        let recs = records();
        let line = RowLine::from_record(&recs[0], &mapping(), &ScanLedger::new());
        assert_eq!(line.meta, "Tikka • T3x • .308");
        assert_eq!(line.status, ScanStatus::Missing);

        let line = RowLine::from_record(&recs[1], &mapping(), &ScanLedger::new());
        assert_eq!(line.meta, "Sako • S20");
    }

    #[test]
    fn test_partition_with_query() {
        let recs = records();
        let filtered = filter_records(&recs, &mapping(), &FilterSelection::new("All"));
        let mut ledger = ScanLedger::new();
        ledger.mark("A2");

        let p = partition(&filtered, &mapping(), &ledger, "  SAKO ");
        let stocks = |lines: &[RowLine]| lines.iter().map(|l| l.stock.clone()).collect::<Vec<_>>();
        assert_eq!(stocks(&p.all), vec!["A2", "A3"]);
        assert_eq!(stocks(&p.scanned), vec!["A2"]);
        assert_eq!(stocks(&p.missing), vec!["A3"]);

        let p = partition(&filtered, &mapping(), &ledger, "");
        assert_eq!(p.all.len(), 3);
        assert_eq!(p.scanned.len() + p.missing.len(), p.all.len());

        let p = partition(&filtered, &mapping(), &ledger, "a1");
        assert_eq!(stocks(&p.all), vec!["A1"]);
    }
}
