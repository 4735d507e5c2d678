// ==========================================
// 库存盘点对账系统 - 扫码台账
// ==========================================
// 职责: 记录已确认在场的库存编号（扫码或手工录入）
// 规则: 只增不删；整体清空只能通过重置
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 扫码台账: 库存编号 → 是否已确认
///
/// 台账与当前筛选无关，换筛选后已扫记录仍保留。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanLedger(BTreeMap<String, bool>);

impl ScanLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 编号是否已被确认（存在且为 true）
    pub fn is_scanned(&self, stock_id: &str) -> bool {
        self.0.get(stock_id).copied().unwrap_or(false)
    }

    /// 标记编号为已确认
    pub fn mark(&mut self, stock_id: &str) {
        self.0.insert(stock_id.to_string(), true);
    }

    /// 已确认编号数量（不区分筛选）
    pub fn scanned_total(&self) -> usize {
        self.0.values().filter(|v| **v).count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 已确认编号（按字典序）
    pub fn scanned_ids(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter(|(_, v)| **v).map(|(k, _)| k.as_str())
    }
}
