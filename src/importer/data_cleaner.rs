// ==========================================
// 库存盘点对账系统 - 数据清洗器实现
// ==========================================
// 职责: TRIM / 小写规范化 / 成色值规范化
// ==========================================

pub struct DataCleaner;

impl DataCleaner {
    /// 清洗文本字段（TRIM，可选小写）
    pub fn clean_text(&self, value: &str, lowercase: bool) -> String {
        let trimmed = value.trim();
        if lowercase {
            trimmed.to_lowercase()
        } else {
            trimmed.to_string()
        }
    }

    /// 比较键: TRIM + 小写
    pub fn normalize_key(&self, value: &str) -> String {
        self.clean_text(value, true)
    }

    /// 成色显示值规范化
    ///
    /// new → New, used → Used, all → All；其余保留原文（去空白）
    pub fn canonical_condition(&self, value: &str) -> String {
        match self.normalize_key(value).as_str() {
            "" => String::new(),
            "new" => "New".to_string(),
            "used" => "Used".to_string(),
            "all" => "All".to_string(),
            _ => value.trim().to_string(),
        }
    }
}
