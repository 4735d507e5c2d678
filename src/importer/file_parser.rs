// ==========================================
// 库存盘点对账系统 - 表格文本解析器
// ==========================================
// 职责: 原始 CSV/TSV/分号分隔文本 → 字符串网格
// 阶段 0: 分隔符嗅探 → 状态机分词 → 垃圾行过滤
// 说明: 本层不区分表头与数据行
// ==========================================

use crate::importer::error::ImportResult;
use crate::importer::stock_importer_trait::FileParser;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// 解析结果: 检测到的分隔符 + 行网格
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedGrid {
    pub delimiter: char,
    pub rows: Vec<Vec<String>>,
}

// ==========================================
// 报表前导行模式
// ==========================================
// 导出报表常在表头前附带日期区间/打印信息等行，按表驱动匹配
const PREAMBLE_PATTERNS: &[&str] = &[
    // From 01/01/2024 to 31/01/2024
    r#"(?i)^\s*"?\s*from\s+[^,;\t]*\d[^,;\t]*\s+to\s+[^,;\t]*\d"#,
    // Page 1 of 3
    r"(?i)^\s*page\s+\d+(\s+of\s+\d+)?[\s,;\t]*$",
    // Printed on / Generated at / Exported by ...
    r"(?i)^\s*(printed|generated|exported|run)\s+(on|at|by)\b",
];

fn preamble_regexes() -> &'static [Regex] {
    static REGEXES: OnceLock<Vec<Regex>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        PREAMBLE_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    })
}

/// 是否为垃圾行: 空白 / 只有分隔符与空白 / 报表前导行
pub fn is_junk_line(line: &str) -> bool {
    if line.trim().is_empty() {
        return true;
    }
    if line
        .chars()
        .all(|c| c == ',' || c == ';' || c == '\t' || c.is_whitespace())
    {
        return true;
    }
    preamble_regexes().iter().any(|re| re.is_match(line))
}

/// 换行统一: CRLF 与单独 CR 均转为 LF
fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// 分隔符嗅探
///
/// 取第一条非垃圾行，统计逗号/分号/制表符出现次数:
/// - 分号 > 逗号 且 分号 >= 制表符 → 分号
/// - 制表符 > 逗号 且 制表符 > 分号 → 制表符
/// - 其他 → 逗号
pub fn detect_delimiter(text: &str) -> char {
    let normalized = normalize_newlines(text);
    let Some(line) = normalized.split('\n').find(|l| !is_junk_line(l)) else {
        return ',';
    };

    let count = |ch: char| line.chars().filter(|c| *c == ch).count();
    let commas = count(',');
    let semicolons = count(';');
    let tabs = count('\t');

    if semicolons > commas && semicolons >= tabs {
        ';'
    } else if tabs > commas && tabs > semicolons {
        '\t'
    } else {
        ','
    }
}

/// RFC4180 风格分词（两状态: 引号内 / 引号外）
///
/// - 引号内 `""` 输出字面量 `"`，单个 `"` 切换引号状态
/// - 分隔符与换行只在引号外结束字段/行
/// - 末行仅当字段数 > 1 或唯一字段非空白时才追加
pub fn tokenize(text: &str, delimiter: char) -> Vec<Vec<String>> {
    let normalized = normalize_newlines(text);
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = normalized.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
        } else if c == delimiter {
            row.push(std::mem::take(&mut field));
        } else if c == '\n' {
            row.push(std::mem::take(&mut field));
            rows.push(std::mem::take(&mut row));
        } else {
            field.push(c);
        }
    }

    row.push(field);
    if row.len() > 1 || (row.len() == 1 && !row[0].trim().is_empty()) {
        rows.push(row);
    }
    rows
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl CsvParser {
    /// 读取文件文本（去除 UTF-8 BOM）
    pub fn read_text(path: &Path) -> ImportResult<String> {
        let text = std::fs::read_to_string(path)?;
        Ok(strip_bom(&text).to_string())
    }
}

/// 去除开头的 UTF-8 BOM
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

impl FileParser for CsvParser {
    fn parse_text(&self, text: &str) -> ParsedGrid {
        let delimiter = detect_delimiter(text);
        let sep = delimiter.to_string();

        let rows = tokenize(text, delimiter)
            .into_iter()
            // 跳过完全空白的行
            .filter(|row| !row.iter().all(|cell| cell.trim().is_empty()))
            // 跳过重新拼接后属于垃圾行的行
            .filter(|row| !is_junk_line(&row.join(&sep)))
            .collect();

        ParsedGrid { delimiter, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_quoted_field_with_comma_and_escaped_quote() {
        let grid = CsvParser.parse_text("a,\"b,\"\"c\"\"\",d\n1,2,3");
        assert_eq!(grid.delimiter, ',');
        assert_eq!(
            grid.rows,
            vec![strings(&["a", "b,\"c\"", "d"]), strings(&["1", "2", "3"])]
        );
    }

    #[test]
    fn test_quote_toggles_mid_field() {
        // 字段中间的引号同样切换引号状态（csv crate 会把它当作字面量）
        let rows = tokenize("Stock,Model\nA1,T3x \"Lite, Camo\" 308\n", ',');
        assert_eq!(
            rows,
            vec![strings(&["Stock", "Model"]), strings(&["A1", "T3x Lite, Camo 308"])]
        );
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
        // 分号与逗号相等时取逗号
        assert_eq!(detect_delimiter("a;b,c"), ',');
        // 分号与制表符相等且多于逗号时取分号
        assert_eq!(detect_delimiter("a;b\tc;d\te"), ';');
    }

    #[test]
    fn test_detect_delimiter_skips_preamble() {
        let text = "From 01/01/2024 to 31/01/2024\n\n;;;\nStock;Condition;Model\nA1;New;X";
        assert_eq!(detect_delimiter(text), ';');
    }

    #[test]
    fn test_crlf_and_lone_cr_normalized() {
        let rows = tokenize("a,b\r\n1,2\r3,4", ',');
        assert_eq!(
            rows,
            vec![strings(&["a", "b"]), strings(&["1", "2"]), strings(&["3", "4"])]
        );
    }

    #[test]
    fn test_trailing_newline_does_not_add_row() {
        let rows = tokenize("a,b\n1,2\n", ',');
        assert_eq!(rows.len(), 2);

        // 单字段非空的末行仍然保留
        let rows = tokenize("a\nb", ',');
        assert_eq!(rows, vec![strings(&["a"]), strings(&["b"])]);
    }

    #[test]
    fn test_newline_inside_quotes_kept() {
        let rows = tokenize("\"line1\nline2\",x", ',');
        assert_eq!(rows, vec![strings(&["line1\nline2", "x"])]);
    }

    #[test]
    fn test_junk_rows_filtered() {
        let text = "From 01/01/2024 to 31/01/2024,,\n,,\nStock,Condition,Model\n , , \nA1,New,X\n";
        let grid = CsvParser.parse_text(text);
        assert_eq!(
            grid.rows,
            vec![
                strings(&["Stock", "Condition", "Model"]),
                strings(&["A1", "New", "X"])
            ]
        );
    }

    #[test]
    fn test_is_junk_line() {
        assert!(is_junk_line(""));
        assert!(is_junk_line("  ,;\t "));
        assert!(is_junk_line("From 2024-01-01 to 2024-01-31"));
        assert!(is_junk_line("Page 2 of 5"));
        assert!(is_junk_line("Printed on 01/02/2024"));
        assert!(!is_junk_line("Stock,Condition,Model"));
        assert!(!is_junk_line("A1,New,From Europe"));
    }

    #[test]
    fn test_read_text_strips_bom() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "\u{feff}Stock,Condition,Model\nA1,New,X").unwrap();

        let text = CsvParser::read_text(temp_file.path()).unwrap();
        assert!(text.starts_with("Stock"));
    }

    #[test]
    fn test_read_text_file_not_found() {
        let result = CsvParser::read_text(Path::new("non_existent.csv"));
        assert!(result.is_err());
    }
}
