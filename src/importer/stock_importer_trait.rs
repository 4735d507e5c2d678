// ==========================================
// 库存盘点对账系统 - 库存清单导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 流程: 文本解析 → 表头定位 → 行转记录 → 字段自动映射
// ==========================================

use crate::domain::mapping::{FieldMapping, ResolvedMapping};
use crate::domain::types::FieldKey;
use crate::importer::error::ImportResult;
use crate::importer::file_parser::ParsedGrid;
use crate::importer::stock_importer_impl::ImportedDataset;
use chrono::{DateTime, Utc};

// ==========================================
// StockImporter Trait
// ==========================================
// 用途: 导入主接口
// 实现者: StockImporterImpl
pub trait StockImporter: Send + Sync {
    /// 从原始文本构建数据集
    ///
    /// # 参数
    /// - name: 来源文件名
    /// - text: 原始文本（UTF-8）
    /// - loaded_at: 导入时间
    ///
    /// # 返回
    /// - Ok(ImportedDataset): 完整数据集 + 自动推导的映射
    /// - Err: 内容为空/无效、无法识别表头
    ///
    /// # 说明
    /// - 完整构建数据集后才返回，调用方据此整体落库
    fn import_text(
        &self,
        name: &str,
        text: &str,
        loaded_at: DateTime<Utc>,
    ) -> ImportResult<ImportedDataset>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文本解析接口（阶段 0）
// 实现者: CsvParser
pub trait FileParser: Send + Sync {
    /// 解析文本为字符串网格（含分隔符嗅探与垃圾行过滤）
    fn parse_text(&self, text: &str) -> ParsedGrid;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 表头 → 语义字段映射接口（阶段 2）
// 实现者: FieldMapperImpl
pub trait FieldMapper: Send + Sync {
    /// 按同义词优先级自动推导映射
    ///
    /// # 规则
    /// - 表头与同义词均做 去空白+小写 后精确比较
    /// - 按同义词顺序取第一个命中的表头，未命中保持未绑定
    fn auto_map(&self, headers: &[String]) -> FieldMapping;

    /// 缺失的必填字段
    fn missing_fields(&self, mapping: &FieldMapping, required: &[FieldKey]) -> Vec<FieldKey>;

    /// 映射是否完整（所有必填字段均已绑定）
    fn is_complete(&self, mapping: &FieldMapping, required: &[FieldKey]) -> bool {
        self.missing_fields(mapping, required).is_empty()
    }

    /// 对照数据集表头校验映射，得到可用于筛选的完整映射
    ///
    /// # 返回
    /// - Ok(ResolvedMapping): 必填字段全部绑定到存在的列
    /// - Err(MappingIncomplete / UnknownColumn)
    fn resolve(
        &self,
        mapping: &FieldMapping,
        headers: &[String],
        required: &[FieldKey],
    ) -> ImportResult<ResolvedMapping>;
}
