// ==========================================
// 库存盘点对账系统 - 数据集指纹
// ==========================================
// 职责: 原文内容 → 数据集 ID（相同文本重复导入得到相同 ID）
// 算法: 32 位 FNV-1a（逐个 UTF-16 码元异或后乘质数，32 位回绕）
// 说明: 非加密哈希，碰撞风险可接受
// ==========================================

/// FNV 偏移基数
const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;

/// FNV 质数
const FNV_PRIME: u32 = 0x0100_0193;

/// 增量哈希状态
#[derive(Copy, Clone, Debug)]
pub struct Fingerprint(u32);

impl Fingerprint {
    pub fn new() -> Self {
        Self(FNV_OFFSET_BASIS)
    }

    /// 输入文本（按 UTF-16 码元）
    pub fn update(&mut self, text: &str) {
        for unit in text.encode_utf16() {
            self.0 = (self.0 ^ u32::from(unit)).wrapping_mul(FNV_PRIME);
        }
    }

    /// 小写十六进制（不补零）
    pub fn finish_hex(&self) -> String {
        format!("{:x}", self.0)
    }
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self::new()
    }
}

/// 计算文本指纹
pub fn fingerprint(text: &str) -> String {
    let mut hash = Fingerprint::new();
    hash.update(text);
    hash.finish_hex()
}
