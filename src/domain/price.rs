// ==========================================
// ERP 表格导入 - 门店价格领域模型
// ==========================================
// 红线: (product_code, store) 唯一
// 对齐: price_entries 表
// ==========================================

use serde::{Deserialize, Serialize};

/// 价格档位数量
pub const PRICE_TIERS: usize = 5;

// ==========================================
// PriceEntry - 门店价格与税率
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    // ===== 复合主键 =====
    pub product_code: String,
    pub store: String,

    // ===== 价格与税率 =====
    pub prices: [f64; PRICE_TIERS], // preco1..preco5
    pub tax_rate_1: f64,
    pub tax_rate_2: f64,
    pub tax_exempt: bool,
    pub active: bool,

    // ===== 报表冗余字段 =====
    pub sale_name: Option<String>,
    pub family: Option<String>,
    pub sub_family: Option<String>,
}

impl PriceEntry {
    pub fn new(product_code: impl Into<String>, store: impl Into<String>) -> Self {
        Self {
            product_code: product_code.into(),
            store: store.into(),
            prices: [0.0; PRICE_TIERS],
            tax_rate_1: 0.0,
            tax_rate_2: 0.0,
            tax_exempt: false,
            active: true,
            sale_name: None,
            family: None,
            sub_family: None,
        }
    }
}
