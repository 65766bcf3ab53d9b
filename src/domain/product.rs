// ==========================================
// ERP 表格导入 - 产品领域模型
// ==========================================
// 红线: code 全局唯一，一经分配不可修改
// 用途: 导入层写入（产品导入 + 技术单组件补建）
// 对齐: products 表
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Product - 产品主数据
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    // ===== 业务主键 =====
    pub code: String, // 产品编码（ERP 侧提供）

    // ===== 基础信息 =====
    pub name: String,              // 显示名称
    pub sale_name: Option<String>, // 销售名称
    pub unit: Option<String>,      // 计量单位
    pub unit_price: f64,           // 单价
    pub tax_rate: f64,             // 税率（%）
    pub markup: Option<f64>,       // 加价率

    // ===== 状态 =====
    pub active: bool,       // 是否启用
    pub discontinued: bool, // 是否停产（停产即强制停用）

    // ===== 分类（自由文本）=====
    pub family: Option<String>,
    pub sub_family: Option<String>,
    pub barcode: Option<String>,
    pub article_type: Option<String>,

    // ===== 归属 =====
    pub location: String, // 所属地区编码

    // ===== 审计字段 =====
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// 以最小信息创建新产品（其余字段取默认值）
    pub fn new(code: impl Into<String>, name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            sale_name: None,
            unit: None,
            unit_price: 0.0,
            tax_rate: 0.0,
            markup: None,
            active: true,
            discontinued: false,
            family: None,
            sub_family: None,
            barcode: None,
            article_type: None,
            location: location.into(),
            updated_at: Utc::now(),
        }
    }
}
