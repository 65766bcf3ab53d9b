// ==========================================
// ERP 表格导入 - 技术单（BOM）领域模型
// ==========================================
// 红线: 表头拥有明细，删除表头即级联删除明细
// 红线: (recipe_code, component_code) 在同一技术单内唯一
// 对齐: recipe_headers / recipe_lines 表
// ==========================================

use serde::{Deserialize, Serialize};

/// 记录成本与计算成本的默认一致性容差
pub const DEFAULT_COST_TOLERANCE: f64 = 0.01;

// ==========================================
// RecipeHeader - 技术单表头
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeHeader {
    pub code: String,                    // 技术单编码（父产品编码）
    pub name: String,                    // 显示名称
    pub family_label: Option<String>,    // 家族/子家族（自由文本）
    pub portions: f64,                   // 份数
    pub total_cost: f64,                 // 记录总成本（导入时由明细累加）
    pub location: String,                // 所属地区编码
}

// ==========================================
// RecipeLine - 技术单明细
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeLine {
    pub recipe_code: String,            // 所属技术单
    pub position: i64,                  // 顺序号（从 1 开始）
    pub component_code: String,         // 组件产品编码
    pub component_name: Option<String>, // 组件名称
    pub quantity: f64,                  // 用量（>= 0）
    pub unit: String,                   // 单位
    pub unit_price: f64,                // 单价
    pub line_cost: f64,                 // 行成本
}

// ==========================================
// CostCheck - 成本一致性检查
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostCheck {
    pub registered: f64, // 表头记录成本
    pub computed: f64,   // 明细累加成本
    pub difference: f64, // registered - computed
    pub consistent: bool,
}

impl CostCheck {
    /// 比较记录成本与计算成本
    ///
    /// # 规则
    /// - |registered - computed| < tolerance → 一致
    pub fn evaluate(registered: f64, computed: f64, tolerance: f64) -> Self {
        let difference = registered - computed;
        Self {
            registered,
            computed,
            difference,
            consistent: difference.abs() < tolerance,
        }
    }
}

// ==========================================
// RecipeSheet - 表头 + 有序明细（读取视图）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSheet {
    pub header: RecipeHeader,
    pub lines: Vec<RecipeLine>,
}

impl RecipeSheet {
    /// 明细行成本合计
    pub fn computed_cost(&self) -> f64 {
        self.lines.iter().map(|l| l.line_cost).sum()
    }

    /// 每份成本（份数非正时按 1 份计）
    pub fn cost_per_portion(&self) -> f64 {
        let portions = if self.header.portions > 0.0 { self.header.portions } else { 1.0 };
        self.computed_cost() / portions
    }

    pub fn cost_check(&self, tolerance: f64) -> CostCheck {
        CostCheck::evaluate(self.header.total_cost, self.computed_cost(), tolerance)
    }
}
