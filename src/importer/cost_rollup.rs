// ==========================================
// ERP 表格导入 - 技术单成本汇总
// ==========================================
// 行成本 = preco 覆盖值（若存在）否则 qtd × 单价
// 表头总成本 = Σ 行成本
// ==========================================

use crate::domain::CostCheck;

/// 计算单行成本
///
/// # 参数
/// - quantity: 用量
/// - unit_price: 单价
/// - cost_override: 表中显式给出的行成本（preco 列）
pub fn line_cost(quantity: f64, unit_price: f64, cost_override: Option<f64>) -> f64 {
    cost_override.unwrap_or(quantity * unit_price)
}

/// 技术单成本累加器
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostRollup {
    recorded: f64, // Σ 实际写入的行成本
    computed: f64, // Σ qtd × 单价
    lines: usize,
}

impl CostRollup {
    pub fn new() -> Self {
        Self::default()
    }

    /// 累加一行，返回该行写入的成本
    pub fn add_line(&mut self, quantity: f64, unit_price: f64, cost_override: Option<f64>) -> f64 {
        let cost = line_cost(quantity, unit_price, cost_override);
        self.recorded += cost;
        self.computed += quantity * unit_price;
        self.lines += 1;
        cost
    }

    /// 表头总成本
    pub fn total(&self) -> f64 {
        self.recorded
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    /// 记录总成本与 qtd × 单价 汇总的一致性
    pub fn check(&self, tolerance: f64) -> CostCheck {
        CostCheck::evaluate(self.recorded, self.computed, tolerance)
    }
}
