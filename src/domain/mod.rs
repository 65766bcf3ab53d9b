// ==========================================
// ERP 表格导入 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、结果契约
// 红线: 不含数据访问逻辑，不含导入逻辑
// ==========================================

pub mod import;
pub mod price;
pub mod product;
pub mod recipe;
pub mod types;

// 重导出核心类型
pub use import::{ImportCounts, ImportDiagnostic, ImportOutcome, ImportReport};
pub use price::{PriceEntry, PRICE_TIERS};
pub use product::Product;
pub use recipe::{CostCheck, RecipeHeader, RecipeLine, RecipeSheet, DEFAULT_COST_TOLERANCE};
pub use types::{ErrorCode, ImportKind, ImportStatus};
