// ==========================================
// ERP 表格导入 - API 层
// ==========================================
// 职责: 提供异步业务 API，供命令行与上层服务调用
// ==========================================

pub mod error;
pub mod import_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, RecipeSheetResponse};
