// ==========================================
// ERP 表格导入 - 导入层
// ==========================================
// 职责: 单工作表文件 → 产品 / 技术单 / 门店价格
// 支持: Excel (.xlsx/.xlsm/.xls/.xlsb), OpenDocument (.ods), CSV
// ==========================================

// 模块声明
pub mod archive;
pub mod coercion;
pub mod cost_rollup;
pub mod error;
pub mod file_parser;
pub mod header_normalizer;
pub mod orchestrator;
pub mod price_strategy;
pub mod product_strategy;
pub mod recipe_strategy;
pub mod schema_validator;
pub mod strategy;
pub mod table;

// 重导出核心类型
pub use archive::{Archiver, HistoryArchiver};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, UniversalFileParser};
pub use header_normalizer::{HeaderAliases, HeaderNormalizer};
pub use orchestrator::ImportOrchestrator;
pub use strategy::{strategy_for, ImportStrategy};
pub use table::{RawSheet, SheetRow, SheetTable};
