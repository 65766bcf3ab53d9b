// ==========================================
// ERP 表格导入 - 核心库
// ==========================================
// 职责: 将 ERP 导出的单工作表文件导入产品、技术单（BOM）与门店价格
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 表格导入管道
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 异步业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    CostCheck, ErrorCode, ImportCounts, ImportDiagnostic, ImportKind, ImportOutcome,
    ImportStatus, PriceEntry, Product, RecipeHeader, RecipeLine, RecipeSheet,
};

// 导入管道
pub use importer::{
    HeaderAliases, HeaderNormalizer, HistoryArchiver, ImportError, ImportOrchestrator,
    ImportResult,
};

// 存储与配置
pub use config::{ConfigManager, ImportConfigReader, ImportSettings};
pub use repository::{RecordStore, RecordWriter, SqliteRecordStore, StoreTransaction};

// API
pub use api::{ApiError, ImportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
