// ==========================================
// ERP 表格导入 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约定: 每个错误都映射到结果契约中的稳定错误码
// ==========================================

use crate::domain::ErrorCode;
use crate::repository::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xlsm/.xls/.ods/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("文件没有工作表")]
    NoSheet,

    #[error("文件包含多个工作表: {0} 个（只允许 1 个）")]
    MultipleSheets(usize),

    #[error("未知的导入类型: {0}")]
    UnknownKind(String),

    // ===== 表头错误 =====
    #[error("缺少必需表头: {0}")]
    MissingRequiredHeader(String),

    // ===== 配置错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 数据库错误 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    // ===== 归档错误 =====
    #[error("归档失败: {0}")]
    ArchiveError(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否为配置读取/解析错误
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ImportError::ConfigReadError { .. } | ImportError::ConfigValueError { .. }
        )
    }

    /// 映射到结果契约中的错误码
    pub fn code(&self) -> ErrorCode {
        match self {
            ImportError::FileNotFound(_)
            | ImportError::UnsupportedFormat(_)
            | ImportError::FileReadError(_)
            | ImportError::ExcelParseError(_)
            | ImportError::CsvParseError(_) => ErrorCode::NotASpreadsheet,
            ImportError::NoSheet => ErrorCode::NoSheet,
            ImportError::MultipleSheets(_) => ErrorCode::MultipleSheets,
            ImportError::UnknownKind(_) => ErrorCode::UnknownKind,
            ImportError::MissingRequiredHeader(_) => ErrorCode::MissingRequiredHeader,
            ImportError::ArchiveError(_) => ErrorCode::ArchiveFailed,
            ImportError::ConfigReadError { .. }
            | ImportError::ConfigValueError { .. }
            | ImportError::Repository(_)
            | ImportError::InternalError(_)
            | ImportError::Other(_) => ErrorCode::UnexpectedFailure,
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::Repository(RepositoryError::from(err))
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
