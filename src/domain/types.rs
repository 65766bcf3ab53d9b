// ==========================================
// ERP 表格导入 - 领域类型定义
// ==========================================
// 导入类型 / 运行状态 / 错误码
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 导入类型 (Import Kind)
// ==========================================
// 三种导入互斥，由调用方随文件一起指定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Products, // 产品主数据
    Recipes,  // 技术单（BOM）
    Prices,   // 门店价格与税率
}

impl ImportKind {
    pub const ALL: [ImportKind; 3] = [ImportKind::Products, ImportKind::Recipes, ImportKind::Prices];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Products => "products",
            ImportKind::Recipes => "recipes",
            ImportKind::Prices => "prices",
        }
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 解析导入类型名称
///
/// 兼容 ERP 侧的葡语名称（produtos / fichas / precos）
impl FromStr for ImportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "products" | "produtos" => Ok(ImportKind::Products),
            "recipes" | "fichas" => Ok(ImportKind::Recipes),
            "prices" | "precos" | "preços" => Ok(ImportKind::Prices),
            other => Err(format!("未知的导入类型: {}", other)),
        }
    }
}

// ==========================================
// 运行状态 (Import Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Success, // 已提交（可能带有行级诊断）
    Error,   // 未提交任何数据
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportStatus::Success => write!(f, "success"),
            ImportStatus::Error => write!(f, "error"),
        }
    }
}

// ==========================================
// 错误码 (Error Code)
// ==========================================
// 序列化格式: kebab-case（结果契约中的 code 字段）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    // 文件级（致命，不开启事务）
    NoSheet,
    MultipleSheets,
    NotASpreadsheet,
    UnknownKind,

    // 表头级（致命，任何写入之前）
    MissingRequiredHeader,

    // 行级（可恢复，跳过该行）
    RowMissingKey,
    InvalidRow,

    // 运行级（致命，整体回滚）
    UnexpectedFailure,

    // 提交后归档失败（数据已落库）
    ArchiveFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NoSheet => "no-sheet",
            ErrorCode::MultipleSheets => "multiple-sheets",
            ErrorCode::NotASpreadsheet => "not-a-spreadsheet",
            ErrorCode::UnknownKind => "unknown-kind",
            ErrorCode::MissingRequiredHeader => "missing-required-header",
            ErrorCode::RowMissingKey => "row-missing-key",
            ErrorCode::InvalidRow => "invalid-row",
            ErrorCode::UnexpectedFailure => "unexpected-failure",
            ErrorCode::ArchiveFailed => "archive-failed",
        }
    }

    /// 是否为行级错误（不终止本次导入）
    pub fn is_row_level(&self) -> bool {
        matches!(self, ErrorCode::RowMissingKey | ErrorCode::InvalidRow)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
