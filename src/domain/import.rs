// ==========================================
// ERP 表格导入 - 导入结果模型
// ==========================================
// 用途: 导入接口返回值（结果契约）
// 约定: 调用方总能区分"未导入任何数据"与"部分行被跳过"
// ==========================================

use crate::domain::types::{ErrorCode, ImportKind, ImportStatus};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ==========================================
// ImportCounts - 计数
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportCounts {
    pub created: usize,            // 新建记录数
    pub updated: usize,            // 覆盖/合并记录数
    pub lines: usize,              // 技术单明细行数
    pub components_created: usize, // 技术单导入时补建的组件产品数
}

// ==========================================
// ImportDiagnostic - 诊断信息
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDiagnostic {
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>, // 表格行号（数据下标 + 2，含表头行）
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ImportDiagnostic {
    /// 行级诊断
    pub fn row(code: ErrorCode, row: usize, message: impl Into<String>) -> Self {
        Self {
            code,
            row: Some(row),
            message: message.into(),
            detail: None,
        }
    }

    /// 运行级诊断（不关联行）
    pub fn run(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            row: None,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ==========================================
// ImportReport - 策略执行期间累积的计数与诊断
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub counts: ImportCounts,
    pub diagnostics: Vec<ImportDiagnostic>,
}

impl ImportReport {
    pub fn skip_row(&mut self, code: ErrorCode, row: usize, message: impl Into<String>) {
        self.diagnostics.push(ImportDiagnostic::row(code, row, message));
    }
}

// ==========================================
// ImportOutcome - 单次导入的完整结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub batch_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ImportKind>,
    pub status: ImportStatus,
    pub counts: ImportCounts,
    pub errors: Vec<ImportDiagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_to: Option<PathBuf>,
    pub elapsed_ms: u64,
}

impl ImportOutcome {
    /// 失败结果（未提交任何数据，计数清零）
    pub fn failed(batch_id: String, kind: Option<ImportKind>, errors: Vec<ImportDiagnostic>) -> Self {
        Self {
            batch_id,
            kind,
            status: ImportStatus::Error,
            counts: ImportCounts::default(),
            errors,
            archived_to: None,
            elapsed_ms: 0,
        }
    }

    /// 成功结果（已提交，可能带行级诊断）
    pub fn succeeded(batch_id: String, kind: ImportKind, report: ImportReport) -> Self {
        Self {
            batch_id,
            kind: Some(kind),
            status: ImportStatus::Success,
            counts: report.counts,
            errors: report.diagnostics,
            archived_to: None,
            elapsed_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ImportStatus::Success
    }

    /// 行级诊断数量
    pub fn skipped_rows(&self) -> usize {
        self.errors.iter().filter(|e| e.code.is_row_level()).count()
    }
}
