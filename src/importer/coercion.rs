// ==========================================
// ERP 表格导入 - 类型转换
// ==========================================
// 职责: 原始单元格 → 文本 / 数值 / 布尔
// 约束: 转换永不报错，无法识别时交由调用方保持原值
// ==========================================

use crate::importer::table::SheetRow;

const TRUTHY: &[&str] = &["1", "true", "sim", "yes", "y", "x"];
const FALSY: &[&str] = &["0", "false", "não", "nao", "no", "n"];

/// 数值转换: 空值/缺失/无法解析 → `default`
///
/// 接受首尾空白，以及不含小数点时的单个小数逗号（"1,5" → 1.5）
pub fn coerce_number(raw: Option<&str>, default: f64) -> f64 {
    parse_number(raw).unwrap_or(default)
}

/// 数值解析，无法识别时返回 None
pub fn parse_number(raw: Option<&str>) -> Option<f64> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }

    let parsed = if !text.contains('.') && text.matches(',').count() == 1 {
        text.replace(',', ".").parse::<f64>()
    } else {
        text.parse::<f64>()
    };

    parsed.ok().filter(|v| v.is_finite())
}

/// 布尔转换: 可识别的真/假值，其余（含空值）返回 None
pub fn coerce_bool(raw: Option<&str>) -> Option<bool> {
    let token = raw?.trim().to_lowercase();
    if TRUTHY.contains(&token.as_str()) {
        Some(true)
    } else if FALSY.contains(&token.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// 文本转换: 缺失或空白 → None（调用方跳过赋值）
pub fn coerce_string(raw: Option<&str>) -> Option<String> {
    let text = raw?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

// ==========================================
// 字段描述符
// ==========================================

/// 字段类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
}

/// 转换后的单元格值
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Boolean(bool),
}

/// 列 → 类型 的显式声明
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub column: &'static str,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub const fn text(column: &'static str) -> Self {
        Self { column, kind: FieldKind::Text }
    }

    pub const fn number(column: &'static str) -> Self {
        Self { column, kind: FieldKind::Number }
    }

    pub const fn boolean(column: &'static str) -> Self {
        Self { column, kind: FieldKind::Boolean }
    }

    /// 从行中读取并转换
    ///
    /// # 返回
    /// - Some(value): 可赋值
    /// - None: 列缺失、为空或无法识别，保持原值
    pub fn read(&self, row: &SheetRow) -> Option<CellValue> {
        let raw = row.get(self.column);
        match self.kind {
            FieldKind::Text => coerce_string(raw).map(CellValue::Text),
            FieldKind::Number => parse_number(raw).map(CellValue::Number),
            FieldKind::Boolean => coerce_bool(raw).map(CellValue::Boolean),
        }
    }
}
