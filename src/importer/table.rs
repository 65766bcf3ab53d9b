// ==========================================
// ERP 表格导入 - 表格数据结构
// ==========================================
// RawSheet: 解析器产出的原始工作表（原始表头 + 行）
// SheetTable: 表头归一化后的表，供校验与导入策略使用
// ==========================================

use crate::importer::header_normalizer::HeaderNormalizer;
use std::collections::{BTreeSet, HashMap};

/// 表格行号 = 数据下标 + 2（表头占第 1 行）
pub const FIRST_DATA_LINE: usize = 2;

/// 解析器输出: 原始工作表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// 归一化后的一行数据
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    pub line: usize, // 表格行号
    cells: HashMap<String, String>,
}

impl SheetRow {
    pub fn new(line: usize, cells: HashMap<String, String>) -> Self {
        Self { line, cells }
    }

    /// 读取单元格（列不存在时返回 None）
    pub fn get(&self, key: &str) -> Option<&str> {
        self.cells.get(key).map(String::as_str)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|v| v.trim().is_empty())
    }
}

/// 归一化后的工作表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetTable {
    columns: BTreeSet<String>,
    rows: Vec<SheetRow>,
}

impl SheetTable {
    /// 对原始工作表做表头归一化
    ///
    /// 规则:
    /// - 多个原始列归一化为同一键时，保留最左侧的列
    /// - 归一化为空键的列被忽略
    /// - 完全空白的行被跳过，但其余行的行号不变
    pub fn from_raw(raw: &RawSheet, normalizer: &HeaderNormalizer) -> Self {
        let keys = normalizer.normalize_all(&raw.headers);

        let mut columns = BTreeSet::new();
        let mut owners: Vec<Option<&str>> = Vec::with_capacity(keys.len());
        for key in &keys {
            if key.is_empty() || columns.contains(key) {
                owners.push(None);
            } else {
                columns.insert(key.clone());
                owners.push(Some(key.as_str()));
            }
        }

        let mut rows = Vec::with_capacity(raw.rows.len());
        for (idx, values) in raw.rows.iter().enumerate() {
            let mut cells = HashMap::new();
            for (col_idx, value) in values.iter().enumerate() {
                if let Some(Some(key)) = owners.get(col_idx) {
                    cells.insert((*key).to_string(), value.trim().to_string());
                }
            }
            let row = SheetRow::new(idx + FIRST_DATA_LINE, cells);
            if !row.is_blank() {
                rows.push(row);
            }
        }

        Self { columns, rows }
    }

    pub fn has_column(&self, key: &str) -> bool {
        self.columns.contains(key)
    }

    pub fn columns(&self) -> &BTreeSet<String> {
        &self.columns
    }

    pub fn rows(&self) -> &[SheetRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// 测试用: 由字面量构建归一化表（默认别名）
#[cfg(test)]
pub(crate) fn test_table(headers: &[&str], rows: &[&[&str]]) -> SheetTable {
    let raw = RawSheet {
        name: "Sheet1".to_string(),
        headers: headers.iter().map(|s| s.to_string()).collect(),
        rows: rows
            .iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect(),
    };
    SheetTable::from_raw(&raw, &HeaderNormalizer::default())
}
