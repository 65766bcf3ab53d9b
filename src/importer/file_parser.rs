// ==========================================
// ERP 表格导入 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xlsm/.xls/.xlsb) / OpenDocument (.ods) / CSV (.csv)
// 约束: 工作簿必须恰好包含 1 个工作表，CSV 视为单工作表
// 约定: 第一行为表头，单元格统一转为去首尾空白的文本
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::table::RawSheet;
use calamine::{open_workbook_auto, Data, Reader, Sheets};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;
use tracing::debug;

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

// ==========================================
// FileParser Trait
// ==========================================
pub trait FileParser {
    /// 读取文件中唯一的工作表
    fn parse_sheet(&self, file_path: &Path) -> ImportResult<RawSheet>;
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn lower_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_sheet(&self, file_path: &Path) -> ImportResult<RawSheet> {
        ensure_exists(file_path)?;

        let ext = lower_extension(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(|v| v.trim().to_string()).collect());
        }

        let name = file_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(RawSheet { name, headers, rows })
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_sheet(&self, file_path: &Path) -> ImportResult<RawSheet> {
        ensure_exists(file_path)?;

        let ext = lower_extension(file_path);
        if !WORKBOOK_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook: Sheets<_> = open_workbook_auto(file_path)?;

        let sheet_names = workbook.sheet_names();
        let sheet_name = match sheet_names.as_slice() {
            [] => return Err(ImportError::NoSheet),
            [only] => only.clone(),
            many => return Err(ImportError::MultipleSheets(many.len())),
        };

        let range = workbook.worksheet_range(&sheet_name)?;

        // 表头 = 区域第一行
        let mut range_rows = range.rows();
        let headers: Vec<String> = match range_rows.next() {
            Some(header_row) => header_row.iter().map(cell_to_string).collect(),
            None => Vec::new(),
        };

        let rows: Vec<Vec<String>> = range_rows
            .map(|data_row| data_row.iter().map(cell_to_string).collect())
            .collect();

        debug!(sheet = %sheet_name, columns = headers.len(), rows = rows.len(), "工作表读取完成");

        Ok(RawSheet {
            name: sheet_name,
            headers,
            rows,
        })
    }
}

/// 单元格 → 文本（整数值浮点数不带小数部分，错误单元格视为空）
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_sheet(&self, file_path: &Path) -> ImportResult<RawSheet> {
        let ext = lower_extension(file_path);
        match ext.as_str() {
            "csv" => CsvParser.parse_sheet(file_path),
            e if WORKBOOK_EXTENSIONS.contains(&e) => ExcelParser.parse_sheet(file_path),
            _ => {
                ensure_exists(file_path)?;
                Err(ImportError::UnsupportedFormat(ext))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(temp_file, "{}", line).unwrap();
        }
        temp_file
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let temp_file = csv_file(&["Código,Produto,PPU", "P1,Oil,2.5", "P2,Salt,0.3"]);

        let sheet = CsvParser.parse_sheet(temp_file.path()).unwrap();

        assert_eq!(sheet.headers, vec!["Código", "Produto", "PPU"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0], vec!["P1", "Oil", "2.5"]);
    }

    #[test]
    fn test_csv_parser_keeps_blank_rows_for_numbering() {
        let temp_file = csv_file(&["Código,Produto", "P1,Oil", ",", "P2,Salt"]);
        let sheet = CsvParser.parse_sheet(temp_file.path()).unwrap();
        assert_eq!(sheet.rows.len(), 3);
    }

    #[test]
    fn test_file_not_found() {
        let result = UniversalFileParser.parse_sheet(Path::new("non_existent.xlsx"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let temp_file = Builder::new().suffix(".txt").tempfile().unwrap();
        let result = UniversalFileParser.parse_sheet(temp_file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_garbage_workbook_is_parse_error() {
        let mut temp_file = Builder::new().suffix(".xlsx").tempfile().unwrap();
        temp_file.write_all(b"definitely not a zip archive").unwrap();
        let result = UniversalFileParser.parse_sheet(temp_file.path());
        assert!(matches!(result, Err(ImportError::ExcelParseError(_))));
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&Data::Float(1001.0)), "1001");
        assert_eq!(cell_to_string(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::String(" kg ".into())), "kg");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }
}
