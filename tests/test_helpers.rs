// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、临时工作目录、.xlsx / .csv 测试样例生成
// ==========================================

#![allow(dead_code)]

use erp_import::config::{config_keys, ConfigManager};
use erp_import::db::{init_schema, open_sqlite_connection};
use rust_xlsxwriter::Workbook;
use std::error::Error;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 导入测试工作区: 临时数据库 + 输入目录 + 归档目录
pub struct TestWorkspace {
    pub dir: TempDir,
    pub db_file: NamedTempFile,
    pub db_path: String,
}

impl TestWorkspace {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let dir = TempDir::new()?;
        let (db_file, db_path) = create_test_db()?;

        // 归档目录指向临时目录，避免写入用户数据目录
        let config = ConfigManager::new(&db_path)?;
        config.set_config_value(
            config_keys::HISTORY_DIR,
            dir.path().join("history").to_str().unwrap(),
        )?;

        Ok(Self {
            dir,
            db_file,
            db_path,
        })
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dir.path().join(file_name)
    }

    pub fn history_dir(&self) -> PathBuf {
        self.dir.path().join("history")
    }

    /// 归档目录中的文件数
    pub fn archived_files(&self) -> usize {
        std::fs::read_dir(self.history_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    pub fn config(&self) -> ConfigManager {
        ConfigManager::new(&self.db_path).unwrap()
    }
}

/// 写入 CSV 样例
pub fn write_csv(path: &Path, lines: &[&str]) -> Result<(), Box<dyn Error>> {
    let mut file = File::create(path)?;
    for line in lines {
        writeln!(file, "{}", line)?;
    }
    Ok(())
}

/// 写入 .xlsx 样例（每个元素一个工作表，首行为表头）
///
/// 可解析为数字的单元格按数字写入，模拟 ERP 导出的数值列
pub fn write_xlsx(path: &Path, sheets: &[(&str, &[&[&str]])]) -> Result<(), Box<dyn Error>> {
    let mut workbook = Workbook::new();

    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name)?;

        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let (row_num, col_num) = (r as u32, c as u16);
                match value.parse::<f64>() {
                    Ok(n) if r > 0 => {
                        worksheet.write_number(row_num, col_num, n)?;
                    }
                    _ => {
                        worksheet.write_string(row_num, col_num, *value)?;
                    }
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// 写入单工作表 .xlsx 样例
pub fn write_single_sheet_xlsx(path: &Path, rows: &[&[&str]]) -> Result<(), Box<dyn Error>> {
    write_xlsx(path, &[("Sheet1", rows)])
}

/// 写入不含任何工作表的 .xlsx（rust_xlsxwriter 无法生成此类文件）
pub fn write_sheetless_xlsx(path: &Path) -> Result<(), Box<dyn Error>> {
    const PARTS: [(&str, &str); 4] = [
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/></Types>"#,
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#,
        ),
        (
            "xl/workbook.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets></sheets></workbook>"#,
        ),
    ];

    let mut zip = ZipWriter::new(File::create(path)?);
    for (name, content) in PARTS {
        zip.start_file(name, SimpleFileOptions::default())?;
        zip.write_all(content.as_bytes())?;
    }
    zip.finish()?;
    Ok(())
}
