// ==========================================
// ERP 表格导入 - 产品导入策略
// ==========================================
// 主键: codigo
// 冲突策略: 字段级合并（表中不存在或为空的列保留原值）
// ==========================================

use crate::config::ImportSettings;
use crate::domain::{ErrorCode, ImportKind, ImportReport, Product};
use crate::importer::coercion::{coerce_string, CellValue, FieldDescriptor};
use crate::importer::error::ImportResult;
use crate::importer::strategy::ImportStrategy;
use crate::importer::table::{SheetRow, SheetTable};
use crate::repository::RecordWriter;
use chrono::Utc;
use tracing::{debug, info};

/// 单价列优先级（按列是否存在选择，而非按单元格是否为空）
const UNIT_PRICE_COLUMNS: [&str; 3] = ["ppu", "pcu", "pcm"];

// ==========================================
// 产品可合并字段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProductField {
    SaleName,
    Unit,
    Family,
    SubFamily,
    Barcode,
    ArticleType,
    Markup,
    TaxRate,
    Active,
    Discontinued,
}

impl ProductField {
    const MERGE_ORDER: [ProductField; 10] = [
        ProductField::SaleName,
        ProductField::Unit,
        ProductField::Family,
        ProductField::SubFamily,
        ProductField::Barcode,
        ProductField::ArticleType,
        ProductField::Markup,
        ProductField::TaxRate,
        ProductField::Active,
        ProductField::Discontinued,
    ];

    const fn descriptor(self) -> FieldDescriptor {
        match self {
            ProductField::SaleName => FieldDescriptor::text("nomeprodvenda"),
            ProductField::Unit => FieldDescriptor::text("unidademedida"),
            ProductField::Family => FieldDescriptor::text("familia"),
            ProductField::SubFamily => FieldDescriptor::text("subfamilia"),
            ProductField::Barcode => FieldDescriptor::text("codbarras"),
            ProductField::ArticleType => FieldDescriptor::text("tipoartigo"),
            ProductField::Markup => FieldDescriptor::number("markup"),
            ProductField::TaxRate => FieldDescriptor::number("iva1"),
            ProductField::Active => FieldDescriptor::boolean("ativo"),
            ProductField::Discontinued => FieldDescriptor::boolean("descontinuado"),
        }
    }

    fn assign(self, product: &mut Product, value: CellValue) {
        match (self, value) {
            (ProductField::SaleName, CellValue::Text(v)) => product.sale_name = Some(v),
            (ProductField::Unit, CellValue::Text(v)) => product.unit = Some(v),
            (ProductField::Family, CellValue::Text(v)) => product.family = Some(v),
            (ProductField::SubFamily, CellValue::Text(v)) => product.sub_family = Some(v),
            (ProductField::Barcode, CellValue::Text(v)) => product.barcode = Some(v),
            (ProductField::ArticleType, CellValue::Text(v)) => product.article_type = Some(v),
            (ProductField::Markup, CellValue::Number(v)) => product.markup = Some(v),
            (ProductField::TaxRate, CellValue::Number(v)) => product.tax_rate = v,
            (ProductField::Active, CellValue::Boolean(v)) => product.active = v,
            (ProductField::Discontinued, CellValue::Boolean(v)) => product.discontinued = v,
            _ => {}
        }
    }
}

// ==========================================
// ProductStrategy
// ==========================================
pub struct ProductStrategy;

impl ProductStrategy {
    /// 显示名称: produto → nomeprodvenda
    fn row_name(row: &SheetRow) -> Option<String> {
        coerce_string(row.get("produto")).or_else(|| coerce_string(row.get("nomeprodvenda")))
    }

    /// 将一行合并进产品
    fn merge_row(product: &mut Product, row: &SheetRow, price_column: Option<&'static str>) {
        if let Some(name) = Self::row_name(row) {
            product.name = name;
        }

        if let Some(column) = price_column {
            if let Some(CellValue::Number(v)) = FieldDescriptor::number(column).read(row) {
                product.unit_price = v;
            }
        }

        for field in ProductField::MERGE_ORDER {
            if let Some(value) = field.descriptor().read(row) {
                field.assign(product, value);
            }
        }

        // 停产即强制停用（含库中已有的停产标记）
        if product.discontinued {
            product.active = false;
        }

        product.updated_at = Utc::now();
    }
}

impl ImportStrategy for ProductStrategy {
    fn kind(&self) -> ImportKind {
        ImportKind::Products
    }

    fn apply(
        &self,
        store: &dyn RecordWriter,
        table: &SheetTable,
        settings: &ImportSettings,
        report: &mut ImportReport,
    ) -> ImportResult<()> {
        let price_column = UNIT_PRICE_COLUMNS
            .iter()
            .copied()
            .find(|c| table.has_column(c));
        debug!(price_column = ?price_column, "单价列选择");

        for row in table.rows() {
            let code = match coerce_string(row.get("codigo")) {
                Some(code) => code,
                None => {
                    report.skip_row(ErrorCode::RowMissingKey, row.line, "行缺少产品编码 (codigo)");
                    continue;
                }
            };

            match store.find_product(&code)? {
                Some(mut product) => {
                    Self::merge_row(&mut product, row, price_column);
                    store.update_product(&product)?;
                    report.counts.updated += 1;
                }
                None => {
                    let name = Self::row_name(row).unwrap_or_else(|| code.clone());
                    let mut product = Product::new(code, name, settings.default_location.as_str());
                    Self::merge_row(&mut product, row, price_column);
                    store.insert_product(&product)?;
                    report.counts.created += 1;
                }
            }
        }

        info!(
            created = report.counts.created,
            updated = report.counts.updated,
            skipped = report.diagnostics.len(),
            "产品导入完成"
        );
        Ok(())
    }
}
