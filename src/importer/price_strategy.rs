// ==========================================
// ERP 表格导入 - 门店价格导入策略
// ==========================================
// 主键: (codigo, loja)
// 冲突策略: 字段级合并（空值/缺失保留原值）
// ==========================================

use crate::config::ImportSettings;
use crate::domain::{ErrorCode, ImportKind, ImportReport, PriceEntry};
use crate::importer::coercion::{coerce_string, CellValue, FieldDescriptor};
use crate::importer::error::ImportResult;
use crate::importer::strategy::ImportStrategy;
use crate::importer::table::{SheetRow, SheetTable};
use crate::repository::RecordWriter;
use tracing::info;

// ==========================================
// 价格可合并字段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PriceField {
    Tier(usize), // preco1..preco5 → prices[0..5]
    TaxRate1,
    TaxRate2,
    TaxExempt,
    Active,
    SaleName,
    Family,
    SubFamily,
}

impl PriceField {
    const ALL: [PriceField; 12] = [
        PriceField::Tier(0),
        PriceField::Tier(1),
        PriceField::Tier(2),
        PriceField::Tier(3),
        PriceField::Tier(4),
        PriceField::TaxRate1,
        PriceField::TaxRate2,
        PriceField::TaxExempt,
        PriceField::Active,
        PriceField::SaleName,
        PriceField::Family,
        PriceField::SubFamily,
    ];

    const TIER_COLUMNS: [&'static str; 5] = ["preco1", "preco2", "preco3", "preco4", "preco5"];

    fn descriptor(self) -> FieldDescriptor {
        match self {
            PriceField::Tier(i) => FieldDescriptor::number(Self::TIER_COLUMNS[i]),
            PriceField::TaxRate1 => FieldDescriptor::number("iva1"),
            PriceField::TaxRate2 => FieldDescriptor::number("iva2"),
            PriceField::TaxExempt => FieldDescriptor::boolean("isencaoiva"),
            PriceField::Active => FieldDescriptor::boolean("ativo"),
            PriceField::SaleName => FieldDescriptor::text("nomeprodvenda"),
            PriceField::Family => FieldDescriptor::text("familia"),
            PriceField::SubFamily => FieldDescriptor::text("subfamilia"),
        }
    }

    fn assign(self, entry: &mut PriceEntry, value: CellValue) {
        match (self, value) {
            (PriceField::Tier(i), CellValue::Number(v)) => {
                if let Some(slot) = entry.prices.get_mut(i) {
                    *slot = v;
                }
            }
            (PriceField::TaxRate1, CellValue::Number(v)) => entry.tax_rate_1 = v,
            (PriceField::TaxRate2, CellValue::Number(v)) => entry.tax_rate_2 = v,
            (PriceField::TaxExempt, CellValue::Boolean(v)) => entry.tax_exempt = v,
            (PriceField::Active, CellValue::Boolean(v)) => entry.active = v,
            (PriceField::SaleName, CellValue::Text(v)) => entry.sale_name = Some(v),
            (PriceField::Family, CellValue::Text(v)) => entry.family = Some(v),
            (PriceField::SubFamily, CellValue::Text(v)) => entry.sub_family = Some(v),
            _ => {}
        }
    }
}

fn merge_row(entry: &mut PriceEntry, row: &SheetRow) {
    for field in PriceField::ALL {
        if let Some(value) = field.descriptor().read(row) {
            field.assign(entry, value);
        }
    }
}

// ==========================================
// PriceStrategy
// ==========================================
pub struct PriceStrategy;

impl ImportStrategy for PriceStrategy {
    fn kind(&self) -> ImportKind {
        ImportKind::Prices
    }

    fn apply(
        &self,
        store: &dyn RecordWriter,
        table: &SheetTable,
        _settings: &ImportSettings,
        report: &mut ImportReport,
    ) -> ImportResult<()> {
        for row in table.rows() {
            let key = coerce_string(row.get("codigo")).zip(coerce_string(row.get("loja")));
            let (code, store_code) = match key {
                Some(key) => key,
                None => {
                    report.skip_row(
                        ErrorCode::RowMissingKey,
                        row.line,
                        "行缺少产品编码或门店 (codigo, loja)",
                    );
                    continue;
                }
            };

            match store.find_price(&code, &store_code)? {
                Some(mut entry) => {
                    merge_row(&mut entry, row);
                    store.update_price(&entry)?;
                    report.counts.updated += 1;
                }
                None => {
                    let mut entry = PriceEntry::new(code, store_code);
                    merge_row(&mut entry, row);
                    store.insert_price(&entry)?;
                    report.counts.created += 1;
                }
            }
        }

        info!(
            created = report.counts.created,
            updated = report.counts.updated,
            skipped = report.diagnostics.len(),
            "价格导入完成"
        );
        Ok(())
    }
}
