// ==========================================
// ERP 表格导入 - 技术单（BOM）导入策略
// ==========================================
// 主键: produtocodigo（按首次出现顺序分组）
// 冲突策略: 整体替换（删除表头与全部明细 → 写入新表头与明细）
// 红线: 组件产品不存在时补建存根产品
// ==========================================

use crate::config::ImportSettings;
use crate::domain::{ErrorCode, ImportKind, ImportReport, Product, RecipeHeader, RecipeLine};
use crate::importer::coercion::{coerce_number, coerce_string, parse_number};
use crate::importer::cost_rollup::CostRollup;
use crate::importer::error::ImportResult;
use crate::importer::strategy::ImportStrategy;
use crate::importer::table::{SheetRow, SheetTable};
use crate::repository::RecordWriter;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

const DEFAULT_PORTIONS: f64 = 1.0;

/// 同一技术单的行集合
struct RecipeGroup<'t> {
    code: String,
    rows: Vec<&'t SheetRow>,
}

/// 按 produtocodigo 分组，保持首次出现顺序
///
/// 缺少 produtocodigo 的行记录 row-missing-key 诊断
fn group_rows<'t>(table: &'t SheetTable, report: &mut ImportReport) -> Vec<RecipeGroup<'t>> {
    let mut groups: Vec<RecipeGroup<'t>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in table.rows() {
        let code = match coerce_string(row.get("produtocodigo")) {
            Some(code) => code,
            None => {
                report.skip_row(
                    ErrorCode::RowMissingKey,
                    row.line,
                    "行缺少技术单编码 (produtocodigo)",
                );
                continue;
            }
        };

        match index.get(&code) {
            Some(&i) => groups[i].rows.push(row),
            None => {
                index.insert(code.clone(), groups.len());
                groups.push(RecipeGroup {
                    code,
                    rows: vec![row],
                });
            }
        }
    }

    groups
}

/// 行单位: unidade → unidademedida
fn row_unit(row: &SheetRow) -> Option<String> {
    coerce_string(row.get("unidade")).or_else(|| coerce_string(row.get("unidademedida")))
}

// ==========================================
// RecipeStrategy
// ==========================================
pub struct RecipeStrategy;

impl RecipeStrategy {
    /// 由分组首行构建表头（总成本在明细写入后回写）
    fn build_header(group: &RecipeGroup<'_>, settings: &ImportSettings) -> RecipeHeader {
        let first = group.rows.first().copied();
        let name = first
            .and_then(|r| coerce_string(r.get("produtonome")))
            .unwrap_or_else(|| group.code.clone());
        let family_label = first.and_then(|r| coerce_string(r.get("familiasubfamilia")));
        let portions = first
            .map(|r| coerce_number(r.get("porcoes"), DEFAULT_PORTIONS))
            .filter(|p| *p > 0.0)
            .unwrap_or(DEFAULT_PORTIONS);

        RecipeHeader {
            code: group.code.clone(),
            name,
            family_label,
            portions,
            total_cost: 0.0,
            location: settings.default_location.clone(),
        }
    }

    /// 查找组件产品，不存在时补建存根
    ///
    /// # 返回
    /// - (产品，是否新建)
    fn resolve_component(
        store: &dyn RecordWriter,
        code: &str,
        row: &SheetRow,
        unit_price: Option<f64>,
        settings: &ImportSettings,
    ) -> ImportResult<(Product, bool)> {
        if let Some(product) = store.find_product(code)? {
            return Ok((product, false));
        }

        let name = coerce_string(row.get("componentenome")).unwrap_or_else(|| code.to_string());
        let mut stub = Product::new(code, name, settings.default_location.as_str());
        stub.unit = Some(row_unit(row).unwrap_or_else(|| settings.default_component_unit.clone()));
        stub.unit_price = unit_price.unwrap_or(0.0);
        store.insert_product(&stub)?;

        debug!(component_code = %code, "补建组件产品");
        Ok((stub, true))
    }

    /// 替换单个技术单
    fn replace_recipe(
        store: &dyn RecordWriter,
        group: &RecipeGroup<'_>,
        settings: &ImportSettings,
        report: &mut ImportReport,
    ) -> ImportResult<()> {
        let existed = store.recipe_exists(&group.code)?;
        if existed {
            let removed = store.delete_recipe(&group.code)?;
            debug!(recipe_code = %group.code, removed_lines = removed, "删除旧技术单");
        }

        let header = Self::build_header(group, settings);
        store.insert_recipe_header(&header)?;

        let mut rollup = CostRollup::new();
        let mut seen_components: HashSet<String> = HashSet::new();

        for row in &group.rows {
            let component_code = match coerce_string(row.get("componentecodigo")) {
                Some(code) => code,
                None => {
                    report.skip_row(
                        ErrorCode::RowMissingKey,
                        row.line,
                        "行缺少组件编码 (componentecodigo)",
                    );
                    continue;
                }
            };

            let quantity = coerce_number(row.get("qtd"), 0.0);
            if quantity < 0.0 {
                report.skip_row(
                    ErrorCode::InvalidRow,
                    row.line,
                    format!("组件 {} 的用量为负数: {}", component_code, quantity),
                );
                continue;
            }

            if !seen_components.insert(component_code.clone()) {
                report.skip_row(
                    ErrorCode::InvalidRow,
                    row.line,
                    format!("组件 {} 在技术单 {} 中重复出现", component_code, group.code),
                );
                continue;
            }

            let row_price = parse_number(row.get("ppu"));
            let (component, created) =
                Self::resolve_component(store, &component_code, row, row_price, settings)?;
            if created {
                report.counts.components_created += 1;
            }

            let unit_price = row_price.unwrap_or(component.unit_price);
            let unit = row_unit(row)
                .or_else(|| component.unit.clone())
                .unwrap_or_else(|| settings.default_component_unit.clone());
            let cost = rollup.add_line(quantity, unit_price, parse_number(row.get("preco")));

            let line = RecipeLine {
                recipe_code: group.code.clone(),
                position: rollup.lines() as i64,
                component_code,
                component_name: coerce_string(row.get("componentenome")).or(Some(component.name)),
                quantity,
                unit,
                unit_price,
                line_cost: cost,
            };
            store.insert_recipe_line(&line)?;
            report.counts.lines += 1;
        }

        store.update_recipe_total_cost(&group.code, rollup.total())?;

        let check = rollup.check(settings.cost_tolerance);
        if !check.consistent {
            warn!(
                recipe_code = %group.code,
                registered = check.registered,
                computed = check.computed,
                difference = check.difference,
                "技术单成本与用量×单价汇总不一致"
            );
        }

        if existed {
            report.counts.updated += 1;
        } else {
            report.counts.created += 1;
        }
        Ok(())
    }
}

impl ImportStrategy for RecipeStrategy {
    fn kind(&self) -> ImportKind {
        ImportKind::Recipes
    }

    fn apply(
        &self,
        store: &dyn RecordWriter,
        table: &SheetTable,
        settings: &ImportSettings,
        report: &mut ImportReport,
    ) -> ImportResult<()> {
        let groups = group_rows(table, report);
        debug!(recipes = groups.len(), "技术单分组完成");

        for group in &groups {
            Self::replace_recipe(store, group, settings, report)?;
        }

        info!(
            created = report.counts.created,
            updated = report.counts.updated,
            lines = report.counts.lines,
            components_created = report.counts.components_created,
            "技术单导入完成"
        );
        Ok(())
    }
}
