// ==========================================
// 导入管道集成测试
// ==========================================
// 测试目标: 文件 → 编排器 → SQLite 的完整流程
// ==========================================

mod test_helpers;

use erp_import::config::config_keys;
use erp_import::domain::{ErrorCode, ImportKind, ImportStatus, DEFAULT_COST_TOLERANCE};
use erp_import::importer::ImportOrchestrator;
use erp_import::logging;
use erp_import::repository::SqliteRecordStore;
use test_helpers::{
    write_csv, write_sheetless_xlsx, write_single_sheet_xlsx, write_xlsx, TestWorkspace,
};

fn orchestrator(
    ws: &TestWorkspace,
) -> ImportOrchestrator<SqliteRecordStore, erp_import::importer::HistoryArchiver> {
    ImportOrchestrator::from_db_path(&ws.db_path).expect("Failed to create orchestrator")
}

fn store(ws: &TestWorkspace) -> SqliteRecordStore {
    SqliteRecordStore::new(&ws.db_path).expect("Failed to open store")
}

// ==========================================
// 产品导入
// ==========================================

#[test]
fn test_products_merge_preserves_unspecified_fields() {
    logging::init_test();
    let ws = TestWorkspace::new().unwrap();

    let first = ws.path("produtos_1.xlsx");
    write_single_sheet_xlsx(
        &first,
        &[&["Código", "Produto", "Unidade", "PPU"], &["1001", "Oil", "L", "3.2"]],
    )
    .unwrap();
    let outcome = orchestrator(&ws).run(&first, ImportKind::Products);
    assert_eq!(outcome.status, ImportStatus::Success);
    assert_eq!(outcome.counts.created, 1);

    let second = ws.path("produtos_2.xlsx");
    write_single_sheet_xlsx(&second, &[&["Código", "Produto"], &["1001", "Olive Oil"]]).unwrap();
    let outcome = orchestrator(&ws).run(&second, ImportKind::Products);
    assert_eq!(outcome.counts.updated, 1);

    let product = store(&ws).get_product("1001").unwrap().unwrap();
    assert_eq!(product.name, "Olive Oil");
    assert_eq!(product.unit.as_deref(), Some("L"));
    assert_eq!(product.unit_price, 3.2);

    // 两个文件都已归档
    assert!(!first.exists());
    assert!(!second.exists());
    assert_eq!(ws.archived_files(), 2);
}

#[test]
fn test_row_level_resilience() {
    logging::init_test();
    let ws = TestWorkspace::new().unwrap();
    let file = ws.path("produtos.csv");
    write_csv(
        &file,
        &[
            "Codigo,Produto",
            "P1,A",
            "P2,B",
            "P3,C",
            ",Sem codigo",
            "P4,D",
            "P5,E",
        ],
    )
    .unwrap();

    let outcome = orchestrator(&ws).run(&file, ImportKind::Products);

    assert_eq!(outcome.status, ImportStatus::Success);
    assert_eq!(outcome.counts.created, 5);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].code, ErrorCode::RowMissingKey);
    assert_eq!(outcome.errors[0].row, Some(5));
    assert_eq!(store(&ws).count_products().unwrap(), 5);
}

#[test]
fn test_boolean_tokens_on_existing_products() {
    logging::init_test();
    let ws = TestWorkspace::new().unwrap();

    let seed = ws.path("seed.csv");
    write_csv(
        &seed,
        &["Codigo,Produto,Ativo", "A,a,0", "B,b,0", "C,c,0", "D,d,1", "E,e,1", "F,f,1", "G,g,0"],
    )
    .unwrap();
    orchestrator(&ws).run(&seed, ImportKind::Products);

    let update = ws.path("update.csv");
    write_csv(
        &update,
        &["Codigo,Produto,Ativo", "A,a,sim", "B,b,Y", "C,c,1", "D,d,não", "E,e,N", "F,f,0", "G,g,"],
    )
    .unwrap();
    let outcome = orchestrator(&ws).run(&update, ImportKind::Products);
    assert!(outcome.is_success());

    let store = store(&ws);
    let active = |code: &str| store.get_product(code).unwrap().unwrap().active;
    assert!(active("A") && active("B") && active("C"));
    assert!(!active("D") && !active("E") && !active("F"));
    // 空值: 保持原值
    assert!(!active("G"));
}

// ==========================================
// 文件级与表头级错误
// ==========================================

#[test]
fn test_multiple_sheets_rejected() {
    logging::init_test();
    let ws = TestWorkspace::new().unwrap();
    let file = ws.path("produtos.xlsx");
    let rows: &[&[&str]] = &[&["Codigo", "Produto"], &["P1", "Oil"]];
    write_xlsx(&file, &[("Produtos", rows), ("Notas", rows)]).unwrap();

    let outcome = orchestrator(&ws).run(&file, ImportKind::Products);

    assert_eq!(outcome.status, ImportStatus::Error);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].code, ErrorCode::MultipleSheets);
    assert!(file.exists());
    assert_eq!(store(&ws).count_products().unwrap(), 0);
}

#[test]
fn test_workbook_without_sheets_rejected() {
    logging::init_test();
    let ws = TestWorkspace::new().unwrap();
    let file = ws.path("produtos.xlsx");
    write_sheetless_xlsx(&file).unwrap();

    let outcome = orchestrator(&ws).run(&file, ImportKind::Products);

    assert_eq!(outcome.status, ImportStatus::Error);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].code, ErrorCode::NoSheet);
    assert!(outcome.archived_to.is_none());
    assert!(file.exists());
    assert_eq!(ws.archived_files(), 0);
    assert_eq!(store(&ws).count_products().unwrap(), 0);
}

#[test]
fn test_schema_failure_is_all_or_nothing() {
    logging::init_test();
    let ws = TestWorkspace::new().unwrap();
    let file = ws.path("produtos.xlsx");
    write_single_sheet_xlsx(&file, &[&["Código", "Família"], &["P1", "Mercearia"]]).unwrap();

    let outcome = orchestrator(&ws).run(&file, ImportKind::Products);

    assert_eq!(outcome.status, ImportStatus::Error);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].code, ErrorCode::MissingRequiredHeader);
    assert!(outcome.errors[0].message.contains("nomeprodvenda"));
    assert_eq!(outcome.counts.created, 0);
    assert_eq!(store(&ws).count_products().unwrap(), 0);
    assert_eq!(ws.archived_files(), 0);
}

#[test]
fn test_not_a_spreadsheet() {
    logging::init_test();
    let ws = TestWorkspace::new().unwrap();
    let file = ws.path("produtos.xlsx");
    std::fs::write(&file, b"PK\x03\x04 truncated").unwrap();

    let outcome = orchestrator(&ws).run(&file, ImportKind::Products);
    assert_eq!(outcome.errors[0].code, ErrorCode::NotASpreadsheet);

    let missing = orchestrator(&ws).run(ws.path("nao_existe.xlsx"), ImportKind::Products);
    assert_eq!(missing.errors[0].code, ErrorCode::NotASpreadsheet);
}

#[test]
fn test_unknown_kind_name() {
    logging::init_test();
    let ws = TestWorkspace::new().unwrap();
    let file = ws.path("x.csv");
    write_csv(&file, &["Codigo,Produto", "P1,A"]).unwrap();

    let outcome = orchestrator(&ws).run_named(&file, "alergenios");
    assert_eq!(outcome.status, ImportStatus::Error);
    assert_eq!(outcome.errors[0].code, ErrorCode::UnknownKind);

    // 葡语名称可用
    let outcome = orchestrator(&ws).run_named(&file, "produtos");
    assert!(outcome.is_success());
}

// ==========================================
// 技术单导入
// ==========================================

const RECIPE_HEADERS: &[&str] = &[
    "Produto Código",
    "Produto Nome",
    "Família/Subfamília",
    "Componente Código",
    "Componente Nome",
    "Qtd",
    "Unidade",
    "PPU",
];

#[test]
fn test_recipe_cost_rollup() {
    logging::init_test();
    let ws = TestWorkspace::new().unwrap();
    let file = ws.path("fichas.xlsx");
    write_single_sheet_xlsx(
        &file,
        &[
            RECIPE_HEADERS,
            &["R1", "Sopa", "Cozinha/Sopas", "C1", "Cenoura", "2", "kg", "1.5"],
            &["R1", "Sopa", "Cozinha/Sopas", "C2", "Cebola", "1", "kg", "3.0"],
        ],
    )
    .unwrap();

    let outcome = orchestrator(&ws).run(&file, ImportKind::Recipes);

    assert!(outcome.is_success());
    assert_eq!(outcome.counts.created, 1);
    assert_eq!(outcome.counts.lines, 2);
    assert_eq!(outcome.counts.components_created, 2);

    let store = store(&ws);
    let sheet = store.load_recipe_sheet("R1").unwrap().unwrap();
    assert_eq!(sheet.header.total_cost, 6.0);
    assert_eq!(sheet.header.family_label.as_deref(), Some("Cozinha/Sopas"));
    assert!(sheet.cost_check(DEFAULT_COST_TOLERANCE).consistent);

    // 补建的组件产品
    let carrot = store.get_product("C1").unwrap().unwrap();
    assert_eq!(carrot.name, "Cenoura");
    assert_eq!(carrot.unit.as_deref(), Some("kg"));
    assert_eq!(carrot.unit_price, 1.5);
}

#[test]
fn test_recipe_replace_on_conflict() {
    logging::init_test();
    let ws = TestWorkspace::new().unwrap();

    let first = ws.path("fichas_1.csv");
    write_csv(
        &first,
        &[
            "ProdutoCodigo,ComponenteCodigo,Qtd,Unidade,PPU",
            "R1,C1,1,g,1",
            "R1,C2,1,g,1",
            "R1,C3,1,g,1",
        ],
    )
    .unwrap();
    orchestrator(&ws).run(&first, ImportKind::Recipes);

    let second = ws.path("fichas_2.csv");
    write_csv(
        &second,
        &["ProdutoCodigo,ComponenteCodigo,Qtd,Unidade,PPU", "R1,C1,2,g,1", "R1,C4,1,g,2"],
    )
    .unwrap();
    let outcome = orchestrator(&ws).run(&second, ImportKind::Recipes);
    assert_eq!(outcome.counts.updated, 1);
    assert_eq!(outcome.counts.components_created, 1);

    let store = store(&ws);
    let sheet = store.load_recipe_sheet("R1").unwrap().unwrap();
    let codes: Vec<&str> = sheet.lines.iter().map(|l| l.component_code.as_str()).collect();
    assert_eq!(codes, vec!["C1", "C4"]);
    assert_eq!(sheet.header.total_cost, 4.0);
    assert_eq!(store.count_recipe_lines().unwrap(), 2);
}

#[test]
fn test_recipe_missing_headers() {
    logging::init_test();
    let ws = TestWorkspace::new().unwrap();
    let file = ws.path("fichas.csv");
    write_csv(&file, &["ProdutoCodigo,Qtd", "R1,1"]).unwrap();

    let outcome = orchestrator(&ws).run(&file, ImportKind::Recipes);

    let missing: Vec<&str> = outcome
        .errors
        .iter()
        .map(|e| e.message.rsplit(' ').next().unwrap_or(""))
        .collect();
    assert_eq!(missing, vec!["componentecodigo", "unidade"]);
    assert_eq!(store(&ws).count_recipes().unwrap(), 0);
}

// ==========================================
// 价格导入
// ==========================================

#[test]
fn test_prices_create_and_merge() {
    logging::init_test();
    let ws = TestWorkspace::new().unwrap();

    let first = ws.path("precos_1.xlsx");
    write_single_sheet_xlsx(
        &first,
        &[
            &["Código", "Loja", "Preço 1", "Preço 2", "IVA1", "Isenção IVA", "Nome Prod Venda"],
            &["P1", "L01", "1.5", "1.8", "13", "não", "Pão"],
            &["P1", "L02", "1.6", "", "13", "", ""],
        ],
    )
    .unwrap();
    let outcome = orchestrator(&ws).run(&first, ImportKind::Prices);
    assert_eq!(outcome.counts.created, 2);

    let second = ws.path("precos_2.csv");
    write_csv(&second, &["Codigo,Loja,Preco1,Ativo", "P1,L01,1.7,não"]).unwrap();
    let outcome = orchestrator(&ws).run(&second, ImportKind::Prices);
    assert_eq!(outcome.counts.updated, 1);

    let entry = store(&ws).get_price("P1", "L01").unwrap().unwrap();
    assert_eq!(entry.prices[0], 1.7);
    assert_eq!(entry.prices[1], 1.8);
    assert_eq!(entry.tax_rate_1, 13.0);
    assert_eq!(entry.sale_name.as_deref(), Some("Pão"));
    assert!(!entry.tax_exempt);
    assert!(!entry.active);
}

// ==========================================
// 配置
// ==========================================

#[test]
fn test_configured_aliases_and_location() {
    logging::init_test();
    let ws = TestWorkspace::new().unwrap();
    let config = ws.config();
    config
        .set_config_value(config_keys::HEADER_ALIASES, r#"{"Ref Artigo": "codigo", "Descricao": "produto"}"#)
        .unwrap();
    config.set_config_value(config_keys::DEFAULT_LOCATION, "ES").unwrap();

    let file = ws.path("artigos.csv");
    write_csv(&file, &["Ref Artigo,Descrição", "X1,Azeite"]).unwrap();

    let outcome = orchestrator(&ws).run(&file, ImportKind::Products);
    assert!(outcome.is_success(), "{:?}", outcome.errors);

    let product = store(&ws).get_product("X1").unwrap().unwrap();
    assert_eq!(product.name, "Azeite");
    assert_eq!(product.location, "ES");
}

#[test]
fn test_outcome_metadata() {
    logging::init_test();
    let ws = TestWorkspace::new().unwrap();
    let file = ws.path("produtos.csv");
    write_csv(&file, &["Codigo,Produto", "P1,A"]).unwrap();

    let outcome = orchestrator(&ws).run(&file, ImportKind::Products);

    assert_eq!(outcome.kind, Some(ImportKind::Products));
    assert_eq!(outcome.batch_id.len(), 36);
    let archived = outcome.archived_to.clone().unwrap();
    assert!(archived.starts_with(ws.history_dir()));
    assert!(archived.to_string_lossy().ends_with("_produtos.csv"));

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["counts"]["created"], 1);
    assert!(json["errors"].as_array().unwrap().is_empty());
}
