// ==========================================
// ERP 表格导入 - 导入编排器
// ==========================================
// 流程: 解析 → 表头归一化 → 表头校验 → 开启事务 → 策略执行 → 提交 → 归档
// 红线: 文件级/表头级错误在开启事务前返回，存储不受影响
// 红线: 策略执行失败整体回滚，只产生一条 unexpected-failure 诊断
// 红线: 归档失败不撤销已提交的导入
// ==========================================

use crate::config::{ConfigManager, ImportConfigReader, ImportSettings};
use crate::domain::{ErrorCode, ImportDiagnostic, ImportKind, ImportOutcome, ImportReport};
use crate::importer::archive::{Archiver, HistoryArchiver};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{FileParser, UniversalFileParser};
use crate::importer::header_normalizer::HeaderNormalizer;
use crate::importer::schema_validator::validate_headers;
use crate::importer::strategy::{strategy_for, ImportStrategy};
use crate::importer::table::SheetTable;
use crate::repository::{RecordStore, SqliteRecordStore, StoreTransaction};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ImportOrchestrator - 导入编排器
// ==========================================
pub struct ImportOrchestrator<S, A>
where
    S: RecordStore,
    A: Archiver,
{
    // 数据访问层
    store: S,

    // 归档
    archiver: A,

    // 配置快照
    settings: ImportSettings,

    // 文件解析
    file_parser: Box<dyn FileParser + Send>,
}

impl ImportOrchestrator<SqliteRecordStore, HistoryArchiver> {
    /// 基于 SQLite 数据库路径组装编排器（配置从 config_kv 读取）
    pub fn from_db_path(db_path: &str) -> ImportResult<Self> {
        let settings = ConfigManager::new(db_path)?.load_settings()?;
        let store = SqliteRecordStore::new(db_path)?;
        let archiver = HistoryArchiver::new(settings.history_dir.clone());
        Ok(Self::new(store, archiver, settings))
    }
}

impl<S, A> ImportOrchestrator<S, A>
where
    S: RecordStore,
    A: Archiver,
{
    /// 创建新的编排器
    ///
    /// # 参数
    /// - store: 记录存储
    /// - archiver: 归档器
    /// - settings: 配置快照
    pub fn new(store: S, archiver: A, settings: ImportSettings) -> Self {
        Self {
            store,
            archiver,
            settings,
            file_parser: Box::new(UniversalFileParser),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 按导入类型名称执行（名称无法识别时返回 unknown-kind）
    pub fn run_named<P: AsRef<Path>>(&mut self, file_path: P, kind_name: &str) -> ImportOutcome {
        match kind_name.parse::<ImportKind>() {
            Ok(kind) => self.run(file_path, kind),
            Err(_) => {
                warn!(kind = %kind_name, "未知的导入类型");
                let e = ImportError::UnknownKind(kind_name.to_string());
                ImportOutcome::failed(
                    Uuid::new_v4().to_string(),
                    None,
                    vec![ImportDiagnostic::run(e.code(), e.to_string())],
                )
            }
        }
    }

    /// 执行一次导入
    ///
    /// # 返回
    /// - ImportOutcome: 永远返回结果对象，错误体现在 status/errors 中
    #[instrument(skip_all, fields(kind = %kind, batch_id = tracing::field::Empty))]
    pub fn run<P: AsRef<Path>>(&mut self, file_path: P, kind: ImportKind) -> ImportOutcome {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());

        let path = file_path.as_ref();
        info!(file_path = %path.display(), "开始导入");

        let mut outcome = self.execute(path, kind, &batch_id);
        outcome.elapsed_ms = start_time.elapsed().as_millis() as u64;

        info!(
            status = %outcome.status,
            created = outcome.counts.created,
            updated = outcome.counts.updated,
            lines = outcome.counts.lines,
            diagnostics = outcome.errors.len(),
            elapsed_ms = outcome.elapsed_ms,
            "导入结束"
        );
        outcome
    }

    fn execute(&mut self, path: &Path, kind: ImportKind, batch_id: &str) -> ImportOutcome {
        // === 步骤 1: 读取唯一工作表 ===
        let raw = match self.file_parser.parse_sheet(path) {
            Ok(raw) => raw,
            Err(e) => {
                error!(error = %e, "文件读取失败");
                return ImportOutcome::failed(
                    batch_id.to_string(),
                    Some(kind),
                    vec![ImportDiagnostic::run(e.code(), e.to_string())],
                );
            }
        };

        // === 步骤 2: 表头归一化 ===
        let normalizer = HeaderNormalizer::new(self.settings.header_aliases.clone());
        let table = SheetTable::from_raw(&raw, &normalizer);
        debug!(sheet = %raw.name, rows = table.len(), columns = ?table.columns(), "表头归一化完成");

        // === 步骤 3: 表头校验 ===
        let strategy = strategy_for(kind);
        let missing = validate_headers(table.columns(), strategy.required_headers());
        if !missing.is_empty() {
            let errors: Vec<ImportDiagnostic> = missing
                .into_iter()
                .map(|m| {
                    let e = ImportError::MissingRequiredHeader(m.representative);
                    ImportDiagnostic::run(e.code(), e.to_string())
                        .with_detail(m.alternatives.join(" | "))
                })
                .collect();
            warn!(missing = errors.len(), "表头校验失败");
            return ImportOutcome::failed(batch_id.to_string(), Some(kind), errors);
        }

        // === 步骤 4: 事务内执行策略 ===
        let report = match self.apply_in_transaction(&*strategy, &table) {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "导入失败，事务已回滚");
                return ImportOutcome::failed(
                    batch_id.to_string(),
                    Some(kind),
                    vec![ImportDiagnostic::run(ErrorCode::UnexpectedFailure, e.to_string())],
                );
            }
        };

        // === 步骤 5: 归档 ===
        let mut outcome = ImportOutcome::succeeded(batch_id.to_string(), kind, report);
        match self.archiver.archive(path) {
            Ok(target) => outcome.archived_to = Some(target),
            Err(e) => {
                warn!(error = %e, "归档失败（导入已提交）");
                outcome
                    .errors
                    .push(ImportDiagnostic::run(ErrorCode::ArchiveFailed, e.to_string()));
            }
        }
        outcome
    }

    fn apply_in_transaction(
        &mut self,
        strategy: &dyn ImportStrategy,
        table: &SheetTable,
    ) -> ImportResult<ImportReport> {
        let tx = self.store.begin()?;
        let mut report = ImportReport::default();

        match strategy.apply(&tx, table, &self.settings, &mut report) {
            Ok(()) => {
                tx.commit()?;
                Ok(report)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    error!(error = %rollback_err, "事务回滚失败");
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ImportStatus;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::{Builder, TempDir};

    struct FailingArchiver;

    impl Archiver for FailingArchiver {
        fn archive(&self, _source: &Path) -> ImportResult<PathBuf> {
            Err(ImportError::ArchiveError("只读文件系统".to_string()))
        }
    }

    fn csv_in(dir: &TempDir, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    fn orchestrator(dir: &TempDir) -> ImportOrchestrator<SqliteRecordStore, HistoryArchiver> {
        let settings = ImportSettings::default().with_history_dir(dir.path().join("history"));
        ImportOrchestrator::new(
            SqliteRecordStore::open_in_memory().unwrap(),
            HistoryArchiver::new(settings.history_dir.clone()),
            settings,
        )
    }

    #[test]
    fn test_success_commits_and_archives() {
        let dir = TempDir::new().unwrap();
        let file = csv_in(&dir, "produtos.csv", &["Código,Produto", "P1,Oil", "P2,Salt"]);
        let mut orch = orchestrator(&dir);

        let outcome = orch.run(&file, ImportKind::Products);

        assert_eq!(outcome.status, ImportStatus::Success);
        assert_eq!(outcome.counts.created, 2);
        assert!(outcome.errors.is_empty());
        assert!(!file.exists());
        assert!(outcome.archived_to.as_ref().unwrap().exists());
        assert_eq!(orch.store().count_products().unwrap(), 2);
    }

    #[test]
    fn test_missing_header_leaves_store_untouched() {
        let dir = TempDir::new().unwrap();
        let file = csv_in(&dir, "fichas.csv", &["Qtd,Unidade", "1,g"]);
        let mut orch = orchestrator(&dir);

        let outcome = orch.run(&file, ImportKind::Recipes);

        assert_eq!(outcome.status, ImportStatus::Error);
        assert_eq!(outcome.errors.len(), 2);
        assert!(outcome
            .errors
            .iter()
            .all(|e| e.code == ErrorCode::MissingRequiredHeader));
        let messages: Vec<&str> = outcome.errors.iter().map(|e| e.message.as_str()).collect();
        assert!(messages.contains(&"缺少必需表头: produtocodigo"));
        assert!(messages.contains(&"缺少必需表头: componentecodigo"));
        assert!(file.exists());
        assert_eq!(orch.store().count_recipes().unwrap(), 0);
    }

    #[test]
    fn test_unknown_kind_name() {
        let dir = TempDir::new().unwrap();
        let file = csv_in(&dir, "x.csv", &["Codigo", "P1"]);
        let mut orch = orchestrator(&dir);

        let outcome = orch.run_named(&file, "alergenios");
        assert_eq!(outcome.errors[0].code, ErrorCode::UnknownKind);
        assert_eq!(outcome.errors[0].message, "未知的导入类型: alergenios");
        assert!(outcome.kind.is_none());
        assert!(file.exists());
    }

    #[test]
    fn test_not_a_spreadsheet() {
        let mut bad = Builder::new().suffix(".xlsx").tempfile().unwrap();
        bad.write_all(b"garbage").unwrap();
        let dir = TempDir::new().unwrap();
        let mut orch = orchestrator(&dir);

        let outcome = orch.run(bad.path(), ImportKind::Products);
        assert_eq!(outcome.errors[0].code, ErrorCode::NotASpreadsheet);
    }

    #[test]
    fn test_archive_failure_keeps_success() {
        let dir = TempDir::new().unwrap();
        let file = csv_in(&dir, "precos.csv", &["Codigo,Loja,Preco1", "P1,L01,2"]);
        let settings = ImportSettings::default();
        let mut orch = ImportOrchestrator::new(
            SqliteRecordStore::open_in_memory().unwrap(),
            FailingArchiver,
            settings,
        );

        let outcome = orch.run(&file, ImportKind::Prices);

        assert!(outcome.is_success());
        assert_eq!(outcome.counts.created, 1);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].code, ErrorCode::ArchiveFailed);
        assert!(outcome.archived_to.is_none());
        assert_eq!(orch.store().count_prices().unwrap(), 1);
    }

    #[test]
    fn test_store_failure_rolls_back_everything() {
        let dir = TempDir::new().unwrap();
        let file = csv_in(&dir, "produtos.csv", &["Codigo,Produto", "P1,Oil", "P2,Salt"]);
        let mut orch = orchestrator(&dir);
        orch.store()
            .connection()
            .execute_batch(
                "CREATE TRIGGER reject_p2 BEFORE INSERT ON products WHEN NEW.code = 'P2'
                 BEGIN SELECT RAISE(ABORT, 'P2 rejeitado'); END;",
            )
            .unwrap();

        let outcome = orch.run(&file, ImportKind::Products);

        assert_eq!(outcome.status, ImportStatus::Error);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].code, ErrorCode::UnexpectedFailure);
        assert!(outcome.errors[0].message.contains("P2 rejeitado"));
        assert_eq!(orch.store().count_products().unwrap(), 0);
        assert!(file.exists());
    }
}
