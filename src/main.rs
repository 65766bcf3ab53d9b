// ==========================================
// ERP 表格导入 - 命令行入口
// ==========================================
// 用法:
//   erp-import import --kind produtos [--db PATH] FILE
//   erp-import recipe [--db PATH] CODE
// 输出: 结果以 JSON 写入 stdout，日志写入 stderr
// ==========================================

use anyhow::Context;
use clap::{Parser, Subcommand};
use erp_import::api::ImportApi;
use erp_import::config::default_db_path;
use erp_import::logging;
use std::path::PathBuf;
use std::process::ExitCode;

/// 导入结果为 error 时的退出码
const EXIT_IMPORT_FAILED: u8 = 1;

#[derive(Parser)]
#[command(name = "erp-import")]
#[command(about = "Import ERP spreadsheet exports (products, recipes, store prices) into SQLite")]
#[command(version)]
struct Cli {
    /// SQLite database path
    #[arg(long, global = true, env = "ERP_IMPORT_DB_PATH")]
    db: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import one single-sheet spreadsheet (.xlsx/.xls/.xlsm/.ods/.csv)
    Import {
        /// products | recipes | prices (produtos | fichas | precos)
        #[arg(long, short = 'k')]
        kind: String,

        /// Spreadsheet file; moved to the history directory on success
        file: PathBuf,
    },

    /// Show a recipe with its cost consistency check
    Recipe {
        /// Recipe code
        code: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.log_json);

    let db_path = cli.db.unwrap_or_else(default_db_path);
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("无法创建数据库目录: {}", parent.display()))?;
    }
    tracing::info!(db_path = %db_path.display(), version = erp_import::VERSION, "使用数据库");

    let api = ImportApi::new(db_path.to_string_lossy().to_string());

    match cli.command {
        Commands::Import { kind, file } => {
            let outcome = api
                .import_file_named(file, &kind)
                .await
                .context("导入执行失败")?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);

            if outcome.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(EXIT_IMPORT_FAILED))
            }
        }
        Commands::Recipe { code } => {
            let response = api.recipe_sheet(&code).await.context("技术单查询失败")?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
