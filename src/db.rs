// ==========================================
// ERP 表格导入 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键级联依赖 foreign_keys）
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表（幂等）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启，否则 recipe_lines 不会级联删除
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS products (
            code TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            sale_name TEXT,
            unit TEXT,
            unit_price REAL NOT NULL DEFAULT 0,
            tax_rate REAL NOT NULL DEFAULT 0,
            markup REAL,
            active INTEGER NOT NULL DEFAULT 1,
            discontinued INTEGER NOT NULL DEFAULT 0,
            family TEXT,
            sub_family TEXT,
            barcode TEXT,
            article_type TEXT,
            location TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS recipe_headers (
            code TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            family_label TEXT,
            portions REAL NOT NULL DEFAULT 1,
            total_cost REAL NOT NULL DEFAULT 0,
            location TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS recipe_lines (
            recipe_code TEXT NOT NULL REFERENCES recipe_headers(code) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            component_code TEXT NOT NULL,
            component_name TEXT,
            quantity REAL NOT NULL CHECK (quantity >= 0),
            unit TEXT NOT NULL,
            unit_price REAL NOT NULL DEFAULT 0,
            line_cost REAL NOT NULL DEFAULT 0,
            PRIMARY KEY (recipe_code, component_code)
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_lines_position
            ON recipe_lines (recipe_code, position);

        CREATE TABLE IF NOT EXISTS price_entries (
            product_code TEXT NOT NULL,
            store TEXT NOT NULL,
            price_1 REAL NOT NULL DEFAULT 0,
            price_2 REAL NOT NULL DEFAULT 0,
            price_3 REAL NOT NULL DEFAULT 0,
            price_4 REAL NOT NULL DEFAULT 0,
            price_5 REAL NOT NULL DEFAULT 0,
            tax_rate_1 REAL NOT NULL DEFAULT 0,
            tax_rate_2 REAL NOT NULL DEFAULT 0,
            tax_exempt INTEGER NOT NULL DEFAULT 0,
            active INTEGER NOT NULL DEFAULT 1,
            sale_name TEXT,
            family TEXT,
            sub_family TEXT,
            PRIMARY KEY (product_code, store)
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
