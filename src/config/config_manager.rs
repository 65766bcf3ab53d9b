// ==========================================
// ERP 表格导入 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::config::settings::{DEFAULT_COMPONENT_UNIT, DEFAULT_LOCATION, HISTORY_DIR_NAME};
use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::DEFAULT_COST_TOLERANCE;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::header_normalizer::HeaderAliases;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

const APP_DIR_NAME: &str = "erp-import";
const DB_FILE_NAME: &str = "erp_import.db";

/// 数据库路径环境变量（优先于默认路径）
pub const DB_PATH_ENV: &str = "ERP_IMPORT_DB_PATH";

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const HISTORY_DIR: &str = "import.history_dir";
    pub const DEFAULT_LOCATION: &str = "import.default_location";
    pub const DEFAULT_COMPONENT_UNIT: &str = "import.default_component_unit";
    pub const COST_TOLERANCE: &str = "import.cost_tolerance";
    pub const HEADER_ALIASES: &str = "import.header_aliases";
}

/// 应用数据目录: <系统数据目录>/erp-import（取不到时退回当前目录）
fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// 默认数据库路径
///
/// # 优先级
/// 1. 环境变量 ERP_IMPORT_DB_PATH
/// 2. <数据目录>/erp-import/erp_import.db
pub fn default_db_path() -> PathBuf {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    app_data_dir().join(DB_FILE_NAME)
}

/// 默认归档目录
pub fn default_history_dir() -> PathBuf {
    app_data_dir().join(HISTORY_DIR_NAME)
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ImportResult<Self> {
        {
            let conn_guard = lock(&conn)?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            init_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        let conn = lock(&self.conn)?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(ImportError::ConfigReadError {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// 写入配置值（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> ImportResult<()> {
        let conn = lock(&self.conn)?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值（空白值视为未配置）
    fn get_config_or_default(&self, key: &str, default: &str) -> ImportResult<String> {
        Ok(self
            .get_config_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }
}

fn lock(conn: &Arc<Mutex<Connection>>) -> ImportResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))
}

// ==========================================
// ImportConfigReader 实现
// ==========================================
impl ImportConfigReader for ConfigManager {
    fn get_history_dir(&self) -> ImportResult<PathBuf> {
        Ok(match self.get_config_value(config_keys::HISTORY_DIR)? {
            Some(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
            _ => default_history_dir(),
        })
    }

    fn get_default_location(&self) -> ImportResult<String> {
        self.get_config_or_default(config_keys::DEFAULT_LOCATION, DEFAULT_LOCATION)
    }

    fn get_default_component_unit(&self) -> ImportResult<String> {
        self.get_config_or_default(config_keys::DEFAULT_COMPONENT_UNIT, DEFAULT_COMPONENT_UNIT)
    }

    fn get_cost_tolerance(&self) -> ImportResult<f64> {
        let value = self.get_config_or_default(
            config_keys::COST_TOLERANCE,
            &DEFAULT_COST_TOLERANCE.to_string(),
        )?;

        match value.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
            _ => Err(ImportError::ConfigValueError {
                key: config_keys::COST_TOLERANCE.to_string(),
                value,
                message: "应为非负数".to_string(),
            }),
        }
    }

    fn get_header_aliases(&self) -> ImportResult<HeaderAliases> {
        let defaults = HeaderAliases::default();
        let raw = match self.get_config_value(config_keys::HEADER_ALIASES)? {
            Some(v) if !v.trim().is_empty() => v,
            _ => return Ok(defaults),
        };

        let overrides: BTreeMap<String, String> =
            serde_json::from_str(&raw).map_err(|e| ImportError::ConfigValueError {
                key: config_keys::HEADER_ALIASES.to_string(),
                value: raw.clone(),
                message: e.to_string(),
            })?;

        Ok(defaults.merged_with(&HeaderAliases::from_pairs(overrides)))
    }
}
