// ==========================================
// ERP 表格导入 - 导入API
// ==========================================
// 职责: 封装导入与技术单查询功能
// 约束: 同步导入管道在阻塞线程池执行，管道内部不引入挂起点
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::domain::{CostCheck, ImportDiagnostic, ImportKind, ImportOutcome, RecipeSheet};
use crate::importer::{ImportError, ImportOrchestrator};
use crate::repository::SqliteRecordStore;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

/// 技术单查询响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeSheetResponse {
    /// 表头与明细
    pub sheet: RecipeSheet,
    /// 记录成本与明细汇总的一致性
    pub cost_check: CostCheck,
    /// 每份成本
    pub cost_per_portion: f64,
}

/// 导入API
pub struct ImportApi {
    db_path: String,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// 导入单个表格文件
    ///
    /// # 参数
    /// - file_path: 文件路径
    /// - kind: 导入类型
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 导入结果（业务失败与配置值错误体现在 status/errors 中）
    /// - Err(ApiError): 数据库无法打开
    pub async fn import_file(
        &self,
        file_path: impl Into<PathBuf>,
        kind: ImportKind,
    ) -> ApiResult<ImportOutcome> {
        let db_path = self.db_path.clone();
        let file_path = file_path.into();

        let outcome = tokio::task::spawn_blocking(move || -> ApiResult<ImportOutcome> {
            match ImportOrchestrator::from_db_path(&db_path) {
                Ok(mut orchestrator) => Ok(orchestrator.run(&file_path, kind)),
                Err(e) => config_failure(e, Some(kind)),
            }
        })
        .await
        .map_err(|e| ApiError::InternalError(format!("导入任务执行失败: {}", e)))??;

        info!(batch_id = %outcome.batch_id, status = %outcome.status, "导入API调用完成");
        Ok(outcome)
    }

    /// 按导入类型名称导入（名称无法识别时返回 unknown-kind 结果）
    pub async fn import_file_named(
        &self,
        file_path: impl Into<PathBuf>,
        kind_name: &str,
    ) -> ApiResult<ImportOutcome> {
        let db_path = self.db_path.clone();
        let file_path = file_path.into();
        let kind_name = kind_name.to_string();

        tokio::task::spawn_blocking(move || -> ApiResult<ImportOutcome> {
            match ImportOrchestrator::from_db_path(&db_path) {
                Ok(mut orchestrator) => Ok(orchestrator.run_named(&file_path, &kind_name)),
                Err(e) => config_failure(e, kind_name.parse().ok()),
            }
        })
        .await
        .map_err(|e| ApiError::InternalError(format!("导入任务执行失败: {}", e)))?
    }

    /// 查询技术单及其成本一致性
    ///
    /// # 返回
    /// - Err(ApiError::NotFound): 技术单不存在
    pub async fn recipe_sheet(&self, code: &str) -> ApiResult<RecipeSheetResponse> {
        let code = code.trim().to_string();
        if code.is_empty() {
            return Err(ApiError::InvalidInput("技术单编码不能为空".to_string()));
        }
        let db_path = self.db_path.clone();

        tokio::task::spawn_blocking(move || -> ApiResult<RecipeSheetResponse> {
            let tolerance = ConfigManager::new(&db_path)?.get_cost_tolerance()?;
            let store = SqliteRecordStore::new(&db_path)?;
            let sheet = store
                .load_recipe_sheet(&code)?
                .ok_or_else(|| ApiError::NotFound(format!("技术单 {} 不存在", code)))?;

            Ok(RecipeSheetResponse {
                cost_check: sheet.cost_check(tolerance),
                cost_per_portion: sheet.cost_per_portion(),
                sheet,
            })
        })
        .await
        .map_err(|e| ApiError::InternalError(format!("查询任务执行失败: {}", e)))?
    }
}

/// 配置值错误 → unexpected-failure 结果；其余初始化错误原样返回
fn config_failure(err: ImportError, kind: Option<ImportKind>) -> ApiResult<ImportOutcome> {
    if !err.is_config_error() {
        return Err(err.into());
    }

    warn!(error = %err, "导入配置无效，未执行导入");
    Ok(ImportOutcome::failed(
        Uuid::new_v4().to_string(),
        kind,
        vec![ImportDiagnostic::run(err.code(), err.to_string())],
    ))
}
