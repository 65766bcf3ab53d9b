// ==========================================
// ERP 表格导入 - 单次导入的配置快照
// ==========================================
// 每次导入开始时从 ImportConfigReader 解析一次，导入过程中不可变
// ==========================================

use crate::domain::DEFAULT_COST_TOLERANCE;
use crate::importer::header_normalizer::HeaderAliases;
use std::path::PathBuf;

pub const DEFAULT_LOCATION: &str = "PT";
pub const DEFAULT_COMPONENT_UNIT: &str = "g";
pub const HISTORY_DIR_NAME: &str = "history";

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSettings {
    pub history_dir: PathBuf,            // 归档目录
    pub default_location: String,        // 新建产品/技术单的地区编码
    pub default_component_unit: String,  // 补建组件产品的默认单位
    pub cost_tolerance: f64,             // 成本一致性容差
    pub header_aliases: HeaderAliases,   // 默认别名 + 配置覆盖
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            history_dir: crate::config::config_manager::default_history_dir(),
            default_location: DEFAULT_LOCATION.to_string(),
            default_component_unit: DEFAULT_COMPONENT_UNIT.to_string(),
            cost_tolerance: DEFAULT_COST_TOLERANCE,
            header_aliases: HeaderAliases::default(),
        }
    }
}

impl ImportSettings {
    /// 替换归档目录（测试与命令行使用）
    pub fn with_history_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.history_dir = dir.into();
        self
    }
}
