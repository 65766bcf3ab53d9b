// ==========================================
// ERP 表格导入 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入管道所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::settings::ImportSettings;
use crate::importer::error::ImportResult;
use crate::importer::header_normalizer::HeaderAliases;
use std::path::PathBuf;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入管道所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait ImportConfigReader {
    /// 获取归档目录
    ///
    /// # 默认值
    /// - <数据目录>/erp-import/history
    fn get_history_dir(&self) -> ImportResult<PathBuf>;

    /// 获取新建记录的地区编码
    ///
    /// # 默认值
    /// - PT
    fn get_default_location(&self) -> ImportResult<String>;

    /// 获取补建组件产品的默认单位
    ///
    /// # 默认值
    /// - g
    fn get_default_component_unit(&self) -> ImportResult<String>;

    /// 获取成本一致性容差
    ///
    /// # 默认值
    /// - 0.01
    fn get_cost_tolerance(&self) -> ImportResult<f64>;

    /// 获取表头别名表
    ///
    /// # 返回
    /// - 默认别名表，叠加 import.header_aliases（JSON 对象）中的覆盖项
    fn get_header_aliases(&self) -> ImportResult<HeaderAliases>;

    /// 一次性解析全部导入配置
    fn load_settings(&self) -> ImportResult<ImportSettings> {
        Ok(ImportSettings {
            history_dir: self.get_history_dir()?,
            default_location: self.get_default_location()?,
            default_component_unit: self.get_default_component_unit()?,
            cost_tolerance: self.get_cost_tolerance()?,
            header_aliases: self.get_header_aliases()?,
        })
    }
}
