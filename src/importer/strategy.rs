// ==========================================
// ERP 表格导入 - 导入策略 Trait
// ==========================================
// 职责: 每种导入类型一个策略，负责行级 upsert 与诊断收集
// 红线: 行级错误只记录诊断，不中断导入
// 红线: 存储错误原样返回，由编排器回滚整个事务
// ==========================================

use crate::config::ImportSettings;
use crate::domain::{ImportKind, ImportReport};
use crate::importer::error::ImportResult;
use crate::importer::price_strategy::PriceStrategy;
use crate::importer::product_strategy::ProductStrategy;
use crate::importer::recipe_strategy::RecipeStrategy;
use crate::importer::schema_validator::{required_headers, RequiredSet};
use crate::importer::table::SheetTable;
use crate::repository::RecordWriter;

pub trait ImportStrategy {
    fn kind(&self) -> ImportKind;

    /// 必需列组（任选其一）
    fn required_headers(&self) -> &'static [RequiredSet] {
        required_headers(self.kind())
    }

    /// 在事务内执行导入
    ///
    /// # 参数
    /// - store: 事务内的记录写入器
    /// - table: 已通过表头校验的工作表
    /// - settings: 本次导入的配置快照
    /// - report: 计数与行级诊断（累加写入）
    fn apply(
        &self,
        store: &dyn RecordWriter,
        table: &SheetTable,
        settings: &ImportSettings,
        report: &mut ImportReport,
    ) -> ImportResult<()>;
}

/// 按导入类型选择策略
pub fn strategy_for(kind: ImportKind) -> Box<dyn ImportStrategy> {
    match kind {
        ImportKind::Products => Box::new(ProductStrategy),
        ImportKind::Recipes => Box::new(RecipeStrategy),
        ImportKind::Prices => Box::new(PriceStrategy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_for_each_kind() {
        for kind in ImportKind::ALL {
            let strategy = strategy_for(kind);
            assert_eq!(strategy.kind(), kind);
            assert!(!strategy.required_headers().is_empty());
        }
    }
}
