// ==========================================
// ERP 表格导入 - 表头校验
// ==========================================
// 职责: 检查归一化后的列集合是否满足每组必需列
// 规则: 每组为"任选其一"，不满足的组各产生一条错误
// ==========================================

use crate::domain::ImportKind;
use std::collections::BTreeSet;

/// 一组可互相替代的必需列
pub type RequiredSet = &'static [&'static str];

const PRODUCTS_REQUIRED: &[RequiredSet] = &[&["codigo"], &["produto", "nomeprodvenda"]];

const RECIPES_REQUIRED: &[RequiredSet] = &[
    &["produtocodigo"],
    &["componentecodigo"],
    &["qtd"],
    &["unidade", "unidademedida"],
];

const PRICES_REQUIRED: &[RequiredSet] = &[&["codigo"], &["loja"]];

/// 每种导入类型的必需列
pub fn required_headers(kind: ImportKind) -> &'static [RequiredSet] {
    match kind {
        ImportKind::Products => PRODUCTS_REQUIRED,
        ImportKind::Recipes => RECIPES_REQUIRED,
        ImportKind::Prices => PRICES_REQUIRED,
    }
}

/// 未满足的必需列组
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingHeader {
    pub representative: String, // 组内字母序第一个列名
    pub alternatives: Vec<String>,
}

/// 校验列集合
///
/// # 返回
/// - 空 Vec: 全部满足
/// - 非空: 每个未满足的组一条，保持组的声明顺序
pub fn validate_headers(
    columns: &BTreeSet<String>,
    required: &[RequiredSet],
) -> Vec<MissingHeader> {
    required
        .iter()
        .filter(|set| !set.iter().any(|col| columns.contains(*col)))
        .map(|set| {
            let mut alternatives: Vec<String> = set.iter().map(|s| s.to_string()).collect();
            alternatives.sort();
            MissingHeader {
                representative: alternatives.first().cloned().unwrap_or_default(),
                alternatives,
            }
        })
        .collect()
}
