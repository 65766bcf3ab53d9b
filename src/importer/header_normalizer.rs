// ==========================================
// ERP 表格导入 - 表头归一化
// ==========================================
// 职责: 原始列名 → 规范字段键
// 规则: NFKD 去重音 → 小写 → 仅保留 [a-z0-9] → 查别名表
// 约束: 纯函数，确定性，永不失败（无法识别的列归一化为无人使用的键）
// ==========================================

use std::collections::HashMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// 历史/不规则表头 → 当前规范键（键与值均为归一化后的形式）
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("prodvenda", "codigo"),
    ("nomeprodvendanaonecessariopimportar", "nomeprodvenda"),
    ("familianaonecessariopimportar", "familia"),
    ("subfamilianaonecessariopimportar", "subfamilia"),
    ("unidade", "unidademedida"),
    ("quantidade", "qtd"),
    ("precounitario", "ppu"),
];

// ==========================================
// HeaderAliases - 别名表（不可变配置值）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderAliases {
    map: HashMap<String, String>,
}

impl HeaderAliases {
    /// 空别名表（只做字符归一化）
    pub fn empty() -> Self {
        Self { map: HashMap::new() }
    }

    /// 由任意标签对构建，键与值都先做字符归一化
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let map = pairs
            .into_iter()
            .map(|(k, v)| (fold_label(k.as_ref()), fold_label(v.as_ref())))
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .collect();
        Self { map }
    }

    /// 以 `overrides` 覆盖当前别名，返回新表
    pub fn merged_with(&self, overrides: &HeaderAliases) -> Self {
        let mut map = self.map.clone();
        map.extend(overrides.map.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { map }
    }

    pub fn get(&self, folded: &str) -> Option<&str> {
        self.map.get(folded).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for HeaderAliases {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_ALIASES.iter().copied())
    }
}

/// 字符归一化: 去重音、小写、去掉 [a-z0-9] 以外的字符
pub fn fold_label(raw: &str) -> String {
    raw.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

// ==========================================
// HeaderNormalizer
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct HeaderNormalizer {
    aliases: HeaderAliases,
}

impl HeaderNormalizer {
    pub fn new(aliases: HeaderAliases) -> Self {
        Self { aliases }
    }

    /// 原始列名 → 规范字段键
    pub fn normalize(&self, raw: &str) -> String {
        let folded = fold_label(raw);
        match self.aliases.get(&folded) {
            Some(canonical) => canonical.to_string(),
            None => folded,
        }
    }

    /// 归一化整行表头
    pub fn normalize_all<S: AsRef<str>>(&self, raw_headers: &[S]) -> Vec<String> {
        raw_headers.iter().map(|h| self.normalize(h.as_ref())).collect()
    }
}
