// ==========================================
// ERP 表格导入 - 记录存储 Trait
// ==========================================
// 职责: 定义导入管道所需的数据访问接口（不包含实现）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 红线: 一次导入的全部写入位于同一个事务内
// ==========================================

use crate::domain::{PriceEntry, Product, RecipeHeader, RecipeLine};
use crate::repository::error::RepositoryResult;

// ==========================================
// RecordWriter Trait
// ==========================================
// 用途: 事务内的按键查找与写入
// 实现者: SqliteTransaction
pub trait RecordWriter {
    // ===== 产品 =====

    /// 按产品编码查找
    fn find_product(&self, code: &str) -> RepositoryResult<Option<Product>>;

    /// 插入新产品（编码已存在时返回唯一约束错误）
    fn insert_product(&self, product: &Product) -> RepositoryResult<()>;

    /// 按编码覆盖已有产品的全部可变字段
    fn update_product(&self, product: &Product) -> RepositoryResult<()>;

    // ===== 技术单 =====

    /// 技术单是否存在
    fn recipe_exists(&self, code: &str) -> RepositoryResult<bool>;

    /// 删除技术单表头及其全部明细
    ///
    /// # 返回
    /// - Ok(usize): 被删除的明细行数
    fn delete_recipe(&self, code: &str) -> RepositoryResult<usize>;

    fn insert_recipe_header(&self, header: &RecipeHeader) -> RepositoryResult<()>;

    fn insert_recipe_line(&self, line: &RecipeLine) -> RepositoryResult<()>;

    /// 回写表头记录总成本（明细全部写入后调用）
    fn update_recipe_total_cost(&self, code: &str, total_cost: f64) -> RepositoryResult<()>;

    // ===== 门店价格 =====

    fn find_price(&self, product_code: &str, store: &str) -> RepositoryResult<Option<PriceEntry>>;

    fn insert_price(&self, entry: &PriceEntry) -> RepositoryResult<()>;

    fn update_price(&self, entry: &PriceEntry) -> RepositoryResult<()>;
}

// ==========================================
// StoreTransaction Trait
// ==========================================
// 用途: 事务边界（提交/回滚均消费事务）
pub trait StoreTransaction: RecordWriter {
    fn commit(self) -> RepositoryResult<()>
    where
        Self: Sized;

    fn rollback(self) -> RepositoryResult<()>
    where
        Self: Sized;
}

// ==========================================
// RecordStore Trait
// ==========================================
// 用途: 开启事务
// 实现者: SqliteRecordStore
pub trait RecordStore {
    type Tx<'a>: StoreTransaction
    where
        Self: 'a;

    /// 开启一个新事务
    fn begin(&mut self) -> RepositoryResult<Self::Tx<'_>>;
}
