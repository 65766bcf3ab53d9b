// ==========================================
// ERP 表格导入 - SQLite 记录存储实现
// ==========================================
// 职责: 实现 RecordStore / RecordWriter（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::{configure_sqlite_connection, init_schema, open_sqlite_connection};
use crate::domain::{PriceEntry, Product, RecipeHeader, RecipeLine, RecipeSheet};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::record_store::{RecordStore, RecordWriter, StoreTransaction};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};

const PRODUCT_COLUMNS: &str = "code, name, sale_name, unit, unit_price, tax_rate, markup, \
    active, discontinued, family, sub_family, barcode, article_type, location, updated_at";

const PRICE_COLUMNS: &str = "product_code, store, price_1, price_2, price_3, price_4, price_5, \
    tax_rate_1, tax_rate_2, tax_exempt, active, sale_name, family, sub_family";

// ==========================================
// 行映射
// ==========================================

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        code: row.get("code")?,
        name: row.get("name")?,
        sale_name: row.get("sale_name")?,
        unit: row.get("unit")?,
        unit_price: row.get("unit_price")?,
        tax_rate: row.get("tax_rate")?,
        markup: row.get("markup")?,
        active: row.get("active")?,
        discontinued: row.get("discontinued")?,
        family: row.get("family")?,
        sub_family: row.get("sub_family")?,
        barcode: row.get("barcode")?,
        article_type: row.get("article_type")?,
        location: row.get("location")?,
        updated_at: row.get("updated_at")?,
    })
}

fn price_from_row(row: &Row<'_>) -> rusqlite::Result<PriceEntry> {
    Ok(PriceEntry {
        product_code: row.get("product_code")?,
        store: row.get("store")?,
        prices: [
            row.get("price_1")?,
            row.get("price_2")?,
            row.get("price_3")?,
            row.get("price_4")?,
            row.get("price_5")?,
        ],
        tax_rate_1: row.get("tax_rate_1")?,
        tax_rate_2: row.get("tax_rate_2")?,
        tax_exempt: row.get("tax_exempt")?,
        active: row.get("active")?,
        sale_name: row.get("sale_name")?,
        family: row.get("family")?,
        sub_family: row.get("sub_family")?,
    })
}

fn recipe_header_from_row(row: &Row<'_>) -> rusqlite::Result<RecipeHeader> {
    Ok(RecipeHeader {
        code: row.get("code")?,
        name: row.get("name")?,
        family_label: row.get("family_label")?,
        portions: row.get("portions")?,
        total_cost: row.get("total_cost")?,
        location: row.get("location")?,
    })
}

fn recipe_line_from_row(row: &Row<'_>) -> rusqlite::Result<RecipeLine> {
    Ok(RecipeLine {
        recipe_code: row.get("recipe_code")?,
        position: row.get("position")?,
        component_code: row.get("component_code")?,
        component_name: row.get("component_name")?,
        quantity: row.get("quantity")?,
        unit: row.get("unit")?,
        unit_price: row.get("unit_price")?,
        line_cost: row.get("line_cost")?,
    })
}

// ==========================================
// 共享查询（读连接与事务共用）
// ==========================================

fn query_product(conn: &Connection, code: &str) -> RepositoryResult<Option<Product>> {
    let sql = format!("SELECT {} FROM products WHERE code = ?1", PRODUCT_COLUMNS);
    Ok(conn.query_row(&sql, params![code], product_from_row).optional()?)
}

fn query_price(conn: &Connection, product_code: &str, store: &str) -> RepositoryResult<Option<PriceEntry>> {
    let sql = format!(
        "SELECT {} FROM price_entries WHERE product_code = ?1 AND store = ?2",
        PRICE_COLUMNS
    );
    Ok(conn
        .query_row(&sql, params![product_code, store], price_from_row)
        .optional()?)
}

fn query_recipe_sheet(conn: &Connection, code: &str) -> RepositoryResult<Option<RecipeSheet>> {
    let header = conn
        .query_row(
            "SELECT code, name, family_label, portions, total_cost, location
             FROM recipe_headers WHERE code = ?1",
            params![code],
            recipe_header_from_row,
        )
        .optional()?;

    let header = match header {
        Some(h) => h,
        None => return Ok(None),
    };

    let mut stmt = conn.prepare(
        "SELECT recipe_code, position, component_code, component_name, quantity, unit,
                unit_price, line_cost
         FROM recipe_lines WHERE recipe_code = ?1 ORDER BY position",
    )?;
    let lines = stmt
        .query_map(params![code], recipe_line_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(RecipeSheet { header, lines }))
}

fn count_rows(conn: &Connection, table: &str) -> RepositoryResult<usize> {
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    let n: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(n as usize)
}

// ==========================================
// SqliteRecordStore
// ==========================================
pub struct SqliteRecordStore {
    conn: Connection,
}

impl SqliteRecordStore {
    /// 打开数据库并确保 schema 存在
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// 从已有连接创建（会再次应用统一 PRAGMA 并建表，均幂等）
    pub fn from_connection(conn: Connection) -> RepositoryResult<Self> {
        configure_sqlite_connection(&conn)?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// 内存数据库（测试与演练用）
    pub fn open_in_memory() -> RepositoryResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(conn)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ===== 查询（事务外）=====

    pub fn get_product(&self, code: &str) -> RepositoryResult<Option<Product>> {
        query_product(&self.conn, code)
    }

    pub fn get_price(&self, product_code: &str, store: &str) -> RepositoryResult<Option<PriceEntry>> {
        query_price(&self.conn, product_code, store)
    }

    /// 读取技术单表头及按顺序号排列的明细
    pub fn load_recipe_sheet(&self, code: &str) -> RepositoryResult<Option<RecipeSheet>> {
        query_recipe_sheet(&self.conn, code)
    }

    pub fn count_products(&self) -> RepositoryResult<usize> {
        count_rows(&self.conn, "products")
    }

    pub fn count_recipes(&self) -> RepositoryResult<usize> {
        count_rows(&self.conn, "recipe_headers")
    }

    pub fn count_recipe_lines(&self) -> RepositoryResult<usize> {
        count_rows(&self.conn, "recipe_lines")
    }

    pub fn count_prices(&self) -> RepositoryResult<usize> {
        count_rows(&self.conn, "price_entries")
    }
}

impl RecordStore for SqliteRecordStore {
    type Tx<'a> = SqliteTransaction<'a>;

    fn begin(&mut self) -> RepositoryResult<SqliteTransaction<'_>> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(SqliteTransaction { tx })
    }
}

// ==========================================
// SqliteTransaction
// ==========================================
// 未提交即被丢弃时，rusqlite 默认回滚
pub struct SqliteTransaction<'a> {
    tx: Transaction<'a>,
}

impl StoreTransaction for SqliteTransaction<'_> {
    fn commit(self) -> RepositoryResult<()> {
        self.tx
            .commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))
    }

    fn rollback(self) -> RepositoryResult<()> {
        self.tx
            .rollback()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))
    }
}

impl RecordWriter for SqliteTransaction<'_> {
    fn find_product(&self, code: &str) -> RepositoryResult<Option<Product>> {
        query_product(&self.tx, code)
    }

    fn insert_product(&self, product: &Product) -> RepositoryResult<()> {
        let sql = format!(
            "INSERT INTO products ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            PRODUCT_COLUMNS
        );
        self.tx.execute(
            &sql,
            params![
                product.code,
                product.name,
                product.sale_name,
                product.unit,
                product.unit_price,
                product.tax_rate,
                product.markup,
                product.active,
                product.discontinued,
                product.family,
                product.sub_family,
                product.barcode,
                product.article_type,
                product.location,
                product.updated_at,
            ],
        )?;
        Ok(())
    }

    fn update_product(&self, product: &Product) -> RepositoryResult<()> {
        let affected = self.tx.execute(
            r#"
            UPDATE products SET
                name = ?2, sale_name = ?3, unit = ?4, unit_price = ?5, tax_rate = ?6,
                markup = ?7, active = ?8, discontinued = ?9, family = ?10, sub_family = ?11,
                barcode = ?12, article_type = ?13, location = ?14, updated_at = ?15
            WHERE code = ?1
            "#,
            params![
                product.code,
                product.name,
                product.sale_name,
                product.unit,
                product.unit_price,
                product.tax_rate,
                product.markup,
                product.active,
                product.discontinued,
                product.family,
                product.sub_family,
                product.barcode,
                product.article_type,
                product.location,
                product.updated_at,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Product".to_string(),
                id: product.code.clone(),
            });
        }
        Ok(())
    }

    fn recipe_exists(&self, code: &str) -> RepositoryResult<bool> {
        let found = self
            .tx
            .query_row(
                "SELECT 1 FROM recipe_headers WHERE code = ?1",
                params![code],
                |_row| Ok(true),
            )
            .optional()?;
        Ok(found.unwrap_or(false))
    }

    fn delete_recipe(&self, code: &str) -> RepositoryResult<usize> {
        // 先删明细再删表头: 不依赖连接是否开启了外键级联
        let lines = self
            .tx
            .execute("DELETE FROM recipe_lines WHERE recipe_code = ?1", params![code])?;
        self.tx
            .execute("DELETE FROM recipe_headers WHERE code = ?1", params![code])?;
        Ok(lines)
    }

    fn insert_recipe_header(&self, header: &RecipeHeader) -> RepositoryResult<()> {
        self.tx.execute(
            "INSERT INTO recipe_headers (code, name, family_label, portions, total_cost, location)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                header.code,
                header.name,
                header.family_label,
                header.portions,
                header.total_cost,
                header.location,
            ],
        )?;
        Ok(())
    }

    fn insert_recipe_line(&self, line: &RecipeLine) -> RepositoryResult<()> {
        self.tx.execute(
            "INSERT INTO recipe_lines (recipe_code, position, component_code, component_name,
                                       quantity, unit, unit_price, line_cost)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                line.recipe_code,
                line.position,
                line.component_code,
                line.component_name,
                line.quantity,
                line.unit,
                line.unit_price,
                line.line_cost,
            ],
        )?;
        Ok(())
    }

    fn update_recipe_total_cost(&self, code: &str, total_cost: f64) -> RepositoryResult<()> {
        let affected = self.tx.execute(
            "UPDATE recipe_headers SET total_cost = ?2 WHERE code = ?1",
            params![code, total_cost],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "RecipeHeader".to_string(),
                id: code.to_string(),
            });
        }
        Ok(())
    }

    fn find_price(&self, product_code: &str, store: &str) -> RepositoryResult<Option<PriceEntry>> {
        query_price(&self.tx, product_code, store)
    }

    fn insert_price(&self, entry: &PriceEntry) -> RepositoryResult<()> {
        let sql = format!(
            "INSERT INTO price_entries ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            PRICE_COLUMNS
        );
        self.tx.execute(
            &sql,
            params![
                entry.product_code,
                entry.store,
                entry.prices[0],
                entry.prices[1],
                entry.prices[2],
                entry.prices[3],
                entry.prices[4],
                entry.tax_rate_1,
                entry.tax_rate_2,
                entry.tax_exempt,
                entry.active,
                entry.sale_name,
                entry.family,
                entry.sub_family,
            ],
        )?;
        Ok(())
    }

    fn update_price(&self, entry: &PriceEntry) -> RepositoryResult<()> {
        let affected = self.tx.execute(
            r#"
            UPDATE price_entries SET
                price_1 = ?3, price_2 = ?4, price_3 = ?5, price_4 = ?6, price_5 = ?7,
                tax_rate_1 = ?8, tax_rate_2 = ?9, tax_exempt = ?10, active = ?11,
                sale_name = ?12, family = ?13, sub_family = ?14
            WHERE product_code = ?1 AND store = ?2
            "#,
            params![
                entry.product_code,
                entry.store,
                entry.prices[0],
                entry.prices[1],
                entry.prices[2],
                entry.prices[3],
                entry.prices[4],
                entry.tax_rate_1,
                entry.tax_rate_2,
                entry.tax_exempt,
                entry.active,
                entry.sale_name,
                entry.family,
                entry.sub_family,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "PriceEntry".to_string(),
                id: format!("{}@{}", entry.product_code, entry.store),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(code: &str) -> RecipeHeader {
        RecipeHeader {
            code: code.to_string(),
            name: "Soup".to_string(),
            family_label: None,
            portions: 1.0,
            total_cost: 0.0,
            location: "PT".to_string(),
        }
    }

    fn line(recipe: &str, position: i64, component: &str) -> RecipeLine {
        RecipeLine {
            recipe_code: recipe.to_string(),
            position,
            component_code: component.to_string(),
            component_name: None,
            quantity: 1.0,
            unit: "g".to_string(),
            unit_price: 2.0,
            line_cost: 2.0,
        }
    }

    #[test]
    fn test_product_insert_update_roundtrip() {
        let mut store = SqliteRecordStore::open_in_memory().unwrap();
        let tx = store.begin().unwrap();

        let mut product = Product::new("P1", "Oil", "PT");
        product.unit = Some("L".to_string());
        tx.insert_product(&product).unwrap();

        product.name = "Olive Oil".to_string();
        tx.update_product(&product).unwrap();
        tx.commit().unwrap();

        let stored = store.get_product("P1").unwrap().unwrap();
        assert_eq!(stored.name, "Olive Oil");
        assert_eq!(stored.unit.as_deref(), Some("L"));
    }

    #[test]
    fn test_rollback_discards_writes() {
        let mut store = SqliteRecordStore::open_in_memory().unwrap();
        let tx = store.begin().unwrap();
        tx.insert_product(&Product::new("P1", "Oil", "PT")).unwrap();
        tx.rollback().unwrap();

        assert_eq!(store.count_products().unwrap(), 0);
    }

    #[test]
    fn test_dropped_transaction_rolls_back() {
        let mut store = SqliteRecordStore::open_in_memory().unwrap();
        {
            let tx = store.begin().unwrap();
            tx.insert_product(&Product::new("P1", "Oil", "PT")).unwrap();
        }
        assert_eq!(store.count_products().unwrap(), 0);
    }

    #[test]
    fn test_delete_recipe_removes_owned_lines() {
        let mut store = SqliteRecordStore::open_in_memory().unwrap();
        let tx = store.begin().unwrap();
        tx.insert_recipe_header(&header("R1")).unwrap();
        tx.insert_recipe_line(&line("R1", 1, "C1")).unwrap();
        tx.insert_recipe_line(&line("R1", 2, "C2")).unwrap();
        tx.insert_recipe_header(&header("R2")).unwrap();
        tx.insert_recipe_line(&line("R2", 1, "C1")).unwrap();

        assert_eq!(tx.delete_recipe("R1").unwrap(), 2);
        assert!(!tx.recipe_exists("R1").unwrap());
        tx.commit().unwrap();

        assert_eq!(store.count_recipe_lines().unwrap(), 1);
        assert!(store.load_recipe_sheet("R1").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_component_violates_unique_key() {
        let mut store = SqliteRecordStore::open_in_memory().unwrap();
        let tx = store.begin().unwrap();
        tx.insert_recipe_header(&header("R1")).unwrap();
        tx.insert_recipe_line(&line("R1", 1, "C1")).unwrap();

        let err = tx.insert_recipe_line(&line("R1", 2, "C1")).unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[test]
    fn test_load_recipe_sheet_orders_by_position() {
        let mut store = SqliteRecordStore::open_in_memory().unwrap();
        let tx = store.begin().unwrap();
        tx.insert_recipe_header(&header("R1")).unwrap();
        tx.insert_recipe_line(&line("R1", 2, "B")).unwrap();
        tx.insert_recipe_line(&line("R1", 1, "A")).unwrap();
        tx.update_recipe_total_cost("R1", 4.0).unwrap();
        tx.commit().unwrap();

        let sheet = store.load_recipe_sheet("R1").unwrap().unwrap();
        let codes: Vec<_> = sheet.lines.iter().map(|l| l.component_code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B"]);
        assert_eq!(sheet.header.total_cost, 4.0);
    }

    #[test]
    fn test_price_update_missing_key_is_not_found() {
        let mut store = SqliteRecordStore::open_in_memory().unwrap();
        let tx = store.begin().unwrap();
        let err = tx.update_price(&PriceEntry::new("P1", "LJ01")).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}
