//! PostgreSQL implementation of the stock store
//!
//! Runs at the default READ COMMITTED isolation. Writers lock the product row
//! first, then lot, shared entry and sale rows with `FOR UPDATE`.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use shared::analytics::{ReportFilter, SaleFact};
use shared::{
    Investment, NewInvestment, NewProduct, NewSale, Product, Sale, SharedInventoryEntry,
    SharedInventoryView, VersionStockLot, INITIAL_VERSION,
};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{StockStore, StockTx};
use crate::error::{AppError, AppResult};

const PRODUCT_COLUMNS: &str = "id, name, category_id, currency_id, provider_id, color, price, \
     purchase_price, stock, version, version_purchase_price, created_at, updated_at";

const LOT_COLUMNS: &str =
    "id, product_id, version, stock_quantity, purchase_price, notes, created_at, updated_at";

const SHARED_COLUMNS: &str =
    "id, product_id, user_id, version, quantity, purchase_price, notes, created_at, updated_at";

const SALE_COLUMNS: &str = "id, product_id, product_version, seller_id, quantity_sold, \
     sale_price, commission, additional_expenses, total_amount, sale_date, created_at, updated_at";

/// Stock store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Open PostgreSQL transaction
pub struct PgStockTx {
    tx: Transaction<'static, Postgres>,
}

/// Row for the shared inventory report query
#[derive(Debug, FromRow)]
struct SharedViewRow {
    #[sqlx(flatten)]
    entry: SharedInventoryEntry,
    product_name: String,
    user_name: Option<String>,
}

#[async_trait]
impl StockStore for PgStore {
    type Tx = PgStockTx;

    async fn begin(&self) -> AppResult<PgStockTx> {
        let tx = self.db.begin().await?;
        Ok(PgStockTx { tx })
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    async fn sale_facts(&self, filter: &ReportFilter) -> AppResult<Vec<SaleFact>> {
        let facts = sqlx::query_as::<_, SaleFact>(
            r#"
            SELECT s.id AS sale_id, s.product_id, p.name AS product_name, p.color,
                   s.seller_id, u.name AS seller_name, s.quantity_sold, s.total_amount,
                   s.commission, p.purchase_price, s.sale_date
            FROM sales s
            JOIN products p ON p.id = s.product_id
            LEFT JOIN users u ON u.id = s.seller_id
            WHERE ($1::date IS NULL OR s.sale_date >= $1)
              AND ($2::date IS NULL OR s.sale_date <= $2)
            ORDER BY s.sale_date, s.created_at
            "#,
        )
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.db)
        .await?;

        Ok(facts)
    }
}

#[async_trait]
impl StockTx for PgStockTx {
    async fn find_product(&mut self, id: Uuid) -> AppResult<Option<Product>> {
        let query = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(product)
    }

    async fn lock_product(&mut self, id: Uuid) -> AppResult<Option<Product>> {
        let query = format!(
            "SELECT {} FROM products WHERE id = $1 FOR UPDATE",
            PRODUCT_COLUMNS
        );
        let product = sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(product)
    }

    async fn insert_product(
        &mut self,
        product: &NewProduct,
        purchase_price: Decimal,
    ) -> AppResult<Product> {
        let query = format!(
            r#"
            INSERT INTO products (
                name, category_id, currency_id, provider_id, color, price,
                purchase_price, stock, version, version_purchase_price
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8, $7)
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );
        let product = sqlx::query_as::<_, Product>(&query)
            .bind(&product.name)
            .bind(product.category_id)
            .bind(product.currency_id)
            .bind(product.provider_id)
            .bind(&product.color)
            .bind(product.price)
            .bind(purchase_price)
            .bind(INITIAL_VERSION)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(product)
    }

    async fn set_product_stock(&mut self, id: Uuid, stock: i32) -> AppResult<Product> {
        let query = format!(
            "UPDATE products SET stock = $1, updated_at = $2 WHERE id = $3 RETURNING {}",
            PRODUCT_COLUMNS
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(stock)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    async fn set_product_version(
        &mut self,
        id: Uuid,
        version: i32,
        purchase_price: Decimal,
    ) -> AppResult<Product> {
        let query = format!(
            r#"
            UPDATE products
            SET version = $1, purchase_price = $2, version_purchase_price = $2, updated_at = $3
            WHERE id = $4
            RETURNING {}
            "#,
            PRODUCT_COLUMNS
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(version)
            .bind(purchase_price)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    async fn stocked_product_ids(&mut self) -> AppResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM products WHERE stock > 0 ORDER BY created_at",
        )
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(ids)
    }

    async fn list_lots(&mut self, product_id: Uuid) -> AppResult<Vec<VersionStockLot>> {
        let query = format!(
            "SELECT {} FROM product_version_stock WHERE product_id = $1 ORDER BY version ASC",
            LOT_COLUMNS
        );
        let lots = sqlx::query_as::<_, VersionStockLot>(&query)
            .bind(product_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(lots)
    }

    async fn lock_lots(&mut self, product_id: Uuid) -> AppResult<Vec<VersionStockLot>> {
        let query = format!(
            "SELECT {} FROM product_version_stock WHERE product_id = $1 ORDER BY version ASC FOR UPDATE",
            LOT_COLUMNS
        );
        let lots = sqlx::query_as::<_, VersionStockLot>(&query)
            .bind(product_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(lots)
    }

    async fn lock_lot(
        &mut self,
        product_id: Uuid,
        version: i32,
    ) -> AppResult<Option<VersionStockLot>> {
        let query = format!(
            "SELECT {} FROM product_version_stock WHERE product_id = $1 AND version = $2 FOR UPDATE",
            LOT_COLUMNS
        );
        let lot = sqlx::query_as::<_, VersionStockLot>(&query)
            .bind(product_id)
            .bind(version)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(lot)
    }

    async fn insert_lot(
        &mut self,
        product_id: Uuid,
        version: i32,
        stock_quantity: i32,
        purchase_price: Option<Decimal>,
    ) -> AppResult<VersionStockLot> {
        let query = format!(
            r#"
            INSERT INTO product_version_stock (product_id, version, stock_quantity, purchase_price)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            LOT_COLUMNS
        );
        let lot = sqlx::query_as::<_, VersionStockLot>(&query)
            .bind(product_id)
            .bind(version)
            .bind(stock_quantity)
            .bind(purchase_price)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(lot)
    }

    async fn update_lot(
        &mut self,
        lot_id: Uuid,
        stock_quantity: i32,
        purchase_price: Option<Decimal>,
    ) -> AppResult<VersionStockLot> {
        let query = format!(
            r#"
            UPDATE product_version_stock
            SET stock_quantity = $1, purchase_price = $2, updated_at = $3
            WHERE id = $4
            RETURNING {}
            "#,
            LOT_COLUMNS
        );
        sqlx::query_as::<_, VersionStockLot>(&query)
            .bind(stock_quantity)
            .bind(purchase_price)
            .bind(Utc::now())
            .bind(lot_id)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Version lot".to_string()))
    }

    async fn lock_shared_entry(
        &mut self,
        product_id: Uuid,
        user_id: Uuid,
        version: i32,
    ) -> AppResult<Option<SharedInventoryEntry>> {
        let query = format!(
            r#"
            SELECT {} FROM shared_inventory
            WHERE product_id = $1 AND user_id = $2 AND version = $3
            FOR UPDATE
            "#,
            SHARED_COLUMNS
        );
        let entry = sqlx::query_as::<_, SharedInventoryEntry>(&query)
            .bind(product_id)
            .bind(user_id)
            .bind(version)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(entry)
    }

    async fn shared_total(&mut self, product_id: Uuid) -> AppResult<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM shared_inventory WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(total)
    }

    async fn insert_shared_entry(
        &mut self,
        product_id: Uuid,
        user_id: Uuid,
        version: i32,
        quantity: i32,
        purchase_price: Option<Decimal>,
        notes: Option<&str>,
    ) -> AppResult<SharedInventoryEntry> {
        let query = format!(
            r#"
            INSERT INTO shared_inventory (product_id, user_id, version, quantity, purchase_price, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            SHARED_COLUMNS
        );
        let entry = sqlx::query_as::<_, SharedInventoryEntry>(&query)
            .bind(product_id)
            .bind(user_id)
            .bind(version)
            .bind(quantity)
            .bind(purchase_price)
            .bind(notes)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(entry)
    }

    async fn set_shared_quantity(
        &mut self,
        entry_id: Uuid,
        quantity: i32,
    ) -> AppResult<SharedInventoryEntry> {
        let query = format!(
            "UPDATE shared_inventory SET quantity = $1, updated_at = $2 WHERE id = $3 RETURNING {}",
            SHARED_COLUMNS
        );
        sqlx::query_as::<_, SharedInventoryEntry>(&query)
            .bind(quantity)
            .bind(Utc::now())
            .bind(entry_id)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Shared inventory entry".to_string()))
    }

    async fn user_entries(&mut self, user_id: Uuid) -> AppResult<Vec<SharedInventoryEntry>> {
        let query = format!(
            r#"
            SELECT {} FROM shared_inventory
            WHERE user_id = $1 AND quantity > 0
            ORDER BY product_id, version
            "#,
            SHARED_COLUMNS
        );
        let entries = sqlx::query_as::<_, SharedInventoryEntry>(&query)
            .bind(user_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(entries)
    }

    async fn all_entries(&mut self) -> AppResult<Vec<SharedInventoryView>> {
        let rows = sqlx::query_as::<_, SharedViewRow>(
            r#"
            SELECT si.id, si.product_id, si.user_id, si.version, si.quantity,
                   si.purchase_price, si.notes, si.created_at, si.updated_at,
                   p.name AS product_name, u.name AS user_name
            FROM shared_inventory si
            JOIN products p ON p.id = si.product_id
            LEFT JOIN users u ON u.id = si.user_id
            WHERE si.quantity > 0
            ORDER BY p.name, si.version, u.name
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| SharedInventoryView {
                entry: r.entry,
                product_name: r.product_name,
                user_name: r.user_name,
            })
            .collect())
    }

    async fn insert_sale(&mut self, sale: &NewSale) -> AppResult<Sale> {
        let query = format!(
            r#"
            INSERT INTO sales (
                product_id, product_version, seller_id, quantity_sold, sale_price,
                commission, additional_expenses, total_amount, sale_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            SALE_COLUMNS
        );
        let sale = sqlx::query_as::<_, Sale>(&query)
            .bind(sale.product_id)
            .bind(sale.product_version)
            .bind(sale.seller_id)
            .bind(sale.quantity_sold)
            .bind(sale.sale_price)
            .bind(sale.commission)
            .bind(sale.additional_expenses)
            .bind(sale.total_amount)
            .bind(sale.sale_date)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(sale)
    }

    async fn find_sale(&mut self, id: Uuid) -> AppResult<Option<Sale>> {
        let query = format!("SELECT {} FROM sales WHERE id = $1", SALE_COLUMNS);
        let sale = sqlx::query_as::<_, Sale>(&query)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(sale)
    }

    async fn lock_sale(&mut self, id: Uuid) -> AppResult<Option<Sale>> {
        let query = format!("SELECT {} FROM sales WHERE id = $1 FOR UPDATE", SALE_COLUMNS);
        let sale = sqlx::query_as::<_, Sale>(&query)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(sale)
    }

    async fn update_sale(&mut self, sale: &Sale) -> AppResult<Sale> {
        let query = format!(
            r#"
            UPDATE sales
            SET seller_id = $1, quantity_sold = $2, sale_price = $3, commission = $4,
                additional_expenses = $5, total_amount = $6, sale_date = $7, updated_at = $8
            WHERE id = $9
            RETURNING {}
            "#,
            SALE_COLUMNS
        );
        sqlx::query_as::<_, Sale>(&query)
            .bind(sale.seller_id)
            .bind(sale.quantity_sold)
            .bind(sale.sale_price)
            .bind(sale.commission)
            .bind(sale.additional_expenses)
            .bind(sale.total_amount)
            .bind(sale.sale_date)
            .bind(Utc::now())
            .bind(sale.id)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))
    }

    async fn delete_sale(&mut self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM sales WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Sale".to_string()));
        }

        Ok(())
    }

    async fn insert_investment(&mut self, investment: &NewInvestment) -> AppResult<Investment> {
        let investment = sqlx::query_as::<_, Investment>(
            r#"
            INSERT INTO investments (
                product_id, provider_id, version, quantity_added, unit_cost,
                total_cost, investment_date, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, product_id, provider_id, version, quantity_added, unit_cost,
                      total_cost, investment_date, notes, created_at
            "#,
        )
        .bind(investment.product_id)
        .bind(investment.provider_id)
        .bind(investment.version)
        .bind(investment.quantity_added)
        .bind(investment.unit_cost)
        .bind(investment.total_cost)
        .bind(investment.investment_date)
        .bind(&investment.notes)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(investment)
    }

    async fn commit(self) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
