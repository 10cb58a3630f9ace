//! Persistence seam for the stock engine
//!
//! Every mutating stock operation runs inside one [`StockTx`]. Methods named
//! `lock_*` take row locks that are held until the transaction commits or is
//! dropped; dropping a transaction without calling [`StockTx::commit`] rolls
//! it back.

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::analytics::{ReportFilter, SaleFact};
use shared::{
    Investment, NewInvestment, NewProduct, NewSale, Product, Sale, SharedInventoryEntry,
    SharedInventoryView, VersionStockLot,
};
use uuid::Uuid;

use crate::error::AppResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A source of stock transactions
#[async_trait]
pub trait StockStore: Clone + Send + Sync + 'static {
    type Tx: StockTx;

    /// Open a transaction
    async fn begin(&self) -> AppResult<Self::Tx>;

    /// Check the backing storage is reachable
    async fn ping(&self) -> AppResult<()>;

    /// Sales joined with product and seller for reporting, read without locks
    async fn sale_facts(&self, filter: &ReportFilter) -> AppResult<Vec<SaleFact>>;
}

/// One open transaction over products, lots, shared entries, sales and
/// investments
#[async_trait]
pub trait StockTx: Send + Sized {
    // Products
    async fn find_product(&mut self, id: Uuid) -> AppResult<Option<Product>>;
    async fn lock_product(&mut self, id: Uuid) -> AppResult<Option<Product>>;
    async fn insert_product(
        &mut self,
        product: &NewProduct,
        purchase_price: Decimal,
    ) -> AppResult<Product>;
    async fn set_product_stock(&mut self, id: Uuid, stock: i32) -> AppResult<Product>;
    async fn set_product_version(
        &mut self,
        id: Uuid,
        version: i32,
        purchase_price: Decimal,
    ) -> AppResult<Product>;
    /// Ids of every product with positive aggregate stock
    async fn stocked_product_ids(&mut self) -> AppResult<Vec<Uuid>>;

    // Version lots, always ordered by version ascending
    async fn list_lots(&mut self, product_id: Uuid) -> AppResult<Vec<VersionStockLot>>;
    async fn lock_lots(&mut self, product_id: Uuid) -> AppResult<Vec<VersionStockLot>>;
    async fn lock_lot(
        &mut self,
        product_id: Uuid,
        version: i32,
    ) -> AppResult<Option<VersionStockLot>>;
    async fn insert_lot(
        &mut self,
        product_id: Uuid,
        version: i32,
        stock_quantity: i32,
        purchase_price: Option<Decimal>,
    ) -> AppResult<VersionStockLot>;
    async fn update_lot(
        &mut self,
        lot_id: Uuid,
        stock_quantity: i32,
        purchase_price: Option<Decimal>,
    ) -> AppResult<VersionStockLot>;

    // Shared inventory
    async fn lock_shared_entry(
        &mut self,
        product_id: Uuid,
        user_id: Uuid,
        version: i32,
    ) -> AppResult<Option<SharedInventoryEntry>>;
    /// Sum of shared quantity for a product across users and versions
    async fn shared_total(&mut self, product_id: Uuid) -> AppResult<i64>;
    async fn insert_shared_entry(
        &mut self,
        product_id: Uuid,
        user_id: Uuid,
        version: i32,
        quantity: i32,
        purchase_price: Option<Decimal>,
        notes: Option<&str>,
    ) -> AppResult<SharedInventoryEntry>;
    async fn set_shared_quantity(
        &mut self,
        entry_id: Uuid,
        quantity: i32,
    ) -> AppResult<SharedInventoryEntry>;
    /// Entries of one user with positive quantity
    async fn user_entries(&mut self, user_id: Uuid) -> AppResult<Vec<SharedInventoryEntry>>;
    /// Every entry with positive quantity, with product and user names
    async fn all_entries(&mut self) -> AppResult<Vec<SharedInventoryView>>;

    // Sales
    async fn insert_sale(&mut self, sale: &NewSale) -> AppResult<Sale>;
    async fn find_sale(&mut self, id: Uuid) -> AppResult<Option<Sale>>;
    async fn lock_sale(&mut self, id: Uuid) -> AppResult<Option<Sale>>;
    async fn update_sale(&mut self, sale: &Sale) -> AppResult<Sale>;
    async fn delete_sale(&mut self, id: Uuid) -> AppResult<()>;

    // Investments
    async fn insert_investment(&mut self, investment: &NewInvestment) -> AppResult<Investment>;

    /// Publish every change made in this transaction
    async fn commit(self) -> AppResult<()>;
}
