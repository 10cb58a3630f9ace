//! In-memory implementation of the stock store
//!
//! A transaction holds an exclusive lock on the whole state and works on a
//! private copy, which replaces the shared state only on commit. Writers are
//! therefore fully serialised, and a dropped transaction leaves nothing behind.
//! Used by tests and local demos.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use shared::analytics::{ReportFilter, SaleFact};
use shared::{
    Investment, NewInvestment, NewProduct, NewSale, Product, Sale, SharedInventoryEntry,
    SharedInventoryView, User, VersionStockLot, INITIAL_VERSION,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{StockStore, StockTx};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    products: HashMap<Uuid, Product>,
    lots: HashMap<(Uuid, i32), VersionStockLot>,
    shared: HashMap<(Uuid, Uuid, i32), SharedInventoryEntry>,
    sales: HashMap<Uuid, Sale>,
    investments: Vec<Investment>,
}

impl MemoryState {
    fn lot_by_id(&mut self, lot_id: Uuid) -> Option<&mut VersionStockLot> {
        self.lots.values_mut().find(|lot| lot.id == lot_id)
    }

    fn shared_by_id(&mut self, entry_id: Uuid) -> Option<&mut SharedInventoryEntry> {
        self.shared.values_mut().find(|entry| entry.id == entry_id)
    }

    fn product_mut(&mut self, id: Uuid) -> AppResult<&mut Product> {
        self.products
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }
}

/// Stock store kept entirely in memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user so reports can show a name
    pub async fn insert_user(&self, name: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        self.state.lock().await.users.insert(user.id, user.clone());
        user
    }

    /// Insert a product row directly, bypassing the ledgers
    ///
    /// Models products that predate version tracking: they can carry stock
    /// without any version lot.
    pub async fn insert_legacy_product(
        &self,
        product: &NewProduct,
        stock: i32,
        version: i32,
        purchase_price: Decimal,
    ) -> Product {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: product.name.clone(),
            category_id: product.category_id,
            currency_id: product.currency_id,
            provider_id: product.provider_id,
            color: product.color.clone(),
            price: product.price,
            purchase_price,
            stock,
            version,
            version_purchase_price: None,
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .await
            .products
            .insert(product.id, product.clone());
        product
    }

    /// Every recorded investment, oldest first
    pub async fn investments(&self) -> Vec<Investment> {
        self.state.lock().await.investments.clone()
    }
}

/// Open in-memory transaction
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl StockStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> AppResult<MemoryTx> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTx { guard, working })
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn sale_facts(&self, filter: &ReportFilter) -> AppResult<Vec<SaleFact>> {
        let state = self.state.lock().await;
        let mut facts: Vec<SaleFact> = state
            .sales
            .values()
            .filter(|sale| filter.contains(sale.sale_date))
            .filter_map(|sale| {
                let product = state.products.get(&sale.product_id)?;
                Some(SaleFact {
                    sale_id: sale.id,
                    product_id: sale.product_id,
                    product_name: product.name.clone(),
                    color: product.color.clone(),
                    seller_id: sale.seller_id,
                    seller_name: state.users.get(&sale.seller_id).map(|u| u.name.clone()),
                    quantity_sold: sale.quantity_sold,
                    total_amount: sale.total_amount,
                    commission: sale.commission,
                    purchase_price: product.purchase_price,
                    sale_date: sale.sale_date,
                })
            })
            .collect();
        facts.sort_by_key(|f| f.sale_date);
        Ok(facts)
    }
}

#[async_trait]
impl StockTx for MemoryTx {
    async fn find_product(&mut self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(self.working.products.get(&id).cloned())
    }

    async fn lock_product(&mut self, id: Uuid) -> AppResult<Option<Product>> {
        self.find_product(id).await
    }

    async fn insert_product(
        &mut self,
        product: &NewProduct,
        purchase_price: Decimal,
    ) -> AppResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: product.name.clone(),
            category_id: product.category_id,
            currency_id: product.currency_id,
            provider_id: product.provider_id,
            color: product.color.clone(),
            price: product.price,
            purchase_price,
            stock: 0,
            version: INITIAL_VERSION,
            version_purchase_price: Some(purchase_price),
            created_at: now,
            updated_at: now,
        };
        self.working.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn set_product_stock(&mut self, id: Uuid, stock: i32) -> AppResult<Product> {
        if stock < 0 {
            return Err(AppError::Internal(format!(
                "products.stock would become {} for {}",
                stock, id
            )));
        }
        let product = self.working.product_mut(id)?;
        product.stock = stock;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn set_product_version(
        &mut self,
        id: Uuid,
        version: i32,
        purchase_price: Decimal,
    ) -> AppResult<Product> {
        let product = self.working.product_mut(id)?;
        product.version = version;
        product.purchase_price = purchase_price;
        product.version_purchase_price = Some(purchase_price);
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn stocked_product_ids(&mut self) -> AppResult<Vec<Uuid>> {
        let mut products: Vec<&Product> = self
            .working
            .products
            .values()
            .filter(|p| p.stock > 0)
            .collect();
        products.sort_by_key(|p| p.created_at);
        Ok(products.into_iter().map(|p| p.id).collect())
    }

    async fn list_lots(&mut self, product_id: Uuid) -> AppResult<Vec<VersionStockLot>> {
        let mut lots: Vec<VersionStockLot> = self
            .working
            .lots
            .values()
            .filter(|lot| lot.product_id == product_id)
            .cloned()
            .collect();
        lots.sort_by_key(|lot| lot.version);
        Ok(lots)
    }

    async fn lock_lots(&mut self, product_id: Uuid) -> AppResult<Vec<VersionStockLot>> {
        self.list_lots(product_id).await
    }

    async fn lock_lot(
        &mut self,
        product_id: Uuid,
        version: i32,
    ) -> AppResult<Option<VersionStockLot>> {
        Ok(self.working.lots.get(&(product_id, version)).cloned())
    }

    async fn insert_lot(
        &mut self,
        product_id: Uuid,
        version: i32,
        stock_quantity: i32,
        purchase_price: Option<Decimal>,
    ) -> AppResult<VersionStockLot> {
        if self.working.lots.contains_key(&(product_id, version)) {
            return Err(AppError::Internal(format!(
                "duplicate version lot {} for product {}",
                version, product_id
            )));
        }
        let now = Utc::now();
        let lot = VersionStockLot {
            id: Uuid::new_v4(),
            product_id,
            version,
            stock_quantity,
            purchase_price,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        self.working.lots.insert((product_id, version), lot.clone());
        Ok(lot)
    }

    async fn update_lot(
        &mut self,
        lot_id: Uuid,
        stock_quantity: i32,
        purchase_price: Option<Decimal>,
    ) -> AppResult<VersionStockLot> {
        if stock_quantity < 0 {
            return Err(AppError::Internal(format!(
                "version lot {} would hold {} units",
                lot_id, stock_quantity
            )));
        }
        let lot = self
            .working
            .lot_by_id(lot_id)
            .ok_or_else(|| AppError::NotFound("Version lot".to_string()))?;
        lot.stock_quantity = stock_quantity;
        lot.purchase_price = purchase_price;
        lot.updated_at = Utc::now();
        Ok(lot.clone())
    }

    async fn lock_shared_entry(
        &mut self,
        product_id: Uuid,
        user_id: Uuid,
        version: i32,
    ) -> AppResult<Option<SharedInventoryEntry>> {
        Ok(self
            .working
            .shared
            .get(&(product_id, user_id, version))
            .cloned())
    }

    async fn shared_total(&mut self, product_id: Uuid) -> AppResult<i64> {
        Ok(self
            .working
            .shared
            .values()
            .filter(|entry| entry.product_id == product_id)
            .map(|entry| i64::from(entry.quantity))
            .sum())
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
        let now = Utc::now();
        let entry = SharedInventoryEntry {
            id: Uuid::new_v4(),
            product_id,
            user_id,
            version,
            quantity,
            purchase_price,
            notes: notes.map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        self.working
            .shared
            .insert((product_id, user_id, version), entry.clone());
        Ok(entry)
    }

    async fn set_shared_quantity(
        &mut self,
        entry_id: Uuid,
        quantity: i32,
    ) -> AppResult<SharedInventoryEntry> {
        if quantity < 0 {
            return Err(AppError::Internal(format!(
                "shared entry {} would hold {} units",
                entry_id, quantity
            )));
        }
        let entry = self
            .working
            .shared_by_id(entry_id)
            .ok_or_else(|| AppError::NotFound("Shared inventory entry".to_string()))?;
        entry.quantity = quantity;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn user_entries(&mut self, user_id: Uuid) -> AppResult<Vec<SharedInventoryEntry>> {
        let mut entries: Vec<SharedInventoryEntry> = self
            .working
            .shared
            .values()
            .filter(|entry| entry.user_id == user_id && entry.quantity > 0)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| (entry.product_id, entry.version));
        Ok(entries)
    }

    async fn all_entries(&mut self) -> AppResult<Vec<SharedInventoryView>> {
        let state = &self.working;
        let mut views: Vec<SharedInventoryView> = state
            .shared
            .values()
            .filter(|entry| entry.quantity > 0)
            .filter_map(|entry| {
                let product = state.products.get(&entry.product_id)?;
                Some(SharedInventoryView {
                    entry: entry.clone(),
                    product_name: product.name.clone(),
                    user_name: state.users.get(&entry.user_id).map(|u| u.name.clone()),
                })
            })
            .collect();
        views.sort_by(|a, b| {
            (&a.product_name, a.entry.version, &a.user_name)
                .cmp(&(&b.product_name, b.entry.version, &b.user_name))
        });
        Ok(views)
    }

    async fn insert_sale(&mut self, sale: &NewSale) -> AppResult<Sale> {
        if !self.working.products.contains_key(&sale.product_id) {
            return Err(AppError::NotFound("Product".to_string()));
        }
        let now = Utc::now();
        let sale = Sale {
            id: Uuid::new_v4(),
            product_id: sale.product_id,
            product_version: sale.product_version,
            seller_id: sale.seller_id,
            quantity_sold: sale.quantity_sold,
            sale_price: sale.sale_price,
            commission: sale.commission,
            additional_expenses: sale.additional_expenses,
            total_amount: sale.total_amount,
            sale_date: sale.sale_date,
            created_at: now,
            updated_at: now,
        };
        self.working.sales.insert(sale.id, sale.clone());
        Ok(sale)
    }

    async fn find_sale(&mut self, id: Uuid) -> AppResult<Option<Sale>> {
        Ok(self.working.sales.get(&id).cloned())
    }

    async fn lock_sale(&mut self, id: Uuid) -> AppResult<Option<Sale>> {
        self.find_sale(id).await
    }

    async fn update_sale(&mut self, sale: &Sale) -> AppResult<Sale> {
        let stored = self
            .working
            .sales
            .get_mut(&sale.id)
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;
        *stored = Sale {
            updated_at: Utc::now(),
            ..sale.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_sale(&mut self, id: Uuid) -> AppResult<()> {
        self.working
            .sales
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))
    }

    async fn insert_investment(&mut self, investment: &NewInvestment) -> AppResult<Investment> {
        let investment = Investment {
            id: Uuid::new_v4(),
            product_id: investment.product_id,
            provider_id: investment.provider_id,
            version: investment.version,
            quantity_added: investment.quantity_added,
            unit_cost: investment.unit_cost,
            total_cost: investment.total_cost,
            investment_date: investment.investment_date,
            notes: investment.notes.clone(),
            created_at: Utc::now(),
        };
        self.working.investments.push(investment.clone());
        Ok(investment)
    }

    async fn commit(self) -> AppResult<()> {
        let MemoryTx { mut guard, working } = self;
        *guard = working;
        Ok(())
    }
}
