//! Version stock ledger
//!
//! Tracks per-version stock lots of a product and keeps `products.stock`
//! moving in step with them. The free functions operate inside a caller's
//! transaction so the stock service can compose them; [`VersionStockLedger`]
//! wraps each one in its own transaction.

use rust_decimal::Decimal;
use shared::allocation::fifo_version_for_quantity;
use shared::VersionStockLot;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{StockStore, StockTx};

/// Version stock ledger over a stock store
#[derive(Clone)]
pub struct VersionStockLedger<S> {
    store: S,
}

impl<S: StockStore> VersionStockLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// All lots of a product, oldest version first
    pub async fn get_lots(&self, product_id: Uuid) -> AppResult<Vec<VersionStockLot>> {
        let mut tx = self.store.begin().await?;
        if tx.find_product(product_id).await?.is_none() {
            return Err(AppError::NotFound("Product".to_string()));
        }
        tx.list_lots(product_id).await
    }

    /// One lot of a product
    pub async fn get_lot(
        &self,
        product_id: Uuid,
        version: i32,
    ) -> AppResult<Option<VersionStockLot>> {
        let mut tx = self.store.begin().await?;
        let lot = tx
            .list_lots(product_id)
            .await?
            .into_iter()
            .find(|lot| lot.version == version);
        Ok(lot)
    }

    /// Add units to a lot, creating it if needed
    pub async fn add_stock(
        &self,
        product_id: Uuid,
        version: i32,
        quantity: i32,
        purchase_price: Option<Decimal>,
    ) -> AppResult<VersionStockLot> {
        let mut tx = self.store.begin().await?;
        let lot = add_stock(&mut tx, product_id, version, quantity, purchase_price).await?;
        tx.commit().await?;
        Ok(lot)
    }

    /// Remove units from a lot; `false` if the lot cannot cover them
    pub async fn remove_stock(
        &self,
        product_id: Uuid,
        version: i32,
        quantity: i32,
    ) -> AppResult<bool> {
        let mut tx = self.store.begin().await?;
        let removed = remove_stock(&mut tx, product_id, version, quantity).await?;
        if removed {
            tx.commit().await?;
        }
        Ok(removed)
    }

    /// Lowest version whose lot alone covers `quantity`
    pub async fn find_fifo_version_for_quantity(
        &self,
        product_id: Uuid,
        quantity: i32,
    ) -> AppResult<Option<i32>> {
        let mut tx = self.store.begin().await?;
        let lots = tx.list_lots(product_id).await?;
        Ok(fifo_version_for_quantity(&lots, quantity))
    }

    /// Backfill the first lot of a product that predates version tracking
    pub async fn initialize_for_product(
        &self,
        product_id: Uuid,
    ) -> AppResult<Option<VersionStockLot>> {
        let mut tx = self.store.begin().await?;
        let lot = initialize_for_product(&mut tx, product_id).await?;
        tx.commit().await?;
        Ok(lot)
    }
}

/// Increment (or create) the lot for `version` and the product's aggregate
/// stock by `quantity`
///
/// An existing lot keeps its purchase price unless a new one is supplied.
pub async fn add_stock<T: StockTx>(
    tx: &mut T,
    product_id: Uuid,
    version: i32,
    quantity: i32,
    purchase_price: Option<Decimal>,
) -> AppResult<VersionStockLot> {
    shared::validate_quantity(quantity).map_err(|msg| AppError::invalid("quantity", msg))?;

    let product = tx
        .lock_product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    let new_stock = product
        .stock
        .checked_add(quantity)
        .ok_or_else(|| AppError::invalid("quantity", "Quantity overflows product stock"))?;

    let lot = match tx.lock_lot(product_id, version).await? {
        Some(lot) => {
            let stock_quantity = lot
                .stock_quantity
                .checked_add(quantity)
                .ok_or_else(|| AppError::invalid("quantity", "Quantity overflows lot stock"))?;
            tx.update_lot(lot.id, stock_quantity, purchase_price.or(lot.purchase_price))
                .await?
        }
        None => {
            tracing::debug!("Opening version {} for product {}", version, product_id);
            tx.insert_lot(product_id, version, quantity, purchase_price)
                .await?
        }
    };

    tx.set_product_stock(product_id, new_stock).await?;

    Ok(lot)
}

/// Decrement the lot for `version` and the aggregate stock by `quantity`
///
/// Returns `false` without touching anything when the lot is missing or holds
/// fewer units, or when the aggregate stock could not absorb the removal.
pub async fn remove_stock<T: StockTx>(
    tx: &mut T,
    product_id: Uuid,
    version: i32,
    quantity: i32,
) -> AppResult<bool> {
    shared::validate_quantity(quantity).map_err(|msg| AppError::invalid("quantity", msg))?;

    let product = tx
        .lock_product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    let lot = match tx.lock_lot(product_id, version).await? {
        Some(lot) if lot.covers(quantity) => lot,
        _ => return Ok(false),
    };

    if product.stock < quantity {
        tracing::warn!(
            "Product {} aggregate stock {} is below lot {} quantity {}",
            product_id,
            product.stock,
            version,
            lot.stock_quantity
        );
        return Ok(false);
    }

    tx.update_lot(lot.id, lot.stock_quantity - quantity, lot.purchase_price)
        .await?;
    tx.set_product_stock(product_id, product.stock - quantity)
        .await?;

    Ok(true)
}

/// Lowest version whose lot alone covers `quantity`, with the lots locked
pub async fn find_fifo_version_for_quantity<T: StockTx>(
    tx: &mut T,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<Option<i32>> {
    let lots = tx.lock_lots(product_id).await?;
    let version = fifo_version_for_quantity(&lots, quantity);
    tracing::debug!(
        "FIFO lookup for {} units of product {} resolved to {:?}",
        quantity,
        product_id,
        version
    );
    Ok(version)
}

/// Create the first lot for a product that has stock but no lots
///
/// The lot takes the product's current version, stock and purchase price.
/// The aggregate stock is not changed: the units already exist. A no-op when
/// any lot exists or the product has no stock.
pub async fn initialize_for_product<T: StockTx>(
    tx: &mut T,
    product_id: Uuid,
) -> AppResult<Option<VersionStockLot>> {
    let product = tx
        .lock_product(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    if product.stock <= 0 {
        return Ok(None);
    }

    if !tx.lock_lots(product_id).await?.is_empty() {
        return Ok(None);
    }

    let lot = tx
        .insert_lot(
            product_id,
            product.version,
            product.stock,
            Some(product.purchase_price),
        )
        .await?;

    tracing::info!(
        "Initialized version {} of product {} with {} units",
        lot.version,
        product_id,
        lot.stock_quantity
    );

    Ok(Some(lot))
}
