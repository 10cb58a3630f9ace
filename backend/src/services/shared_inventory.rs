//! Shared inventory ledger
//!
//! Partitions a product's stock into per-user claims keyed by
//! `(product, user, version)`. Claims are a view over owned stock: they never
//! move `products.stock`, and a sale only shrinks the seller's claim.

use rust_decimal::Decimal;
use shared::allocation;
use shared::{PartnerShare, Product, SharedInventoryEntry, SharedInventoryView};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{StockStore, StockTx};

#[derive(Clone)]
pub struct SharedInventoryLedger<S> {
    store: S,
}

impl<S: StockStore> SharedInventoryLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// A user's entries with positive quantity
    pub async fn get_user_entries(&self, user_id: Uuid) -> AppResult<Vec<SharedInventoryEntry>> {
        let mut tx = self.store.begin().await?;
        tx.user_entries(user_id).await
    }

    /// Every entry with positive quantity, joined with product and user names
    pub async fn get_all_entries(&self) -> AppResult<Vec<SharedInventoryView>> {
        let mut tx = self.store.begin().await?;
        tx.all_entries().await
    }

    /// Units of a product not yet claimed by any user
    pub async fn available_for_shared_purchase(&self, product_id: Uuid) -> AppResult<i32> {
        let mut tx = self.store.begin().await?;
        let product = tx
            .find_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        available_for_shared_purchase(&mut tx, &product).await
    }

    /// Whether a user's claim on one version covers `quantity`
    pub async fn check_sufficient_for_sale(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        version: i32,
    ) -> AppResult<bool> {
        let mut tx = self.store.begin().await?;
        check_sufficient_for_sale(&mut tx, user_id, product_id, quantity, version).await
    }

    /// Grant partners claims on `version`, bounded by the unclaimed stock
    pub async fn assign_partners(
        &self,
        product_id: Uuid,
        version: i32,
        purchase_price: Option<Decimal>,
        partners: &[PartnerShare],
        notes: Option<&str>,
    ) -> AppResult<Vec<SharedInventoryEntry>> {
        shared::validate_partners(partners).map_err(|msg| AppError::invalid("partners", msg))?;

        let mut tx = self.store.begin().await?;
        let product = tx
            .lock_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let available = available_for_shared_purchase(&mut tx, &product).await?;
        let requested = allocation::partner_total(partners);
        if requested > i64::from(available) {
            return Err(AppError::ExceedsAvailableStock {
                available,
                requested,
            });
        }

        let entries =
            assign_partners(&mut tx, product_id, version, purchase_price, partners, notes).await?;
        tx.commit().await?;
        Ok(entries)
    }

    /// Shrink a user's claim; `false` with no change if it is too small
    pub async fn decrement_for_sale(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        version: i32,
    ) -> AppResult<bool> {
        let mut tx = self.store.begin().await?;
        let decremented = decrement_for_sale(&mut tx, user_id, product_id, quantity, version).await?;
        if decremented {
            tx.commit().await?;
        }
        Ok(decremented)
    }

    /// Move part of a claim on `version` to another user
    pub async fn transfer(
        &self,
        product_id: Uuid,
        version: i32,
        from_user: Uuid,
        to_user: Uuid,
        quantity: i32,
    ) -> AppResult<(SharedInventoryEntry, SharedInventoryEntry)> {
        let mut tx = self.store.begin().await?;
        let moved = transfer(&mut tx, product_id, version, from_user, to_user, quantity).await?;
        tx.commit().await?;
        Ok(moved)
    }
}

/// `product.stock` minus every unit already claimed, floored at zero
pub async fn available_for_shared_purchase<T: StockTx>(
    tx: &mut T,
    product: &Product,
) -> AppResult<i32> {
    let claimed = tx.shared_total(product.id).await?;
    Ok(allocation::available_for_shared_purchase(
        product.stock,
        claimed,
    ))
}

/// Add each partner's quantity to their claim on `version`, creating claims
/// as needed
///
/// The caller is responsible for checking availability first.
pub async fn assign_partners<T: StockTx>(
    tx: &mut T,
    product_id: Uuid,
    version: i32,
    purchase_price: Option<Decimal>,
    partners: &[PartnerShare],
    notes: Option<&str>,
) -> AppResult<Vec<SharedInventoryEntry>> {
    let mut entries = Vec::with_capacity(partners.len());

    for partner in partners {
        let entry = match tx
            .lock_shared_entry(product_id, partner.user_id, version)
            .await?
        {
            Some(existing) => {
                let quantity = existing
                    .quantity
                    .checked_add(partner.quantity)
                    .ok_or_else(|| AppError::invalid("quantity", "Quantity overflows claim"))?;
                tx.set_shared_quantity(existing.id, quantity).await?
            }
            None => {
                tx.insert_shared_entry(
                    product_id,
                    partner.user_id,
                    version,
                    partner.quantity,
                    purchase_price,
                    notes,
                )
                .await?
            }
        };
        entries.push(entry);
    }

    Ok(entries)
}

/// Shrink a seller's claim on `version` by `quantity`
///
/// Returns `false` with no change when the seller has no such claim or it
/// holds fewer units. Never creates a claim.
pub async fn decrement_for_sale<T: StockTx>(
    tx: &mut T,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    version: i32,
) -> AppResult<bool> {
    let entry = match tx.lock_shared_entry(product_id, user_id, version).await? {
        Some(entry) if entry.quantity >= quantity => entry,
        _ => return Ok(false),
    };

    tx.set_shared_quantity(entry.id, entry.quantity - quantity)
        .await?;

    Ok(true)
}

/// Whether a user's claim on `version` covers `quantity`
pub async fn check_sufficient_for_sale<T: StockTx>(
    tx: &mut T,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    version: i32,
) -> AppResult<bool> {
    let held = tx
        .lock_shared_entry(product_id, user_id, version)
        .await?
        .map_or(0, |entry| entry.quantity);
    Ok(held >= quantity)
}

/// Move `quantity` units of a claim on `version` from one user to another
///
/// Returns the source and destination entries after the move.
pub async fn transfer<T: StockTx>(
    tx: &mut T,
    product_id: Uuid,
    version: i32,
    from_user: Uuid,
    to_user: Uuid,
    quantity: i32,
) -> AppResult<(SharedInventoryEntry, SharedInventoryEntry)> {
    shared::validate_quantity(quantity).map_err(|msg| AppError::invalid("quantity", msg))?;
    if from_user == to_user {
        return Err(AppError::invalid(
            "to_user_id",
            "Cannot transfer to the same user",
        ));
    }

    let source = tx
        .lock_shared_entry(product_id, from_user, version)
        .await?
        .ok_or_else(|| AppError::NotFound("Shared inventory entry".to_string()))?;

    if source.quantity < quantity {
        return Err(AppError::InsufficientStock {
            available: source.quantity,
            requested: quantity,
        });
    }

    let purchase_price = source.purchase_price;
    let source = tx
        .set_shared_quantity(source.id, source.quantity - quantity)
        .await?;

    let partner = PartnerShare {
        user_id: to_user,
        quantity,
    };
    let mut assigned = assign_partners(
        tx,
        product_id,
        version,
        purchase_price,
        &[partner],
        Some("transfer"),
    )
    .await?;

    let destination = assigned
        .pop()
        .ok_or_else(|| AppError::Internal("Transfer produced no destination entry".to_string()))?;

    Ok((source, destination))
}
