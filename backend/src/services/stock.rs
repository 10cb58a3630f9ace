//! Stock allocation service
//!
//! The single write path for the three stock representations: the product's
//! aggregate `stock`, its version lots and the shared inventory overlay. Each
//! operation runs in one transaction that locks the product row before
//! anything else, so writers on the same product are serialised.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::allocation::{next_version, partner_total, sale_total_amount, stock_after_sale_edit};
use shared::{
    Investment, NewInvestment, NewProduct, NewSale, PartnerShare, Product, Sale,
    SharedInventoryEntry, VersionStockLot, INITIAL_VERSION,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::{shared_inventory, version_stock};
use crate::store::{StockStore, StockTx};

/// Stock allocation service
#[derive(Clone)]
pub struct StockService<S> {
    store: S,
}

/// Input for recording an investment (restock)
///
/// Exactly one of `product_id` and `new_product` must be given.
#[derive(Debug, Deserialize, Validate)]
pub struct RecordInvestmentInput {
    pub product_id: Option<Uuid>,
    pub new_product: Option<NewProduct>,
    /// Open a new version lot at `unit_cost` instead of restocking the current one
    #[serde(default)]
    pub is_new_version: bool,
    #[validate(range(min = 1))]
    pub quantity_added: i32,
    pub unit_cost: Option<Decimal>,
    pub total_cost: Option<Decimal>,
    pub provider_id: Option<Uuid>,
    pub investment_date: Option<NaiveDate>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Input for recording a sale
#[derive(Debug, Deserialize, Validate)]
pub struct RecordSaleInput {
    pub product_id: Uuid,
    pub seller_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity_sold: i32,
    pub sale_price: Decimal,
    pub commission: Option<Decimal>,
    pub additional_expenses: Option<Decimal>,
    /// Sell from this version instead of the FIFO choice
    #[validate(range(min = 1))]
    pub product_version: Option<i32>,
    pub sale_date: Option<NaiveDate>,
}

/// Input for editing a recorded sale
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSaleInput {
    pub seller_id: Option<Uuid>,
    #[validate(range(min = 1))]
    pub quantity_sold: Option<i32>,
    pub sale_price: Option<Decimal>,
    pub commission: Option<Decimal>,
    pub additional_expenses: Option<Decimal>,
    pub sale_date: Option<NaiveDate>,
}

/// Input for splitting unclaimed stock among partners
#[derive(Debug, Deserialize, Validate)]
pub struct SharedPurchaseInput {
    pub product_id: Uuid,
    #[validate(length(min = 1))]
    pub partners: Vec<PartnerShare>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Input for moving a claim between users
#[derive(Debug, Deserialize, Validate)]
pub struct SharedTransferInput {
    pub product_id: Uuid,
    /// Defaults to the product's current version
    #[validate(range(min = 1))]
    pub version: Option<i32>,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvestmentOutcome {
    pub investment: Investment,
    pub product: Product,
    pub lot: VersionStockLot,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaleOutcome {
    pub sale: Sale,
    pub product: Product,
    /// Lot the units were taken from, after the sale
    pub lot: Option<VersionStockLot>,
    /// Whether the seller's shared claim covered the sale
    pub shared_decremented: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaleChangeOutcome {
    pub sale: Sale,
    pub product: Product,
}

#[derive(Debug, Clone, Serialize)]
pub struct SharedTransferOutcome {
    pub from: SharedInventoryEntry,
    pub to: SharedInventoryEntry,
}

/// Result of backfilling version lots across all products
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillSummary {
    pub products_checked: usize,
    pub lots_created: usize,
    pub failures: usize,
}

impl<S: StockStore> StockService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record an investment: create or restock a product and log the cost
    pub async fn record_investment(
        &self,
        input: RecordInvestmentInput,
    ) -> AppResult<InvestmentOutcome> {
        input.validate()?;
        check_amount("unit_cost", input.unit_cost)?;
        check_amount("total_cost", input.total_cost)?;

        let quantity = input.quantity_added;
        let mut tx = self.store.begin().await?;

        let lot = match (input.product_id, &input.new_product) {
            (None, Some(new_product)) => {
                let unit_cost = require_unit_cost(input.unit_cost)?;
                if new_product.name.trim().is_empty() {
                    return Err(AppError::invalid("name", "Product name is required"));
                }
                check_amount("price", Some(new_product.price))?;

                let product = tx.insert_product(new_product, unit_cost).await?;
                tracing::info!("Created product {} ({})", product.id, product.name);

                version_stock::add_stock(
                    &mut tx,
                    product.id,
                    INITIAL_VERSION,
                    quantity,
                    Some(unit_cost),
                )
                .await?
            }
            (Some(product_id), None) => {
                let product = tx
                    .lock_product(product_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

                let new_version_cost = if input.is_new_version {
                    Some(require_unit_cost(input.unit_cost)?)
                } else {
                    None
                };

                version_stock::initialize_for_product(&mut tx, product_id).await?;

                match new_version_cost {
                    Some(unit_cost) => {
                        let version = next_version(product.version);
                        let lot = version_stock::add_stock(
                            &mut tx,
                            product_id,
                            version,
                            quantity,
                            Some(unit_cost),
                        )
                        .await?;
                        tx.set_product_version(product_id, version, unit_cost)
                            .await?;
                        tracing::info!(
                            "Opened version {} of product {} at {}",
                            version,
                            product_id,
                            unit_cost
                        );
                        lot
                    }
                    None => {
                        version_stock::add_stock(
                            &mut tx,
                            product_id,
                            product.version,
                            quantity,
                            input.unit_cost,
                        )
                        .await?
                    }
                }
            }
            _ => {
                return Err(AppError::invalid(
                    "product_id",
                    "Provide either product_id or new_product",
                ))
            }
        };

        let product = tx
            .find_product(lot.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let unit_cost = input.unit_cost.unwrap_or(product.purchase_price);
        let total_cost = match input.total_cost {
            Some(total_cost) => total_cost,
            None => Decimal::from(quantity)
                .checked_mul(unit_cost)
                .ok_or_else(|| AppError::invalid("unit_cost", "Total cost overflows"))?,
        };

        let investment = tx
            .insert_investment(&NewInvestment {
                product_id: product.id,
                provider_id: input.provider_id.or(product.provider_id),
                version: lot.version,
                quantity_added: quantity,
                unit_cost,
                total_cost,
                investment_date: input
                    .investment_date
                    .unwrap_or_else(|| Utc::now().date_naive()),
                notes: input.notes,
            })
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Recorded investment of {} units in version {} of product {}, stock now {}",
            quantity,
            lot.version,
            product.id,
            product.stock
        );

        Ok(InvestmentOutcome {
            investment,
            product,
            lot,
        })
    }

    /// Record a sale against exactly one version lot
    pub async fn record_sale(&self, input: RecordSaleInput) -> AppResult<SaleOutcome> {
        input.validate()?;
        check_amount("sale_price", Some(input.sale_price))?;
        check_amount("commission", input.commission)?;
        check_amount("additional_expenses", input.additional_expenses)?;

        let quantity = input.quantity_sold;
        let commission = input.commission.unwrap_or(Decimal::ZERO);
        let additional_expenses = input.additional_expenses.unwrap_or(Decimal::ZERO);
        let total_amount = sale_total_amount(quantity, input.sale_price, additional_expenses)
            .ok_or_else(|| AppError::invalid("sale_price", "Sale total overflows"))?;

        let mut tx = self.store.begin().await?;

        let product = tx
            .lock_product(input.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        if product.stock < quantity {
            return Err(AppError::InsufficientStock {
                available: product.stock,
                requested: quantity,
            });
        }

        version_stock::initialize_for_product(&mut tx, product.id).await?;

        let version = match input.product_version {
            Some(version) => {
                let available = tx
                    .lock_lot(product.id, version)
                    .await?
                    .map_or(0, |lot| lot.stock_quantity);
                if available < quantity {
                    return Err(AppError::InsufficientVersionStock {
                        version,
                        available,
                        requested: quantity,
                    });
                }
                version
            }
            None => version_stock::find_fifo_version_for_quantity(&mut tx, product.id, quantity)
                .await?
                .ok_or(AppError::NoAvailableVersion {
                    requested: quantity,
                })?,
        };

        let sale = tx
            .insert_sale(&NewSale {
                product_id: product.id,
                product_version: version,
                seller_id: input.seller_id,
                quantity_sold: quantity,
                sale_price: input.sale_price,
                commission,
                additional_expenses,
                total_amount,
                sale_date: input.sale_date.unwrap_or_else(|| Utc::now().date_naive()),
            })
            .await?;

        if !version_stock::remove_stock(&mut tx, product.id, version, quantity).await? {
            return Err(AppError::Concurrency(format!(
                "version {} of product {} changed while recording the sale",
                version, product.id
            )));
        }

        let shared_decremented = shared_inventory::decrement_for_sale(
            &mut tx,
            input.seller_id,
            product.id,
            quantity,
            version,
        )
        .await?;

        if !shared_decremented {
            tracing::warn!(
                "Seller {} holds no shared claim covering {} units of version {} of product {}",
                input.seller_id,
                quantity,
                version,
                product.id
            );
        }

        let lot = tx.lock_lot(product.id, version).await?;
        let product = tx
            .find_product(product.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        tx.commit().await?;

        tracing::info!(
            "Recorded sale {} of {} units from version {} of product {}, stock now {}",
            sale.id,
            quantity,
            version,
            product.id,
            product.stock
        );

        Ok(SaleOutcome {
            sale,
            product,
            lot,
            shared_decremented,
        })
    }

    /// Fetch a sale
    pub async fn get_sale(&self, sale_id: Uuid) -> AppResult<Sale> {
        let mut tx = self.store.begin().await?;
        tx.find_sale(sale_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))
    }

    /// Edit a sale
    ///
    /// A quantity change moves the product's aggregate stock by the
    /// difference. The version lot the sale was taken from is left as is.
    pub async fn update_sale(
        &self,
        sale_id: Uuid,
        input: UpdateSaleInput,
    ) -> AppResult<SaleChangeOutcome> {
        input.validate()?;
        check_amount("sale_price", input.sale_price)?;
        check_amount("commission", input.commission)?;
        check_amount("additional_expenses", input.additional_expenses)?;

        let mut tx = self.store.begin().await?;

        let product_id = tx
            .find_sale(sale_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))?
            .product_id;
        let product = tx
            .lock_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        let mut sale = tx
            .lock_sale(sale_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        let old_quantity = sale.quantity_sold;
        let new_quantity = input.quantity_sold.unwrap_or(old_quantity);

        let stock = stock_after_sale_edit(product.stock, old_quantity, new_quantity).ok_or(
            AppError::InsufficientStock {
                available: product.stock.saturating_add(old_quantity),
                requested: new_quantity,
            },
        )?;

        sale.quantity_sold = new_quantity;
        if let Some(seller_id) = input.seller_id {
            sale.seller_id = seller_id;
        }
        if let Some(sale_price) = input.sale_price {
            sale.sale_price = sale_price;
        }
        if let Some(commission) = input.commission {
            sale.commission = commission;
        }
        if let Some(additional_expenses) = input.additional_expenses {
            sale.additional_expenses = additional_expenses;
        }
        if let Some(sale_date) = input.sale_date {
            sale.sale_date = sale_date;
        }
        sale.total_amount =
            sale_total_amount(sale.quantity_sold, sale.sale_price, sale.additional_expenses)
                .ok_or_else(|| AppError::invalid("sale_price", "Sale total overflows"))?;

        let sale = tx.update_sale(&sale).await?;
        let product = if stock != product.stock {
            tx.set_product_stock(product.id, stock).await?
        } else {
            product
        };

        tx.commit().await?;

        tracing::info!(
            "Updated sale {}: quantity {} -> {}, product {} stock now {}",
            sale.id,
            old_quantity,
            new_quantity,
            product.id,
            product.stock
        );

        Ok(SaleChangeOutcome { sale, product })
    }

    /// Delete a sale and return its units to the aggregate stock
    ///
    /// The version lot is not restored.
    pub async fn delete_sale(&self, sale_id: Uuid) -> AppResult<SaleChangeOutcome> {
        let mut tx = self.store.begin().await?;

        let product_id = tx
            .find_sale(sale_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))?
            .product_id;
        let product = tx
            .lock_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        let sale = tx
            .lock_sale(sale_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        let stock = product
            .stock
            .checked_add(sale.quantity_sold)
            .ok_or_else(|| AppError::Internal(format!("stock overflow on product {}", product.id)))?;

        let product = tx.set_product_stock(product.id, stock).await?;
        tx.delete_sale(sale.id).await?;

        tx.commit().await?;

        tracing::info!(
            "Deleted sale {}, returned {} units to product {}",
            sale.id,
            sale.quantity_sold,
            product.id
        );

        Ok(SaleChangeOutcome { sale, product })
    }

    /// Split unclaimed units of a product among partners on its current version
    pub async fn shared_purchase(
        &self,
        input: SharedPurchaseInput,
    ) -> AppResult<Vec<SharedInventoryEntry>> {
        input.validate()?;
        shared::validate_partners(&input.partners)
            .map_err(|msg| AppError::invalid("partners", msg))?;

        let mut tx = self.store.begin().await?;

        let product = tx
            .lock_product(input.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let available = shared_inventory::available_for_shared_purchase(&mut tx, &product).await?;
        let requested = partner_total(&input.partners);
        if requested > i64::from(available) {
            return Err(AppError::ExceedsAvailableStock {
                available,
                requested,
            });
        }

        let entries = shared_inventory::assign_partners(
            &mut tx,
            product.id,
            product.version,
            Some(product.purchase_price),
            &input.partners,
            input.notes.as_deref(),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Assigned {} units of product {} to {} partners",
            requested,
            product.id,
            entries.len()
        );

        Ok(entries)
    }

    /// Move part of one user's claim to another user
    pub async fn transfer_shared(
        &self,
        input: SharedTransferInput,
    ) -> AppResult<SharedTransferOutcome> {
        input.validate()?;

        let mut tx = self.store.begin().await?;

        let product = tx
            .lock_product(input.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
        let version = input.version.unwrap_or(product.version);

        let (from, to) = shared_inventory::transfer(
            &mut tx,
            product.id,
            version,
            input.from_user_id,
            input.to_user_id,
            input.quantity,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Transferred {} units of version {} of product {} from {} to {}",
            input.quantity,
            version,
            product.id,
            input.from_user_id,
            input.to_user_id
        );

        Ok(SharedTransferOutcome { from, to })
    }

    /// Create the first version lot for every stocked product that has none
    ///
    /// Each product is handled in its own transaction; a failure is logged and
    /// counted without undoing the others.
    pub async fn initialize_version_stock_for_all_products(&self) -> AppResult<BackfillSummary> {
        let mut tx = self.store.begin().await?;
        let product_ids = tx.stocked_product_ids().await?;
        tx.commit().await?;

        let mut summary = BackfillSummary {
            products_checked: product_ids.len(),
            ..BackfillSummary::default()
        };

        for product_id in product_ids {
            match self.initialize_one(product_id).await {
                Ok(Some(_)) => summary.lots_created += 1,
                Ok(None) => {}
                Err(e) => {
                    summary.failures += 1;
                    tracing::warn!(
                        "Failed to initialize version stock for product {}: {}",
                        product_id,
                        e
                    );
                }
            }
        }

        tracing::info!(
            "Version stock backfill: {} products checked, {} lots created, {} failures",
            summary.products_checked,
            summary.lots_created,
            summary.failures
        );

        Ok(summary)
    }

    async fn initialize_one(&self, product_id: Uuid) -> AppResult<Option<VersionStockLot>> {
        let mut tx = self.store.begin().await?;
        let lot = version_stock::initialize_for_product(&mut tx, product_id).await?;
        tx.commit().await?;
        Ok(lot)
    }
}

fn require_unit_cost(unit_cost: Option<Decimal>) -> AppResult<Decimal> {
    unit_cost.ok_or_else(|| {
        AppError::invalid("unit_cost", "Unit cost is required when opening a version")
    })
}

fn check_amount(field: &str, amount: Option<Decimal>) -> AppResult<()> {
    match amount {
        Some(amount) => {
            shared::validate_amount(amount).map_err(|msg| AppError::invalid(field, msg))
        }
        None => Ok(()),
    }
}
