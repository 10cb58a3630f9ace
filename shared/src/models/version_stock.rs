//! Version stock lot models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One cost-homogeneous batch ("version") of a product's stock
///
/// Unique per `(product_id, version)`. Lots are never merged across versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct VersionStockLot {
    pub id: Uuid,
    pub product_id: Uuid,
    pub version: i32,
    pub stock_quantity: i32,
    pub purchase_price: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VersionStockLot {
    /// Whether this lot alone can cover `quantity`
    pub fn covers(&self, quantity: i32) -> bool {
        self.stock_quantity >= quantity
    }
}
