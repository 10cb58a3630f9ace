//! Product models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product with its aggregate stock counter
///
/// `stock` is the total number of units owned across every version lot.
/// Units held in shared inventory are not subtracted from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub currency_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub color: Option<String>,
    /// Sale price
    pub price: Decimal,
    /// Cost of the current (latest) version
    pub purchase_price: Decimal,
    pub stock: i32,
    /// Current (latest) version number, starting at 1
    pub version: i32,
    /// Purchase price recorded when the current version was opened
    pub version_purchase_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a product created through an investment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category_id: Option<Uuid>,
    pub currency_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub color: Option<String>,
    pub price: Decimal,
}

/// First version number assigned to a product
pub const INITIAL_VERSION: i32 = 1;
