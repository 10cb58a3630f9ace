//! Shared inventory models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's claim on a partition of one version lot
///
/// Unique per `(product_id, user_id, version)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SharedInventoryEntry {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub version: i32,
    pub quantity: i32,
    pub purchase_price: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Shared entry joined with product and user names for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedInventoryView {
    #[serde(flatten)]
    pub entry: SharedInventoryEntry,
    pub product_name: String,
    pub user_name: Option<String>,
}

/// One partner's share in a shared purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerShare {
    pub user_id: Uuid,
    pub quantity: i32,
}
