//! Sale models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded sale, taken from exactly one version lot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: Uuid,
    pub product_id: Uuid,
    /// Version lot the units were allocated from
    pub product_version: i32,
    pub seller_id: Uuid,
    pub quantity_sold: i32,
    pub sale_price: Decimal,
    pub commission: Decimal,
    pub additional_expenses: Decimal,
    /// `quantity_sold * sale_price + additional_expenses`
    pub total_amount: Decimal,
    pub sale_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sale values ready to be persisted
#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    pub product_id: Uuid,
    pub product_version: i32,
    pub seller_id: Uuid,
    pub quantity_sold: i32,
    pub sale_price: Decimal,
    pub commission: Decimal,
    pub additional_expenses: Decimal,
    pub total_amount: Decimal,
    pub sale_date: NaiveDate,
}
