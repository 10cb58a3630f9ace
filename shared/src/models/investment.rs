//! Investment (restock) models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A restock event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Investment {
    pub id: Uuid,
    pub product_id: Uuid,
    pub provider_id: Option<Uuid>,
    /// Version lot the units landed in
    pub version: i32,
    pub quantity_added: i32,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub investment_date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Investment values ready to be persisted
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvestment {
    pub product_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub version: i32,
    pub quantity_added: i32,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub investment_date: NaiveDate,
    pub notes: Option<String>,
}
