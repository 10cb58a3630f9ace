//! User reference model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimal user record used to label sellers and shared-inventory owners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: Uuid,
    pub name: String,
}
