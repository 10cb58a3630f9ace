//! Shared types and rules for Lotkeeper
//!
//! Domain records, the pure allocation rules behind the stock ledgers, and the
//! analytics rollups. Nothing in this crate performs I/O.

pub mod allocation;
pub mod analytics;
pub mod models;
pub mod validation;

pub use models::*;
pub use validation::*;
