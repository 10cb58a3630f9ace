//! HTTP handlers for Lotkeeper endpoints

pub mod analytics;
pub mod health;
pub mod investment;
pub mod product;
pub mod sale;
pub mod shared_inventory;

pub use analytics::*;
pub use health::*;
pub use investment::*;
pub use product::*;
pub use sale::*;
pub use shared_inventory::*;
