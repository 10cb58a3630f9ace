//! Domain models for Lotkeeper

mod investment;
mod product;
mod sale;
mod shared_inventory;
mod user;
mod version_stock;

pub use investment::*;
pub use product::*;
pub use sale::*;
pub use shared_inventory::*;
pub use user::*;
pub use version_stock::*;
