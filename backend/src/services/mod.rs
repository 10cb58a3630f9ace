//! Business logic services for Lotkeeper

pub mod analytics;
pub mod shared_inventory;
pub mod stock;
pub mod version_stock;

pub use analytics::AnalyticsService;
pub use shared_inventory::SharedInventoryLedger;
pub use stock::StockService;
pub use version_stock::VersionStockLedger;
