//! Route definitions for Lotkeeper

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, store::StockStore, AppState};

/// Create API routes
pub fn api_routes<S: StockStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/health", get(handlers::health_check::<S>))
        .route("/investments", post(handlers::record_investment::<S>))
        .nest("/sales", sale_routes())
        .nest("/products", product_routes())
        .nest("/shared-inventory", shared_inventory_routes())
        .route("/analytics", get(handlers::get_report::<S>))
}

/// Sale routes
fn sale_routes<S: StockStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/", post(handlers::record_sale::<S>))
        .route(
            "/:sale_id",
            get(handlers::get_sale::<S>)
                .put(handlers::update_sale::<S>)
                .delete(handlers::delete_sale::<S>),
        )
}

/// Product stock routes
fn product_routes<S: StockStore>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/initialize-versions",
            post(handlers::initialize_all_versions::<S>),
        )
        .route("/:product_id/versions", get(handlers::list_versions::<S>))
        .route(
            "/:product_id/versions/:version",
            get(handlers::get_version::<S>),
        )
        .route(
            "/:product_id/shared-availability",
            get(handlers::get_shared_availability::<S>),
        )
        .route(
            "/:product_id/initialize-versions",
            post(handlers::initialize_versions::<S>),
        )
}

/// Shared inventory routes
fn shared_inventory_routes<S: StockStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/", get(handlers::list_entries::<S>))
        .route("/purchases", post(handlers::shared_purchase::<S>))
        .route("/transfers", post(handlers::transfer_shared::<S>))
        .route("/users/:user_id", get(handlers::list_user_entries::<S>))
}
