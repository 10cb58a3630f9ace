//! HTTP handlers for product stock endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use shared::VersionStockLot;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::stock::BackfillSummary;
use crate::services::{SharedInventoryLedger, StockService, VersionStockLedger};
use crate::store::StockStore;
use crate::AppState;

#[derive(Serialize)]
pub struct SharedAvailability {
    pub product_id: Uuid,
    pub available: i32,
}

#[derive(Serialize)]
pub struct InitializeResponse {
    pub product_id: Uuid,
    pub created: Option<VersionStockLot>,
}

/// List version lots of a product
pub async fn list_versions<S: StockStore>(
    State(state): State<AppState<S>>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Vec<VersionStockLot>>> {
    let ledger = VersionStockLedger::new(state.store);
    let lots = ledger.get_lots(product_id).await?;
    Ok(Json(lots))
}

/// Get one version lot
pub async fn get_version<S: StockStore>(
    State(state): State<AppState<S>>,
    Path((product_id, version)): Path<(Uuid, i32)>,
) -> AppResult<Json<VersionStockLot>> {
    let ledger = VersionStockLedger::new(state.store);
    let lot = ledger
        .get_lot(product_id, version)
        .await?
        .ok_or_else(|| AppError::NotFound("Version stock".to_string()))?;
    Ok(Json(lot))
}

/// Units still available for a shared purchase
pub async fn get_shared_availability<S: StockStore>(
    State(state): State<AppState<S>>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<SharedAvailability>> {
    let ledger = SharedInventoryLedger::new(state.store);
    let available = ledger.available_for_shared_purchase(product_id).await?;
    Ok(Json(SharedAvailability {
        product_id,
        available,
    }))
}

/// Backfill the first version lot of one product
pub async fn initialize_versions<S: StockStore>(
    State(state): State<AppState<S>>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<InitializeResponse>> {
    let ledger = VersionStockLedger::new(state.store);
    let created = ledger.initialize_for_product(product_id).await?;
    Ok(Json(InitializeResponse {
        product_id,
        created,
    }))
}

/// Backfill version lots for every stocked product
pub async fn initialize_all_versions<S: StockStore>(
    State(state): State<AppState<S>>,
) -> AppResult<Json<BackfillSummary>> {
    let service = StockService::new(state.store);
    let summary = service.initialize_version_stock_for_all_products().await?;
    Ok(Json(summary))
}
