//! HTTP handlers for shared inventory endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::{SharedInventoryEntry, SharedInventoryView};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::stock::{
    SharedPurchaseInput, SharedTransferInput, SharedTransferOutcome, StockService,
};
use crate::services::SharedInventoryLedger;
use crate::store::StockStore;
use crate::AppState;

/// Split unclaimed stock among partners
pub async fn shared_purchase<S: StockStore>(
    State(state): State<AppState<S>>,
    Json(input): Json<SharedPurchaseInput>,
) -> AppResult<(StatusCode, Json<Vec<SharedInventoryEntry>>)> {
    let service = StockService::new(state.store);
    let entries = service.shared_purchase(input).await?;
    Ok((StatusCode::CREATED, Json(entries)))
}

/// Move a claim between users
pub async fn transfer_shared<S: StockStore>(
    State(state): State<AppState<S>>,
    Json(input): Json<SharedTransferInput>,
) -> AppResult<Json<SharedTransferOutcome>> {
    let service = StockService::new(state.store);
    let outcome = service.transfer_shared(input).await?;
    Ok(Json(outcome))
}

/// List every claim with product and user names
pub async fn list_entries<S: StockStore>(
    State(state): State<AppState<S>>,
) -> AppResult<Json<Vec<SharedInventoryView>>> {
    let ledger = SharedInventoryLedger::new(state.store);
    let entries = ledger.get_all_entries().await?;
    Ok(Json(entries))
}

/// List one user's claims
pub async fn list_user_entries<S: StockStore>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<SharedInventoryEntry>>> {
    let ledger = SharedInventoryLedger::new(state.store);
    let entries = ledger.get_user_entries(user_id).await?;
    Ok(Json(entries))
}
