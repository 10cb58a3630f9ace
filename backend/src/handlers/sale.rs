//! HTTP handlers for sale endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::Sale;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::stock::{
    RecordSaleInput, SaleChangeOutcome, SaleOutcome, StockService, UpdateSaleInput,
};
use crate::store::StockStore;
use crate::AppState;

/// Record a sale
pub async fn record_sale<S: StockStore>(
    State(state): State<AppState<S>>,
    Json(input): Json<RecordSaleInput>,
) -> AppResult<(StatusCode, Json<SaleOutcome>)> {
    let service = StockService::new(state.store);
    let outcome = service.record_sale(input).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Get a sale by ID
pub async fn get_sale<S: StockStore>(
    State(state): State<AppState<S>>,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<Sale>> {
    let service = StockService::new(state.store);
    let sale = service.get_sale(sale_id).await?;
    Ok(Json(sale))
}

/// Update a sale
pub async fn update_sale<S: StockStore>(
    State(state): State<AppState<S>>,
    Path(sale_id): Path<Uuid>,
    Json(input): Json<UpdateSaleInput>,
) -> AppResult<Json<SaleChangeOutcome>> {
    let service = StockService::new(state.store);
    let outcome = service.update_sale(sale_id, input).await?;
    Ok(Json(outcome))
}

/// Delete a sale
pub async fn delete_sale<S: StockStore>(
    State(state): State<AppState<S>>,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<SaleChangeOutcome>> {
    let service = StockService::new(state.store);
    let outcome = service.delete_sale(sale_id).await?;
    Ok(Json(outcome))
}
