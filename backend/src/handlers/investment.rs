//! HTTP handlers for investment (restock) endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::error::AppResult;
use crate::services::stock::{InvestmentOutcome, RecordInvestmentInput, StockService};
use crate::store::StockStore;
use crate::AppState;

/// Record an investment
pub async fn record_investment<S: StockStore>(
    State(state): State<AppState<S>>,
    Json(input): Json<RecordInvestmentInput>,
) -> AppResult<(StatusCode, Json<InvestmentOutcome>)> {
    let service = StockService::new(state.store);
    let outcome = service.record_investment(input).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}
