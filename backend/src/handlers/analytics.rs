//! HTTP handlers for sales analytics

use axum::{
    extract::{Query, State},
    Json,
};
use shared::analytics::{AnalyticsReport, ReportFilter};

use crate::error::AppResult;
use crate::services::AnalyticsService;
use crate::store::StockStore;
use crate::AppState;

/// Sales summary with product, seller and color breakdowns
pub async fn get_report<S: StockStore>(
    State(state): State<AppState<S>>,
    Query(filter): Query<ReportFilter>,
) -> AppResult<Json<AnalyticsReport>> {
    let service = AnalyticsService::new(state.store);
    let report = service.report(&filter).await?;
    Ok(Json(report))
}
