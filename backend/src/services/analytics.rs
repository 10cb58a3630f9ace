//! Sales analytics service
//!
//! Read-only. Loads sale facts through the store and hands them to the pure
//! rollups in `shared::analytics`.

use shared::analytics::{
    self, AnalyticsReport, Breakdown, BreakdownRow, ReportFilter, SaleFact, SalesSummary,
};

use crate::error::{AppError, AppResult};
use crate::store::StockStore;

#[derive(Clone)]
pub struct AnalyticsService<S> {
    store: S,
}

impl<S: StockStore> AnalyticsService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Revenue, commissions, costs and net profit over the filtered sales
    pub async fn summary(&self, filter: &ReportFilter) -> AppResult<SalesSummary> {
        let facts = self.load(filter).await?;
        analytics::summarize(&facts).ok_or_else(totals_overflow)
    }

    pub async fn breakdown_by_product(&self, filter: &ReportFilter) -> AppResult<Vec<BreakdownRow>> {
        self.breakdown(filter, Breakdown::Product).await
    }

    pub async fn breakdown_by_seller(&self, filter: &ReportFilter) -> AppResult<Vec<BreakdownRow>> {
        self.breakdown(filter, Breakdown::Seller).await
    }

    pub async fn breakdown_by_color(&self, filter: &ReportFilter) -> AppResult<Vec<BreakdownRow>> {
        self.breakdown(filter, Breakdown::Color).await
    }

    /// Summary and every breakdown in one pass over the sales
    pub async fn report(&self, filter: &ReportFilter) -> AppResult<AnalyticsReport> {
        let facts = self.load(filter).await?;
        let report = analytics::build_report(&facts, filter).ok_or_else(totals_overflow)?;
        tracing::debug!(
            "Analytics report over {} sales, net profit {}",
            report.summary.sale_count,
            report.summary.net_profit
        );
        Ok(report)
    }

    async fn breakdown(
        &self,
        filter: &ReportFilter,
        dimension: Breakdown,
    ) -> AppResult<Vec<BreakdownRow>> {
        let facts = self.load(filter).await?;
        analytics::breakdown(&facts, dimension).ok_or_else(totals_overflow)
    }

    async fn load(&self, filter: &ReportFilter) -> AppResult<Vec<SaleFact>> {
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
            if start > end {
                return Err(AppError::invalid(
                    "start_date",
                    "start_date must not be after end_date",
                ));
            }
        }
        self.store.sale_facts(filter).await
    }
}

fn totals_overflow() -> AppError {
    AppError::Internal("Analytics totals overflow".to_string())
}
