//! Sales analytics tests
//!
//! Runs recorded sales through the analytics service and checks the summary
//! figures and breakdowns.

use chrono::NaiveDate;
use lotkeeper_backend::services::stock::{RecordInvestmentInput, RecordSaleInput, StockService};
use lotkeeper_backend::services::AnalyticsService;
use lotkeeper_backend::{AppError, MemoryStore};
use rust_decimal::Decimal;
use shared::analytics::{ReportFilter, UNSPECIFIED_COLOR};
use shared::{NewProduct, Product};
use uuid::Uuid;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
}

async fn seeded(
    service: &StockService<MemoryStore>,
    name: &str,
    color: Option<&str>,
    unit_cost: &str,
) -> Product {
    service
        .record_investment(RecordInvestmentInput {
            product_id: None,
            new_product: Some(NewProduct {
                name: name.to_string(),
                category_id: None,
                currency_id: None,
                provider_id: None,
                color: color.map(str::to_string),
                price: dec("20.00"),
            }),
            is_new_version: false,
            quantity_added: 100,
            unit_cost: Some(dec(unit_cost)),
            total_cost: None,
            provider_id: None,
            investment_date: None,
            notes: None,
        })
        .await
        .unwrap()
        .product
}

async fn sell(
    service: &StockService<MemoryStore>,
    product_id: Uuid,
    seller_id: Uuid,
    quantity: i32,
    price: &str,
    commission: &str,
    day: u32,
) {
    service
        .record_sale(RecordSaleInput {
            product_id,
            seller_id,
            quantity_sold: quantity,
            sale_price: dec(price),
            commission: Some(dec(commission)),
            additional_expenses: None,
            product_version: None,
            sale_date: Some(date(day)),
        })
        .await
        .unwrap();
}

// ============================================================================
// Summary Tests
// ============================================================================

mod summary_tests {
    use super::*;

    #[tokio::test]
    async fn test_net_profit_formula() {
        let store = MemoryStore::new();
        let stock = StockService::new(store.clone());
        let analytics = AnalyticsService::new(store.clone());
        let seller = store.insert_user("Ana").await;
        let p = seeded(&stock, "Mug", Some("Blue"), "4.00").await;

        sell(&stock, p.id, seller.id, 3, "10.00", "2.00", 1).await;
        sell(&stock, p.id, seller.id, 2, "12.00", "1.00", 2).await;

        let summary = analytics.summary(&ReportFilter::default()).await.unwrap();

        assert_eq!(summary.sale_count, 2);
        assert_eq!(summary.units_sold, 5);
        assert_eq!(summary.total_revenue, dec("54.00"));
        assert_eq!(summary.total_commissions, dec("3.00"));
        assert_eq!(summary.total_costs, dec("20.00"));
        assert_eq!(summary.net_profit, dec("31.00"));
    }

    #[tokio::test]
    async fn test_cost_uses_current_purchase_price() {
        let store = MemoryStore::new();
        let stock = StockService::new(store.clone());
        let analytics = AnalyticsService::new(store.clone());
        let p = seeded(&stock, "Mug", None, "4.00").await;

        sell(&stock, p.id, Uuid::new_v4(), 5, "10.00", "0", 1).await;
        stock
            .record_investment(RecordInvestmentInput {
                product_id: Some(p.id),
                new_product: None,
                is_new_version: true,
                quantity_added: 10,
                unit_cost: Some(dec("6.00")),
                total_cost: None,
                provider_id: None,
                investment_date: None,
                notes: None,
            })
            .await
            .unwrap();

        let summary = analytics.summary(&ReportFilter::default()).await.unwrap();

        // The units came from the 4.00 lot but are costed at today's 6.00
        assert_eq!(summary.total_costs, dec("30.00"));
    }

    #[tokio::test]
    async fn test_date_filter_is_inclusive() {
        let store = MemoryStore::new();
        let stock = StockService::new(store.clone());
        let analytics = AnalyticsService::new(store.clone());
        let p = seeded(&stock, "Mug", None, "1.00").await;
        let seller = Uuid::new_v4();

        for day in [1, 5, 10, 15] {
            sell(&stock, p.id, seller, 1, "10.00", "0", day).await;
        }

        let filter = ReportFilter {
            start_date: Some(date(5)),
            end_date: Some(date(10)),
        };
        let summary = analytics.summary(&filter).await.unwrap();

        assert_eq!(summary.sale_count, 2);
        assert_eq!(summary.total_revenue, dec("20.00"));
    }

    #[tokio::test]
    async fn test_inverted_date_range_rejected() {
        let analytics = AnalyticsService::new(MemoryStore::new());

        let err = analytics
            .report(&ReportFilter {
                start_date: Some(date(10)),
                end_date: Some(date(1)),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_empty_store_reports_zeroes() {
        let analytics = AnalyticsService::new(MemoryStore::new());

        let report = analytics.report(&ReportFilter::default()).await.unwrap();

        assert_eq!(report.summary.sale_count, 0);
        assert_eq!(report.summary.net_profit, Decimal::ZERO);
        assert!(report.by_product.is_empty());
    }
}

// ============================================================================
// Breakdown Tests
// ============================================================================

mod breakdown_tests {
    use super::*;

    #[tokio::test]
    async fn test_breakdowns_sorted_by_revenue() {
        let store = MemoryStore::new();
        let stock = StockService::new(store.clone());
        let analytics = AnalyticsService::new(store.clone());
        let ana = store.insert_user("Ana").await;
        let ben = store.insert_user("Ben").await;
        let mug = seeded(&stock, "Mug", Some("Blue"), "1.00").await;
        let cap = seeded(&stock, "Cap", Some(" blue "), "1.00").await;
        let pin = seeded(&stock, "Pin", None, "1.00").await;

        sell(&stock, mug.id, ana.id, 1, "10.00", "0", 1).await;
        sell(&stock, cap.id, ben.id, 3, "10.00", "0", 1).await;
        sell(&stock, pin.id, ben.id, 2, "10.00", "0", 1).await;

        let filter = ReportFilter::default();

        let by_product = analytics.breakdown_by_product(&filter).await.unwrap();
        let labels: Vec<&str> = by_product.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Cap", "Pin", "Mug"]);

        let by_seller = analytics.breakdown_by_seller(&filter).await.unwrap();
        assert_eq!(by_seller[0].label, "Ben");
        assert_eq!(by_seller[0].summary.total_revenue, dec("50.00"));
        assert_eq!(by_seller[1].label, "Ana");

        let by_color = analytics.breakdown_by_color(&filter).await.unwrap();
        assert_eq!(by_color.len(), 2);
        assert_eq!(by_color[0].key, "blue");
        assert_eq!(by_color[0].summary.units_sold, 4);
        assert_eq!(by_color[1].key, UNSPECIFIED_COLOR);
    }

    #[tokio::test]
    async fn test_report_combines_all_views() {
        let store = MemoryStore::new();
        let stock = StockService::new(store.clone());
        let analytics = AnalyticsService::new(store.clone());
        let p = seeded(&stock, "Mug", Some("Green"), "2.00").await;

        sell(&stock, p.id, Uuid::new_v4(), 4, "5.00", "1.00", 3).await;

        let report = analytics.report(&ReportFilter::default()).await.unwrap();

        assert_eq!(report.summary.net_profit, dec("11.00"));
        assert_eq!(report.by_product.len(), 1);
        assert_eq!(report.by_seller.len(), 1);
        assert_eq!(report.by_color[0].key, "green");
    }
}
