//! Property tests for the pure allocation and analytics rules

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::allocation::{
    available_for_shared_purchase, fifo_version_for_quantity, stock_after_sale_edit,
};
use shared::analytics::{build_report, ReportFilter, SaleFact};
use shared::VersionStockLot;
use uuid::Uuid;

fn lots_from(quantities: &[i32]) -> Vec<VersionStockLot> {
    let product_id = Uuid::new_v4();
    quantities
        .iter()
        .enumerate()
        .map(|(i, &stock_quantity)| VersionStockLot {
            id: Uuid::new_v4(),
            product_id,
            version: i as i32 + 1,
            stock_quantity,
            purchase_price: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
        .collect()
}

fn fact(quantity: i32, total: i64, commission: i64, price: i64, day: u32) -> SaleFact {
    SaleFact {
        sale_id: Uuid::new_v4(),
        product_id: Uuid::nil(),
        product_name: "Item".to_string(),
        color: None,
        seller_id: Uuid::nil(),
        seller_name: None,
        quantity_sold: quantity,
        total_amount: Decimal::from(total),
        commission: Decimal::from(commission),
        purchase_price: Decimal::from(price),
        sale_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// FIFO picks the lowest version that covers the request, or nothing
    #[test]
    fn prop_fifo_lowest_covering_version(
        quantities in prop::collection::vec(0i32..50, 0..8),
        request in 1i32..60,
    ) {
        let lots = lots_from(&quantities);
        let chosen = fifo_version_for_quantity(&lots, request);

        match chosen {
            Some(version) => {
                let lot = &lots[(version - 1) as usize];
                prop_assert!(lot.stock_quantity >= request);
                prop_assert!(lots[..(version - 1) as usize]
                    .iter()
                    .all(|l| l.stock_quantity < request));
            }
            None => prop_assert!(lots.iter().all(|l| l.stock_quantity < request)),
        }
    }

    /// Shared availability is never negative and never exceeds stock
    #[test]
    fn prop_availability_bounds(stock in 0i32..10_000, claimed in 0i64..20_000) {
        let available = available_for_shared_purchase(stock, claimed);
        prop_assert!(available >= 0);
        prop_assert!(available <= stock);
    }

    /// Editing a sale and editing it back restores the stock
    #[test]
    fn prop_sale_edit_reversible(stock in 0i32..1000, old in 1i32..100, new in 1i32..100) {
        if let Some(edited) = stock_after_sale_edit(stock, old, new) {
            prop_assert!(edited >= 0);
            prop_assert_eq!(stock_after_sale_edit(edited, new, old), Some(stock));
        } else {
            prop_assert!(new - old > stock);
        }
    }

    /// Breakdown totals add up to the summary
    #[test]
    fn prop_breakdowns_sum_to_summary(
        rows in prop::collection::vec((1i32..10, 0i64..500, 0i64..20, 0i64..30, 1u32..28), 0..20),
    ) {
        let facts: Vec<SaleFact> = rows
            .iter()
            .map(|&(q, t, c, p, d)| fact(q, t, c, p, d))
            .collect();
        let report = build_report(&facts, &ReportFilter::default()).unwrap();

        let revenue: Decimal = report.by_color.iter().map(|r| r.summary.total_revenue).sum();
        let profit: Decimal = report.by_seller.iter().map(|r| r.summary.net_profit).sum();
        prop_assert_eq!(revenue, report.summary.total_revenue);
        prop_assert_eq!(profit, report.summary.net_profit);
        prop_assert_eq!(report.summary.sale_count, facts.len() as i64);
    }
}
