//! Sales analytics rollups
//!
//! Cost of goods uses the product's *current* purchase price, not the price of
//! the version lot a sale was taken from. Reports over products that have been
//! restocked at a new price are therefore approximate.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Label used when grouping products that have no color
pub const UNSPECIFIED_COLOR: &str = "unspecified";

/// One sale joined with the product and seller fields analytics needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleFact {
    pub sale_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub color: Option<String>,
    pub seller_id: Uuid,
    pub seller_name: Option<String>,
    pub quantity_sold: i32,
    pub total_amount: Decimal,
    pub commission: Decimal,
    /// Current purchase price of the product
    pub purchase_price: Decimal,
    pub sale_date: NaiveDate,
}

impl SaleFact {
    /// Units sold at the current purchase price, `None` on overflow
    pub fn cost(&self) -> Option<Decimal> {
        Decimal::from(self.quantity_sold).checked_mul(self.purchase_price)
    }
}

/// Inclusive date window for reports
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ReportFilter {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date.map_or(true, |start| date >= start)
            && self.end_date.map_or(true, |end| date <= end)
    }
}

/// Revenue, cost and profit totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub sale_count: i64,
    pub units_sold: i64,
    pub total_revenue: Decimal,
    pub total_commissions: Decimal,
    pub total_costs: Decimal,
    /// `total_revenue - total_costs - total_commissions`
    pub net_profit: Decimal,
}

impl SalesSummary {
    /// Fold one sale in; `None` if any money total overflows
    fn add(&mut self, fact: &SaleFact) -> Option<()> {
        let total_revenue = self.total_revenue.checked_add(fact.total_amount)?;
        let total_commissions = self.total_commissions.checked_add(fact.commission)?;
        let total_costs = self.total_costs.checked_add(fact.cost()?)?;
        let net_profit = total_revenue
            .checked_sub(total_costs)?
            .checked_sub(total_commissions)?;

        self.sale_count += 1;
        self.units_sold += i64::from(fact.quantity_sold);
        self.total_revenue = total_revenue;
        self.total_commissions = total_commissions;
        self.total_costs = total_costs;
        self.net_profit = net_profit;
        Some(())
    }
}

/// Summary for one group of a breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownRow {
    pub key: String,
    pub label: String,
    #[serde(flatten)]
    pub summary: SalesSummary,
}

/// Full analytics report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub summary: SalesSummary,
    pub by_product: Vec<BreakdownRow>,
    pub by_seller: Vec<BreakdownRow>,
    pub by_color: Vec<BreakdownRow>,
}

/// Grouping dimension for breakdown reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Breakdown {
    Product,
    Seller,
    Color,
}

impl Breakdown {
    fn key_and_label(&self, fact: &SaleFact) -> (String, String) {
        match self {
            Breakdown::Product => (fact.product_id.to_string(), fact.product_name.clone()),
            Breakdown::Seller => (
                fact.seller_id.to_string(),
                fact.seller_name
                    .clone()
                    .unwrap_or_else(|| fact.seller_id.to_string()),
            ),
            Breakdown::Color => {
                let color = fact
                    .color
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .unwrap_or(UNSPECIFIED_COLOR)
                    .to_lowercase();
                (color.clone(), color)
            }
        }
    }
}

/// Totals over every fact, or `None` if a money total overflows
pub fn summarize<'a>(facts: impl IntoIterator<Item = &'a SaleFact>) -> Option<SalesSummary> {
    let mut summary = SalesSummary::default();
    for fact in facts {
        summary.add(fact)?;
    }
    Some(summary)
}

/// Totals grouped by `dimension`, highest revenue first
pub fn breakdown(facts: &[SaleFact], dimension: Breakdown) -> Option<Vec<BreakdownRow>> {
    let mut groups: HashMap<String, BreakdownRow> = HashMap::new();

    for fact in facts {
        let (key, label) = dimension.key_and_label(fact);
        groups
            .entry(key.clone())
            .or_insert_with(|| BreakdownRow {
                key,
                label,
                summary: SalesSummary::default(),
            })
            .summary
            .add(fact)?;
    }

    let mut rows: Vec<BreakdownRow> = groups.into_values().collect();
    rows.sort_by(|a, b| {
        b.summary
            .total_revenue
            .cmp(&a.summary.total_revenue)
            .then_with(|| a.label.cmp(&b.label))
    });
    Some(rows)
}

/// Summary plus every breakdown for the facts inside `filter`
pub fn build_report(facts: &[SaleFact], filter: &ReportFilter) -> Option<AnalyticsReport> {
    let facts: Vec<SaleFact> = facts
        .iter()
        .filter(|f| filter.contains(f.sale_date))
        .cloned()
        .collect();

    Some(AnalyticsReport {
        summary: summarize(&facts)?,
        by_product: breakdown(&facts, Breakdown::Product)?,
        by_seller: breakdown(&facts, Breakdown::Seller)?,
        by_color: breakdown(&facts, Breakdown::Color)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(
        product: &str,
        color: Option<&str>,
        seller: Uuid,
        qty: i32,
        total: i64,
        commission: i64,
        cost: i64,
    ) -> SaleFact {
        SaleFact {
            sale_id: Uuid::new_v4(),
            product_id: Uuid::from_u128(product.bytes().fold(0u128, |acc, b| acc * 257 + u128::from(b))),
            product_name: product.to_string(),
            color: color.map(str::to_string),
            seller_id: seller,
            seller_name: None,
            quantity_sold: qty,
            total_amount: Decimal::from(total),
            commission: Decimal::from(commission),
            purchase_price: Decimal::from(cost),
            sale_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        }
    }

    #[test]
    fn net_profit_subtracts_costs_and_commissions() {
        let seller = Uuid::new_v4();
        let facts = vec![
            fact("mug", Some("red"), seller, 2, 100, 5, 20),
            fact("cap", None, seller, 1, 30, 0, 10),
        ];

        let summary = summarize(&facts).unwrap();
        assert_eq!(summary.sale_count, 2);
        assert_eq!(summary.units_sold, 3);
        assert_eq!(summary.total_revenue, Decimal::from(130));
        assert_eq!(summary.total_costs, Decimal::from(50));
        assert_eq!(summary.total_commissions, Decimal::from(5));
        assert_eq!(summary.net_profit, Decimal::from(75));
    }

    #[test]
    fn color_breakdown_groups_missing_and_case_variants() {
        let seller = Uuid::new_v4();
        let facts = vec![
            fact("mug", Some("Red"), seller, 1, 10, 0, 1),
            fact("cap", Some("red "), seller, 1, 20, 0, 1),
            fact("pen", None, seller, 1, 5, 0, 1),
            fact("bag", Some(""), seller, 1, 5, 0, 1),
        ];

        let rows = breakdown(&facts, Breakdown::Color).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, "red");
        assert_eq!(rows[0].summary.total_revenue, Decimal::from(30));
        assert_eq!(rows[1].key, UNSPECIFIED_COLOR);
        assert_eq!(rows[1].summary.sale_count, 2);
    }

    #[test]
    fn report_filter_is_inclusive() {
        let filter = ReportFilter {
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 1),
        };
        let seller = Uuid::new_v4();
        let mut late = fact("mug", None, seller, 1, 10, 0, 1);
        late.sale_date = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let facts = vec![fact("mug", None, seller, 1, 10, 0, 1), late];

        let report = build_report(&facts, &filter).unwrap();
        assert_eq!(report.summary.sale_count, 1);
        assert_eq!(report.by_product.len(), 1);
    }

    #[test]
    fn money_overflow_yields_none() {
        let seller = Uuid::new_v4();
        let mut big = fact("mug", None, seller, 2, 0, 0, 0);
        big.purchase_price = Decimal::MAX;
        assert_eq!(big.cost(), None);
        assert!(summarize([&big]).is_none());

        let mut rich = fact("cap", None, seller, 1, 0, 0, 0);
        rich.total_amount = Decimal::MAX;
        let facts = vec![rich.clone(), rich];
        assert!(summarize(&facts).is_none());
        assert!(breakdown(&facts, Breakdown::Product).is_none());
        assert!(build_report(&facts, &ReportFilter::default()).is_none());
    }
}
