//! Stock allocation rules
//!
//! Pure functions shared by the backend ledgers and their tests. Nothing here
//! touches storage; callers pass in rows they already hold locks on.

use rust_decimal::Decimal;

use crate::models::{PartnerShare, VersionStockLot};

/// Lowest version whose lot alone holds at least `quantity` units
///
/// A sale is never split across lots: with lots v1(2) and v2(10), a request
/// for 5 resolves to v2 even though v1 is older.
pub fn fifo_version_for_quantity(lots: &[VersionStockLot], quantity: i32) -> Option<i32> {
    lots.iter()
        .filter(|lot| lot.covers(quantity))
        .map(|lot| lot.version)
        .min()
}

/// Units of a product that can still be handed out as shared inventory
///
/// Quantity already shared counts as reserved regardless of which version it
/// references. Never negative.
pub fn available_for_shared_purchase(product_stock: i32, shared_total: i64) -> i32 {
    let available = i64::from(product_stock) - shared_total;
    available.clamp(0, i64::from(i32::MAX)) as i32
}

/// Sum of partner quantities in a shared purchase
pub fn partner_total(partners: &[PartnerShare]) -> i64 {
    partners.iter().map(|p| i64::from(p.quantity)).sum()
}

/// `quantity * sale_price + additional_expenses`, or `None` if it overflows
pub fn sale_total_amount(
    quantity: i32,
    sale_price: Decimal,
    additional_expenses: Decimal,
) -> Option<Decimal> {
    Decimal::from(quantity)
        .checked_mul(sale_price)?
        .checked_add(additional_expenses)
}

/// Version number a restock at a new price point opens
pub fn next_version(current: i32) -> i32 {
    current + 1
}

/// Aggregate stock after changing a sale's quantity from `old_quantity` to
/// `new_quantity`, or `None` if it would go negative
pub fn stock_after_sale_edit(stock: i32, old_quantity: i32, new_quantity: i32) -> Option<i32> {
    let delta = new_quantity - old_quantity;
    let next = stock.checked_sub(delta)?;
    (next >= 0).then_some(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn lot(version: i32, stock_quantity: i32) -> VersionStockLot {
        VersionStockLot {
            id: Uuid::new_v4(),
            product_id: Uuid::nil(),
            version,
            stock_quantity,
            purchase_price: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn fifo_skips_lots_that_cannot_cover_the_whole_quantity() {
        let lots = vec![lot(1, 2), lot(2, 10)];
        assert_eq!(fifo_version_for_quantity(&lots, 5), Some(2));
        assert_eq!(fifo_version_for_quantity(&lots, 2), Some(1));
    }

    #[test]
    fn fifo_does_not_split_across_lots() {
        let lots = vec![lot(1, 4), lot(2, 4)];
        assert_eq!(fifo_version_for_quantity(&lots, 6), None);
    }

    #[test]
    fn fifo_is_independent_of_input_order() {
        let lots = vec![lot(3, 9), lot(1, 9), lot(2, 9)];
        assert_eq!(fifo_version_for_quantity(&lots, 9), Some(1));
    }

    #[test]
    fn shared_availability_is_clamped_at_zero() {
        assert_eq!(available_for_shared_purchase(10, 4), 6);
        assert_eq!(available_for_shared_purchase(10, 10), 0);
        // Aggregate stock can drop below the shared total after sales
        assert_eq!(available_for_shared_purchase(3, 10), 0);
    }

    #[test]
    fn sale_total_includes_additional_expenses() {
        let total = sale_total_amount(3, Decimal::new(1050, 2), Decimal::new(200, 2));
        assert_eq!(total, Some(Decimal::new(3350, 2)));
    }

    #[test]
    fn sale_total_overflow_is_none() {
        assert_eq!(sale_total_amount(10, Decimal::MAX, Decimal::ZERO), None);
        assert_eq!(sale_total_amount(1, Decimal::MAX, Decimal::ONE), None);
        assert_eq!(
            sale_total_amount(1, Decimal::MAX, Decimal::ZERO),
            Some(Decimal::MAX)
        );
    }

    #[test]
    fn sale_edit_rejects_negative_stock() {
        assert_eq!(stock_after_sale_edit(5, 3, 8), Some(0));
        assert_eq!(stock_after_sale_edit(5, 3, 9), None);
        assert_eq!(stock_after_sale_edit(5, 3, 1), Some(7));
    }
}
