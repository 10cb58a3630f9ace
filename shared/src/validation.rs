//! Validation utilities for stock requests

use std::collections::HashSet;

use rust_decimal::Decimal;

use crate::models::PartnerShare;

/// Validate that a unit quantity is strictly positive
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be greater than zero");
    }
    Ok(())
}

/// Validate that a money amount is not negative
pub fn validate_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount cannot be negative");
    }
    Ok(())
}

/// Validate the partner list of a shared purchase
pub fn validate_partners(partners: &[PartnerShare]) -> Result<(), &'static str> {
    if partners.is_empty() {
        return Err("At least one partner is required");
    }
    if partners.iter().any(|p| p.quantity <= 0) {
        return Err("Partner quantities must be greater than zero");
    }
    let mut seen = HashSet::with_capacity(partners.len());
    if !partners.iter().all(|p| seen.insert(p.user_id)) {
        return Err("Each partner may appear only once");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(Decimal::ZERO).is_ok());
        assert!(validate_amount(Decimal::new(-1, 2)).is_err());
    }

    #[test]
    fn test_validate_partners() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert!(validate_partners(&[]).is_err());
        assert!(validate_partners(&[PartnerShare { user_id: a, quantity: 0 }]).is_err());
        assert!(validate_partners(&[
            PartnerShare { user_id: a, quantity: 1 },
            PartnerShare { user_id: a, quantity: 2 },
        ])
        .is_err());
        assert!(validate_partners(&[
            PartnerShare { user_id: a, quantity: 1 },
            PartnerShare { user_id: b, quantity: 2 },
        ])
        .is_ok());
    }
}
