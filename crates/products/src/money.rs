//! Money bounds shared by catalog prices, order lines and order totals.
//!
//! Amounts are stored as `NUMERIC(12, 2)` (prices) and `NUMERIC(14, 2)`
//! (totals); anything the columns would round or reject is refused here.

use rust_decimal::Decimal;

use shopdesk_core::{DomainError, DomainResult};

/// Decimal places kept for any amount.
pub const MONEY_SCALE: u32 = 2;

/// Largest unit or catalog price.
pub const MAX_PRICE: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, MONEY_SCALE);

/// Largest order total.
pub const MAX_TOTAL: Decimal = Decimal::from_parts(0x107A_3FFF, 0x5AF3, 0, false, MONEY_SCALE);

/// Check a price: non-negative, at most two decimal places, within [`MAX_PRICE`].
pub fn validate_price(price: Decimal) -> DomainResult<()> {
    if price < Decimal::ZERO {
        return Err(DomainError::validation("price cannot be negative"));
    }
    if price.normalize().scale() > MONEY_SCALE {
        return Err(DomainError::validation(format!(
            "price {price} has more than {MONEY_SCALE} decimal places"
        )));
    }
    if price > MAX_PRICE {
        return Err(DomainError::validation(format!("price exceeds {MAX_PRICE}")));
    }
    Ok(())
}

/// `unit_price × quantity`, refusing results that overflow or exceed [`MAX_TOTAL`].
pub fn line_amount(unit_price: Decimal, quantity: i64) -> DomainResult<Decimal> {
    unit_price
        .checked_mul(Decimal::from(quantity))
        .filter(|amount| *amount <= MAX_TOTAL)
        .ok_or_else(|| DomainError::validation("amount overflow"))
}

/// Sum of amounts under the same bound as [`line_amount`].
pub fn checked_total<I>(amounts: I) -> DomainResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| {
            acc.checked_add(amount).filter(|sum| *sum <= MAX_TOTAL)
        })
        .ok_or_else(|| DomainError::validation("amount overflow"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn bounds_match_column_precision() {
        assert_eq!(MAX_PRICE, dec!(9999999999.99));
        assert_eq!(MAX_TOTAL, dec!(999999999999.99));
    }

    #[test]
    fn price_accepts_two_places_and_trailing_zeros() {
        validate_price(dec!(15990)).unwrap();
        validate_price(dec!(0.99)).unwrap();
        validate_price(dec!(12.500)).unwrap();
        validate_price(MAX_PRICE).unwrap();
    }

    #[test]
    fn price_rejects_sub_cent_negative_and_oversized() {
        for bad in [dec!(0.005), dec!(-1), dec!(10000000000), Decimal::MAX] {
            assert!(
                matches!(validate_price(bad), Err(DomainError::Validation(_))),
                "{bad} accepted"
            );
        }
    }

    #[test]
    fn line_amount_refuses_overflow() {
        assert_eq!(line_amount(dec!(0.50), 3).unwrap(), dec!(1.50));
        assert!(line_amount(Decimal::MAX, 2).is_err());
        assert!(line_amount(MAX_PRICE, i64::MAX).is_err());
        assert!(line_amount(MAX_PRICE, 1000).is_err());
    }

    #[test]
    fn total_refuses_sum_past_bound() {
        assert_eq!(checked_total([dec!(1.10), dec!(2.20)]).unwrap(), dec!(3.30));
        assert_eq!(checked_total(Vec::new()).unwrap(), Decimal::ZERO);
        assert!(checked_total([MAX_TOTAL, dec!(0.01)]).is_err());
    }
}
