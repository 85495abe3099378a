//! Sale-price derivation.
//!
//! The sale price is never stored input. It is always derived from the
//! purchase price and the profit margin at write time, so a price update
//! can never leave a stale sale price behind.

use rust_decimal::{Decimal, RoundingStrategy};

/// Margin percentage applied when a product carries no override (20.00%).
pub const DEFAULT_PROFIT_MARGIN: Decimal = Decimal::from_parts(2000, 0, 0, false, 2);

/// Derive the sale price: `purchase * (1 + margin / 100)`, rounded to two
/// decimal places with midpoints going away from zero.
///
/// Inputs arrive pre-validated against [`crate::validate::MAX_PRICE`] and
/// [`crate::validate::MAX_PROFIT_MARGIN`], which keeps the product well
/// inside the `Decimal` range.
pub fn derive_sale_price(purchase_price: Decimal, profit_margin: Decimal) -> Decimal {
    let factor = Decimal::ONE + profit_margin / Decimal::ONE_HUNDRED;
    (purchase_price * factor).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn dec(raw: &str) -> Decimal {
        raw.parse().unwrap()
    }

    #[test]
    fn applies_twenty_percent_margin() {
        assert_eq!(derive_sale_price(dec("100.00"), dec("20")), dec("120.00"));
    }

    #[test]
    fn rounds_to_two_decimal_places() {
        // 49.99 * 1.20 = 59.988
        assert_eq!(derive_sale_price(dec("49.99"), dec("20")), dec("59.99"));
    }

    #[test]
    fn rounds_midpoints_away_from_zero() {
        // 6.10 * 1.25 = 7.625; half-to-even would give 7.62
        assert_eq!(derive_sale_price(dec("6.10"), dec("25")), dec("7.63"));
    }

    #[test]
    fn zero_margin_returns_purchase_price() {
        assert_eq!(derive_sale_price(dec("15.40"), Decimal::ZERO), dec("15.40"));
    }

    #[test]
    fn default_margin_is_twenty_percent() {
        assert_eq!(DEFAULT_PROFIT_MARGIN, dec("20.00"));
    }

    #[test]
    fn widest_accepted_inputs_stay_in_range() {
        // 9999999999.99 * 1000.9999 = 10009998999989.990001
        let sale = derive_sale_price(
            crate::validate::MAX_PRICE,
            crate::validate::MAX_PROFIT_MARGIN,
        );
        assert_eq!(sale, dec("10009998999989.99"));
    }

    // Ranges cover the whole domain validation can accept: prices up to
    // 9999999999.99 and margins up to 99999.99, both in cents.
    proptest! {
        #[test]
        fn sale_price_never_undercuts_purchase(
            cents in 1i64..=999_999_999_999,
            margin_cents in 0i64..=9_999_999,
        ) {
            let purchase = Decimal::new(cents, 2);
            let sale = derive_sale_price(purchase, Decimal::new(margin_cents, 2));
            prop_assert!(sale >= purchase);
        }

        #[test]
        fn sale_price_has_at_most_two_decimal_places(
            cents in 1i64..=999_999_999_999,
            margin_cents in 0i64..=9_999_999,
        ) {
            let sale = derive_sale_price(Decimal::new(cents, 2), Decimal::new(margin_cents, 2));
            prop_assert!(sale.scale() <= 2);
        }

        #[test]
        fn zero_margin_is_identity(cents in 1i64..=999_999_999_999) {
            let purchase = Decimal::new(cents, 2);
            prop_assert_eq!(derive_sale_price(purchase, Decimal::ZERO), purchase);
        }
    }
}
