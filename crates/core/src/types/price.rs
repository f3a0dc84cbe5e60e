//! Price helpers using decimal arithmetic.
//!
//! Prices come off the wire as JSON numbers and are held as
//! [`rust_decimal::Decimal`] so cart totals never accumulate float error.

use rust_decimal::Decimal;

/// Format a decimal amount as a dollar string (e.g. `$24.00`).
#[must_use]
pub fn format_price(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

/// Multiply a unit price by a quantity.
#[must_use]
pub fn line_amount(price: Decimal, quantity: u32) -> Decimal {
    price * Decimal::from(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price_pads_cents() {
        assert_eq!(format_price(Decimal::new(24, 0)), "$24.00");
        assert_eq!(format_price(Decimal::new(105, 1)), "$10.50");
    }

    #[test]
    fn test_format_price_rounds() {
        assert_eq!(format_price(Decimal::new(19_999, 3)), "$20.00");
    }

    #[test]
    fn test_line_amount() {
        assert_eq!(line_amount(Decimal::new(105, 1), 2), Decimal::new(21, 0));
        assert_eq!(line_amount(Decimal::new(3, 0), 0), Decimal::ZERO);
    }
}
