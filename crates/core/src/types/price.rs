//! Type-safe price representation using decimal arithmetic.
//!
//! Shopify transports money as decimal strings. [`Price`] is the validated,
//! non-negative form used when writing a variant price back to the Admin API.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while parsing a price.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("Price must be a number")]
    NotANumber,
    /// The input is below zero.
    #[error("Price must not be negative")]
    Negative,
}

/// A non-negative price in the shop currency's standard unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Parse user input into a price.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::NotANumber` for anything that is not a plain
    /// decimal, and `PriceError::Negative` for amounts below zero.
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let amount = Decimal::from_str(input.trim()).map_err(|_| PriceError::NotANumber)?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Render with exactly two decimal places, rounding half away from zero.
    ///
    /// This is the wire format for `ProductVariantsBulkInput.price`.
    #[must_use]
    pub fn to_fixed_2(&self) -> String {
        let mut rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        rounded.to_string()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fixed_2())
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Format a decimal amount string as US dollars (e.g. `$1,234.50`).
///
/// Unparseable input is echoed back behind a dollar sign.
#[must_use]
pub fn format_usd(amount: &str) -> String {
    let Ok(value) = Decimal::from_str(amount.trim()) else {
        return format!("${amount}");
    };
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    let text = rounded.abs().to_string();
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{cents}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_pads_to_two_places() {
        assert_eq!(Price::parse("19.9").unwrap().to_fixed_2(), "19.90");
        assert_eq!(Price::parse("5").unwrap().to_fixed_2(), "5.00");
        assert_eq!(Price::parse("0").unwrap().to_fixed_2(), "0.00");
    }

    #[test]
    fn test_price_rounds_half_away_from_zero() {
        assert_eq!(Price::parse("10.005").unwrap().to_fixed_2(), "10.01");
        assert_eq!(Price::parse("10.004").unwrap().to_fixed_2(), "10.00");
    }

    #[test]
    fn test_price_rejects_negative_and_garbage() {
        assert_eq!(Price::parse("-1"), Err(PriceError::Negative));
        assert_eq!(Price::parse("abc"), Err(PriceError::NotANumber));
        assert_eq!(Price::parse(""), Err(PriceError::NotANumber));
    }

    #[test]
    fn test_format_usd_groups_thousands() {
        assert_eq!(format_usd("1234.5"), "$1,234.50");
        assert_eq!(format_usd("999"), "$999.00");
        assert_eq!(format_usd("1000000"), "$1,000,000.00");
        assert_eq!(format_usd("-12.3"), "-$12.30");
        assert_eq!(format_usd("n/a"), "$n/a");
    }
}
