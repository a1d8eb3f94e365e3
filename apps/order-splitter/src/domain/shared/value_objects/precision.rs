//! Fixed decimal precision for amounts and unit counts.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::DomainError;

/// Number of decimal places every emitted amount (or unit count) is fixed to.
///
/// All allocation arithmetic happens on [`Decimal`]; a `Precision` defines the
/// grid the results are snapped to. Truncation rounds toward zero, ceiling
/// rounds toward positive infinity, and one grid step is the minimal unit
/// (`10^-places`) used when handing out residuals.
///
/// A `Decimal` holds 28 significant digits, so the grid is exact only for
/// magnitudes whose integer digits plus `places` stay within that budget.
/// [`Precision::carries`] tells whether a value fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Precision(u32);

impl Precision {
    /// Largest scale a [`Decimal`] can carry.
    pub const MAX_PLACES: u32 = 28;

    /// Significant digits shared by the integer part and the decimals.
    pub const MAX_DIGITS: u32 = 28;

    /// Two decimal places (cents).
    pub const CENTS: Self = Self(2);

    /// Whole numbers only.
    pub const WHOLE: Self = Self(0);

    /// Create a precision of `places` decimal places.
    ///
    /// # Errors
    ///
    /// Returns error if `places` exceeds [`Precision::MAX_PLACES`].
    pub fn new(places: u32) -> Result<Self, DomainError> {
        if places > Self::MAX_PLACES {
            return Err(DomainError::invalid(
                "precision",
                format!("must be at most {}", Self::MAX_PLACES),
            ));
        }
        Ok(Self(places))
    }

    /// Number of decimal places.
    #[must_use]
    pub const fn places(self) -> u32 {
        self.0
    }

    /// The minimal unit at this precision, `10^-places`.
    #[must_use]
    pub fn unit(self) -> Decimal {
        Decimal::new(1, self.0)
    }

    /// Truncate toward zero to this precision.
    #[must_use]
    pub fn truncate(self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.0, RoundingStrategy::ToZero)
    }

    /// Round up toward positive infinity to this precision.
    #[must_use]
    pub fn ceil(self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(self.0, RoundingStrategy::ToPositiveInfinity)
    }

    /// Exclusive upper bound on magnitudes this grid keeps exact:
    /// `10^(MAX_DIGITS - places)`.
    #[must_use]
    pub fn capacity(self) -> Decimal {
        let digits = Self::MAX_DIGITS.saturating_sub(self.0);
        Decimal::try_from_i128_with_scale(10_i128.pow(digits), 0).unwrap_or(Decimal::MAX)
    }

    /// Whether `value` fits this grid without losing decimal places.
    #[must_use]
    pub fn carries(self, value: Decimal) -> bool {
        value.abs() < self.capacity()
    }

    /// Whether `value` already lies on this precision's grid.
    #[must_use]
    pub fn admits(self, value: Decimal) -> bool {
        self.truncate(value) == value
    }

    /// Render `value` truncated and zero-padded to exactly `places` digits.
    #[must_use]
    pub fn format(self, value: Decimal) -> String {
        let mut fixed = self.truncate(value);
        fixed.rescale(self.0);
        fixed.to_string()
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self::CENTS
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}dp", self.0)
    }
}

impl TryFrom<u32> for Precision {
    type Error = DomainError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    #[test_case(dec!(12.349), dec!(12.34) ; "drops extra digits")]
    #[test_case(dec!(12.3), dec!(12.3) ; "keeps shorter values")]
    #[test_case(dec!(0.009), dec!(0) ; "below one unit")]
    #[test_case(dec!(-1.239), dec!(-1.23) ; "negative toward zero")]
    fn truncate_cents(input: Decimal, expected: Decimal) {
        assert_eq!(Precision::CENTS.truncate(input), expected);
    }

    #[test_case(dec!(12.341), dec!(12.35) ; "rounds up")]
    #[test_case(dec!(12.34), dec!(12.34) ; "exact stays")]
    #[test_case(dec!(0.0001), dec!(0.01) ; "tiny becomes one unit")]
    fn ceil_cents(input: Decimal, expected: Decimal) {
        assert_eq!(Precision::CENTS.ceil(input), expected);
    }

    #[test]
    fn unit_is_smallest_step() {
        assert_eq!(Precision::CENTS.unit(), dec!(0.01));
        assert_eq!(Precision::WHOLE.unit(), dec!(1));
        assert_eq!(Precision::new(4).unwrap().unit(), dec!(0.0001));
    }

    #[test]
    fn format_pads_and_truncates() {
        assert_eq!(Precision::CENTS.format(dec!(60)), "60.00");
        assert_eq!(Precision::CENTS.format(dec!(3.999)), "3.99");
        assert_eq!(Precision::WHOLE.format(dec!(7.8)), "7");
        assert_eq!(Precision::new(4).unwrap().format(dec!(0.5)), "0.5000");
    }

    #[test]
    fn admits_only_grid_values() {
        assert!(Precision::CENTS.admits(dec!(10.25)));
        assert!(Precision::CENTS.admits(dec!(10.250)));
        assert!(!Precision::CENTS.admits(dec!(10.251)));
    }

    #[test_case(0, dec!(9999999999999999999999999999), dec!(10000000000000000000000000000) ; "whole numbers")]
    #[test_case(2, dec!(99999999999999999999999999.99), dec!(100000000000000000000000000) ; "cents")]
    #[test_case(28, dec!(0.9999999999999999999999999999), dec!(1) ; "all decimals")]
    fn capacity_leaves_room_for_every_place(
        places: u32,
        largest: Decimal,
        first_too_large: Decimal,
    ) {
        let precision = Precision::new(places).unwrap();
        assert!(precision.carries(largest));
        assert!(precision.carries(-largest));
        assert!(!precision.carries(first_too_large));
        assert_eq!(precision.capacity(), first_too_large);
    }

    #[test]
    fn large_values_keep_every_place() {
        let precision = Precision::new(10).unwrap();
        let value = dec!(123456789012345678.9012345678);
        assert!(precision.carries(value));
        assert_eq!(precision.format(value), "123456789012345678.9012345678");
        assert!(!Precision::new(28).unwrap().carries(dec!(1000000000)));
    }

    #[test]
    fn rejects_scale_beyond_decimal() {
        assert!(Precision::new(28).is_ok());
        assert!(Precision::new(29).is_err());
    }
}
