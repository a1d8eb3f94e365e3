//! Fractional rates: transaction fees, volatility buffers and model weights.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::DomainError;

/// A rate in `[0, 1)`.
///
/// Used for broker fees and the volatility buffer. The upper bound is
/// exclusive so that `1 - rate` is always a positive divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Rate(Decimal);

impl Rate {
    /// Zero rate (no fee, no buffer).
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a rate.
    ///
    /// # Errors
    ///
    /// Returns error if `value` is negative or not strictly below one.
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value < Decimal::ZERO || value >= Decimal::ONE {
            return Err(DomainError::invalid("rate", "must be >= 0 and < 1"));
        }
        Ok(Self(value))
    }

    /// Get the inner Decimal value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// `1 - rate`, always in `(0, 1]`.
    #[must_use]
    pub fn complement(&self) -> Decimal {
        Decimal::ONE - self.0
    }

    /// Returns true if this rate is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Default for Rate {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Rate {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rate> for Decimal {
    fn from(value: Rate) -> Self {
        value.0
    }
}

/// A model portfolio weight in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Weight(Decimal);

impl Weight {
    /// Zero weight: the product is in the model but should not be held.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Full weight.
    pub const FULL: Self = Self(Decimal::ONE);

    /// Create a weight.
    ///
    /// # Errors
    ///
    /// Returns error if `value` lies outside `[0, 1]`.
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value < Decimal::ZERO || value > Decimal::ONE {
            return Err(DomainError::invalid("weight", "must be between 0 and 1"));
        }
        Ok(Self(value))
    }

    /// Get the inner Decimal value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Returns true if the weight is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Weight {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Weight> for Decimal {
    fn from(value: Weight) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rate_bounds() {
        assert!(Rate::new(dec!(0)).is_ok());
        assert!(Rate::new(dec!(0.999)).is_ok());
        assert!(Rate::new(dec!(1)).is_err());
        assert!(Rate::new(dec!(-0.01)).is_err());
    }

    #[test]
    fn rate_complement() {
        let fee = Rate::new(dec!(0.02)).unwrap();
        assert_eq!(fee.complement(), dec!(0.98));
        assert_eq!(Rate::ZERO.complement(), Decimal::ONE);
    }

    #[test]
    fn weight_bounds_are_inclusive() {
        assert!(Weight::new(dec!(0)).is_ok());
        assert!(Weight::new(dec!(1)).is_ok());
        assert!(Weight::new(dec!(1.0001)).is_err());
        assert!(Weight::new(dec!(-0.5)).is_err());
    }

    #[test]
    fn weight_positive() {
        assert!(!Weight::ZERO.is_positive());
        assert!(Weight::FULL.is_positive());
    }

    #[test]
    fn rate_serde_rejects_out_of_range() {
        let ok: Rate = serde_json::from_str("\"0.03\"").unwrap();
        assert_eq!(ok.value(), dec!(0.03));
        assert!(serde_json::from_str::<Rate>("\"1.5\"").is_err());
    }
}
