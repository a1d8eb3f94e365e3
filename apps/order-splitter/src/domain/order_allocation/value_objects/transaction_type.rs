//! Transaction type labels and redemption size classification.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::Rate;

/// Label attached to each goal result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// Any investment order.
    #[serde(rename = "Investment")]
    Investment,
    /// Redemption of the entire portfolio value (or more).
    #[serde(rename = "Full Redemption")]
    FullRedemption,
    /// Redemption below the portfolio value, no buffer supplied.
    #[serde(rename = "Partial Redemption")]
    PartialRedemption,
    /// Redemption below the volatility-buffer threshold.
    #[serde(rename = "Small Redemption")]
    SmallRedemption,
    /// Redemption at or above the volatility-buffer threshold.
    #[serde(rename = "Big Redemption")]
    BigRedemption,
}

impl TransactionType {
    /// Wire label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Investment => "Investment",
            Self::FullRedemption => "Full Redemption",
            Self::PartialRedemption => "Partial Redemption",
            Self::SmallRedemption => "Small Redemption",
            Self::BigRedemption => "Big Redemption",
        }
    }

    /// Classify a redemption by its size relative to the portfolio.
    ///
    /// With a positive buffer, an order at or above
    /// `portfolio_value * (1 - buffer)` is big enough that market moves
    /// could turn it into a full exit.
    #[must_use]
    pub fn classify_redemption(
        order_amount: Decimal,
        portfolio_value: Decimal,
        volatility_buffer: Option<Rate>,
    ) -> Self {
        if order_amount >= portfolio_value {
            return Self::FullRedemption;
        }
        match volatility_buffer {
            Some(buffer) if !buffer.is_zero() => {
                let threshold = portfolio_value * buffer.complement();
                if order_amount < threshold {
                    Self::SmallRedemption
                } else {
                    Self::BigRedemption
                }
            }
            _ => Self::PartialRedemption,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    fn buffer(v: Decimal) -> Option<Rate> {
        Some(Rate::new(v).unwrap())
    }

    #[test_case(dec!(1000), None, TransactionType::FullRedemption ; "whole portfolio")]
    #[test_case(dec!(1200), buffer(dec!(0.03)), TransactionType::FullRedemption ; "more than portfolio")]
    #[test_case(dec!(970), buffer(dec!(0.03)), TransactionType::BigRedemption ; "exactly at threshold")]
    #[test_case(dec!(969.99), buffer(dec!(0.03)), TransactionType::SmallRedemption ; "one cent below threshold")]
    #[test_case(dec!(500), None, TransactionType::PartialRedemption ; "no buffer")]
    #[test_case(dec!(999), buffer(dec!(0)), TransactionType::PartialRedemption ; "zero buffer")]
    fn classify(amount: Decimal, buf: Option<Rate>, expected: TransactionType) {
        assert_eq!(
            TransactionType::classify_redemption(amount, dec!(1000), buf),
            expected
        );
    }

    #[test]
    fn labels_match_wire_format() {
        let json = serde_json::to_string(&TransactionType::BigRedemption).unwrap();
        assert_eq!(json, "\"Big Redemption\"");
        assert_eq!(TransactionType::Investment.to_string(), "Investment");
    }
}
