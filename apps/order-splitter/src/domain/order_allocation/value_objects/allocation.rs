//! Per-product allocation and its compliance tag.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::Ticker;

/// Side of an emitted trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeDirection {
    /// Purchase.
    Buy,
    /// Sale.
    Sell,
}

impl TradeDirection {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable code of a business-rule breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    /// First purchase below the initial investment minimum.
    MinInvestmentViolation,
    /// Purchase of a held product below the top-up minimum.
    MinTopupViolation,
    /// Sale below the redemption minimum.
    MinRedemptionViolation,
    /// Partial sale leaving less than the holding minimum.
    MinHoldingViolation,
}

impl ViolationCode {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MinInvestmentViolation => "MIN_INVESTMENT_VIOLATION",
            Self::MinTopupViolation => "MIN_TOPUP_VIOLATION",
            Self::MinRedemptionViolation => "MIN_REDEMPTION_VIOLATION",
            Self::MinHoldingViolation => "MIN_HOLDING_VIOLATION",
        }
    }

    /// Human-readable explanation sent alongside the code.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::MinInvestmentViolation => {
                "Cannot trade this ticker because it breaches the minimum initial investment amount"
            }
            Self::MinTopupViolation => {
                "Cannot trade this ticker because it breaches the minimum topup amount"
            }
            Self::MinRedemptionViolation => {
                "Cannot trade this ticker because it breaches the minimum redemption amount"
            }
            Self::MinHoldingViolation => {
                "Cannot trade this ticker because the remaining holding would breach the minimum holding amount"
            }
        }
    }
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A flagged breach: code plus message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Violation code.
    pub code: ViolationCode,
    /// Human-readable message.
    pub message: String,
}

impl From<ViolationCode> for Violation {
    fn from(code: ViolationCode) -> Self {
        Self {
            code,
            message: code.message().to_string(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Outcome of the minimum checks for one allocation.
///
/// Violations are flagged and kept: the allocation is emitted either way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Compliance {
    /// Meets every minimum as computed.
    #[default]
    Clean,
    /// Was below its minimum and the repair pass lifted it.
    Cured,
    /// Breaches a minimum.
    Violated(Violation),
}

impl Compliance {
    /// The violation, if any.
    #[must_use]
    pub const fn violation(&self) -> Option<&Violation> {
        match self {
            Self::Violated(v) => Some(v),
            Self::Clean | Self::Cured => None,
        }
    }

    /// Returns true if a violation is flagged.
    #[must_use]
    pub const fn is_violated(&self) -> bool {
        matches!(self, Self::Violated(_))
    }
}

/// One product's share of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Product ticker.
    pub ticker: Ticker,
    /// Trade side.
    pub direction: TradeDirection,
    /// Ideal net target (shortfall, overweight, or forced exit value).
    pub ideal: Decimal,
    /// Target grossed up for fees.
    pub fee_adjusted: Decimal,
    /// Gross amount at amount precision.
    pub gross: Decimal,
    /// Unit count at unit precision.
    pub units: Decimal,
    /// Smallest gross that clears the applicable minimum, if one binds.
    pub required_gross: Option<Decimal>,
    /// Minimum-check outcome.
    pub compliance: Compliance,
}

impl Allocation {
    /// Violation flagged on this allocation, if any.
    #[must_use]
    pub const fn violation(&self) -> Option<&Violation> {
        self.compliance.violation()
    }
}
