//! Orders, holdings and model targets.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::product::Product;
use crate::domain::shared::{DomainError, Precision, Rate, Weight};

/// Whether cash flows into or out of the goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    /// Cash is invested into the model portfolio.
    Investment,
    /// Cash is raised by selling holdings.
    Redemption,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Investment => write!(f, "investment"),
            Self::Redemption => write!(f, "redemption"),
        }
    }
}

/// A current position in the goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    /// Product reference.
    pub product: Product,
    /// Units held.
    pub units: Decimal,
    /// Market value of the position.
    pub value: Decimal,
}

impl Holding {
    /// Create a holding.
    ///
    /// # Errors
    ///
    /// Returns error if units or value are negative.
    pub fn new(product: Product, units: Decimal, value: Decimal) -> Result<Self, DomainError> {
        if units < Decimal::ZERO || value < Decimal::ZERO {
            return Err(DomainError::invalid(
                format!("holding ({})", product.ticker()),
                "units and value must be >= 0",
            ));
        }
        Ok(Self {
            product,
            units,
            value,
        })
    }

    /// A zero-value position counts as not held.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.value > Decimal::ZERO
    }
}

/// A product's target weight in the model portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelTarget {
    /// Product reference.
    pub product: Product,
    /// Target weight.
    pub weight: Weight,
}

impl ModelTarget {
    /// Create a model target.
    #[must_use]
    pub const fn new(product: Product, weight: Weight) -> Self {
        Self { product, weight }
    }
}

/// One goal's order, ready for allocation.
///
/// Holdings and targets keep their input order; allocation output follows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    direction: OrderDirection,
    amount: Decimal,
    amount_precision: Precision,
    unit_precision: Precision,
    holdings: Vec<Holding>,
    targets: Vec<ModelTarget>,
    volatility_buffer: Option<Rate>,
}

impl Order {
    /// Create an order with no holdings or targets yet.
    ///
    /// # Errors
    ///
    /// Returns error if the amount is not positive, does not fit
    /// `amount_precision`, or is too large for that grid to stay exact.
    pub fn new(
        direction: OrderDirection,
        amount: Decimal,
        amount_precision: Precision,
        unit_precision: Precision,
    ) -> Result<Self, DomainError> {
        if amount <= Decimal::ZERO {
            return Err(DomainError::invalid("orderAmount", "must be greater than 0"));
        }
        if !amount_precision.admits(amount) {
            return Err(DomainError::PrecisionExceeded {
                field: "orderAmount".to_string(),
                max_places: amount_precision.places(),
            });
        }
        if !amount_precision.carries(amount) {
            return Err(DomainError::invalid(
                "orderAmount",
                format!("too large for {amount_precision}"),
            ));
        }
        Ok(Self {
            direction,
            amount,
            amount_precision,
            unit_precision,
            holdings: Vec::new(),
            targets: Vec::new(),
            volatility_buffer: None,
        })
    }

    /// Set current holdings.
    #[must_use]
    pub fn with_holdings(mut self, holdings: Vec<Holding>) -> Self {
        self.holdings = holdings;
        self
    }

    /// Set model targets.
    #[must_use]
    pub fn with_targets(mut self, targets: Vec<ModelTarget>) -> Self {
        self.targets = targets;
        self
    }

    /// Set the volatility buffer used to size redemptions.
    #[must_use]
    pub fn with_volatility_buffer(mut self, buffer: Option<Rate>) -> Self {
        self.volatility_buffer = buffer;
        self
    }

    /// Order direction.
    #[must_use]
    pub const fn direction(&self) -> OrderDirection {
        self.direction
    }

    /// Gross order amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// Precision of emitted amounts.
    #[must_use]
    pub const fn amount_precision(&self) -> Precision {
        self.amount_precision
    }

    /// Precision of emitted unit counts.
    #[must_use]
    pub const fn unit_precision(&self) -> Precision {
        self.unit_precision
    }

    /// Current holdings, input order.
    #[must_use]
    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    /// Model targets, input order.
    #[must_use]
    pub fn targets(&self) -> &[ModelTarget] {
        &self.targets
    }

    /// Volatility buffer, if supplied.
    #[must_use]
    pub const fn volatility_buffer(&self) -> Option<Rate> {
        self.volatility_buffer
    }

    /// Total market value of all holdings.
    #[must_use]
    pub fn holdings_value(&self) -> Decimal {
        self.checked_holdings_value().unwrap_or(Decimal::MAX)
    }

    /// Total market value of all holdings, `None` if the sum overflows.
    #[must_use]
    pub fn checked_holdings_value(&self) -> Option<Decimal> {
        self.holdings
            .iter()
            .try_fold(Decimal::ZERO, |total, h| total.checked_add(h.value))
    }
}
