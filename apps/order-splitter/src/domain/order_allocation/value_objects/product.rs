//! Product reference data: price, fee and trade minimums.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{DomainError, Precision, Rate, Ticker};

/// A minimum expressed both as an amount and as a unit count.
///
/// A trade satisfies the minimum only if it clears both thresholds. Zero
/// thresholds never bind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Minimum {
    /// Minimum amount.
    pub amount: Decimal,
    /// Minimum units.
    pub units: Decimal,
}

impl Minimum {
    /// No minimum.
    pub const NONE: Self = Self {
        amount: Decimal::ZERO,
        units: Decimal::ZERO,
    };

    /// Create a minimum.
    #[must_use]
    pub const fn new(amount: Decimal, units: Decimal) -> Self {
        Self { amount, units }
    }

    /// Amount-only minimum.
    #[must_use]
    pub const fn amount_only(amount: Decimal) -> Self {
        Self::new(amount, Decimal::ZERO)
    }

    /// The binding amount threshold at `price`: `max(amount, units * price)`.
    #[must_use]
    pub fn threshold(&self, price: Decimal) -> Decimal {
        self.checked_threshold(price).unwrap_or(Decimal::MAX)
    }

    /// Like [`Minimum::threshold`], but `None` when `units * price`
    /// overflows.
    #[must_use]
    pub fn checked_threshold(&self, price: Decimal) -> Option<Decimal> {
        self.units
            .checked_mul(price)
            .map(|value| self.amount.max(value))
    }

    /// Whether an `(amount, units)` pair falls below either threshold.
    #[must_use]
    pub fn is_breached_by(&self, amount: Decimal, units: Decimal) -> bool {
        amount < self.amount || units < self.units
    }
}

/// The eight per-product minimums, grouped by the trade they constrain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeMinimums {
    /// First purchase of a product not currently held.
    pub initial_investment: Minimum,
    /// Purchase of a product already held.
    pub top_up: Minimum,
    /// Any sale.
    pub redemption: Minimum,
    /// What must remain after a partial sale.
    pub holding: Minimum,
}

impl TradeMinimums {
    /// Minimums that gate purchases, initial investment first.
    pub fn purchases(&self) -> impl Iterator<Item = &Minimum> {
        [&self.initial_investment, &self.top_up].into_iter()
    }

    /// Minimums that gate sales, redemption first.
    pub fn sales(&self) -> impl Iterator<Item = &Minimum> {
        [&self.redemption, &self.holding].into_iter()
    }
}

/// Immutable product reference supplied with every holding and model item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    ticker: Ticker,
    price: Decimal,
    fee: Rate,
    minimums: TradeMinimums,
}

impl Product {
    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns error if the market price is not strictly positive.
    pub fn new(ticker: Ticker, price: Decimal, fee: Rate) -> Result<Self, DomainError> {
        if price <= Decimal::ZERO {
            return Err(DomainError::invalid(
                format!("marketPrice ({ticker})"),
                "must be greater than 0",
            ));
        }
        Ok(Self {
            ticker,
            price,
            fee,
            minimums: TradeMinimums::default(),
        })
    }

    /// Attach trade minimums.
    #[must_use]
    pub fn with_minimums(mut self, minimums: TradeMinimums) -> Self {
        self.minimums = minimums;
        self
    }

    /// Product ticker.
    #[must_use]
    pub const fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    /// Market price per unit.
    #[must_use]
    pub const fn price(&self) -> Decimal {
        self.price
    }

    /// Broker fee rate.
    #[must_use]
    pub const fn fee(&self) -> Rate {
        self.fee
    }

    /// Trade minimums.
    #[must_use]
    pub const fn minimums(&self) -> &TradeMinimums {
        &self.minimums
    }

    /// Gross amount that nets `net` after the fee: `net / (1 - fee)`.
    #[must_use]
    pub fn gross_for_net(&self, net: Decimal) -> Decimal {
        self.checked_gross_for_net(net).unwrap_or(Decimal::MAX)
    }

    /// Like [`Product::gross_for_net`], but `None` on overflow.
    #[must_use]
    pub fn checked_gross_for_net(&self, net: Decimal) -> Option<Decimal> {
        net.checked_div(self.fee.complement())
    }

    /// Amount that actually reaches the portfolio: `gross * (1 - fee)`.
    #[must_use]
    pub fn net_of_fee(&self, gross: Decimal) -> Decimal {
        gross * self.fee.complement()
    }

    /// Whole units an `amount` buys at this price, truncated to `precision`.
    #[must_use]
    pub fn units_for(&self, amount: Decimal, precision: Precision) -> Decimal {
        precision.truncate(amount / self.price)
    }

    /// Smallest gross purchase that satisfies `minimum` after fees,
    /// rounded up to `precision`.
    ///
    /// Returns `None` when the minimum does not bind.
    #[must_use]
    pub fn required_gross(&self, minimum: &Minimum, precision: Precision) -> Option<Decimal> {
        let threshold = minimum.threshold(self.price);
        if threshold <= Decimal::ZERO {
            return None;
        }
        Some(precision.ceil(self.gross_for_net(threshold)))
    }
}
