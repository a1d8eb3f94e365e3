//! Redemption Allocator Domain Service
//!
//! Raises cash in two phases. Positions the model no longer wants are sold
//! first, smallest first, so as many as possible leave the portfolio whole.
//! Whatever budget remains is taken from model products in proportion to
//! how far each sits above its post-redemption target.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::formulas::{overweight, scale_to_total};
use crate::domain::order_allocation::value_objects::{
    Allocation, Compliance, Holding, Minimum, ModelTarget, Order, Product, TradeDirection,
    TradeMinimums, ViolationCode,
};
use crate::domain::shared::{Precision, Weight};

/// Splits redemption orders into SELL allocations.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedemptionAllocator;

impl RedemptionAllocator {
    /// Create an allocator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Allocate a redemption order.
    ///
    /// Forced exits come first in ascending value order, followed by one
    /// allocation per positively weighted model product in model order.
    /// With model weights summing to one and an order no larger than the
    /// holdings, gross amounts sum to the order amount exactly.
    #[must_use]
    pub fn allocate(&self, order: &Order) -> Vec<Allocation> {
        let mut allocations = Vec::new();
        let remaining = Self::exit_unwanted(order, &mut allocations);
        let forced = allocations.len();
        Self::rebalance(order, remaining, &mut allocations);

        let placed: Decimal = allocations.iter().map(|a| a.gross).sum();
        if placed < order.amount() {
            warn!(
                unplaced = %(order.amount() - placed),
                "redemption budget not fully allocated"
            );
        }
        debug!(
            forced_exits = forced,
            model_products = allocations.len() - forced,
            flagged = allocations.iter().filter(|a| a.compliance.is_violated()).count(),
            "redemption allocated"
        );
        allocations
    }

    /// Phase 1: sell held products with no positive model weight.
    ///
    /// Returns the budget left for the model products.
    fn exit_unwanted(order: &Order, out: &mut Vec<Allocation>) -> Decimal {
        let weights: HashMap<&str, Weight> = order
            .targets()
            .iter()
            .map(|t| (t.product.ticker().as_str(), t.weight))
            .collect();

        let mut candidates: Vec<&Holding> = order
            .holdings()
            .iter()
            .filter(|h| h.is_held())
            .filter(|h| {
                weights
                    .get(h.product.ticker().as_str())
                    .is_none_or(|w| !w.is_positive())
            })
            .collect();
        candidates.sort_by_key(|h| h.value);

        let amount_precision = order.amount_precision();
        let mut remaining = order.amount();
        for holding in candidates {
            if remaining <= Decimal::ZERO {
                break;
            }
            let amount = amount_precision.truncate(holding.value.min(remaining));
            let units = holding.product.units_for(amount, order.unit_precision());
            out.push(Allocation {
                ticker: holding.product.ticker().clone(),
                direction: TradeDirection::Sell,
                ideal: holding.value,
                fee_adjusted: holding.value,
                gross: amount,
                units,
                required_gross: redemption_floor(&holding.product, amount_precision),
                compliance: check_redemption_minimums(
                    holding.product.minimums(),
                    holding,
                    amount,
                    units,
                ),
            });
            remaining -= amount;
        }
        remaining
    }

    /// Phase 2: split the remaining budget across model products by
    /// overweight, never selling more than is held.
    fn rebalance(order: &Order, remaining: Decimal, out: &mut Vec<Allocation>) {
        let held: HashMap<&str, &Holding> = order
            .holdings()
            .iter()
            .filter(|h| h.is_held())
            .map(|h| (h.product.ticker().as_str(), h))
            .collect();
        let post_total = order.holdings_value() - order.amount();

        let targets: Vec<(&ModelTarget, Option<&Holding>)> = order
            .targets()
            .iter()
            .filter(|t| t.weight.is_positive())
            .map(|t| (t, held.get(t.product.ticker().as_str()).copied()))
            .collect();
        let current: Vec<Decimal> = targets
            .iter()
            .map(|(_, h)| h.map_or(Decimal::ZERO, |h| h.value))
            .collect();
        let ideals: Vec<Decimal> = targets
            .iter()
            .zip(&current)
            .map(|((t, _), value)| overweight(*value, t.weight.value(), post_total))
            .collect();

        let amount_precision = order.amount_precision();
        let amounts = scale_to_total(
            &ideals,
            remaining,
            amount_precision,
            Some(current.as_slice()),
        );

        for (i, (target, holding)) in targets.into_iter().enumerate() {
            let amount = amounts[i];
            let units = if amount > Decimal::ZERO {
                target.product.units_for(amount, order.unit_precision())
            } else {
                Decimal::ZERO
            };
            let compliance = match holding {
                Some(holding) if amount > Decimal::ZERO => check_redemption_minimums(
                    target.product.minimums(),
                    holding,
                    amount,
                    units,
                ),
                _ => Compliance::Clean,
            };
            out.push(Allocation {
                ticker: target.product.ticker().clone(),
                direction: TradeDirection::Sell,
                ideal: ideals[i],
                fee_adjusted: ideals[i],
                gross: amount,
                units,
                required_gross: redemption_floor(&target.product, amount_precision),
                compliance,
            });
        }
    }
}

/// Smallest sale that clears the redemption minimum, if one binds.
fn redemption_floor(product: &Product, precision: Precision) -> Option<Decimal> {
    let threshold = product.minimums().redemption.threshold(product.price());
    (threshold > Decimal::ZERO).then(|| precision.ceil(threshold))
}

/// Check a sale of `amount` (`units`) from `holding` against `minimums`.
///
/// The sale itself must clear the redemption minimum. A partial sale must
/// also leave at least the holding minimum behind; selling the whole
/// position (`amount >= holding.value`) skips that second check.
#[must_use]
pub fn check_redemption_minimums(
    minimums: &TradeMinimums,
    holding: &Holding,
    amount: Decimal,
    units: Decimal,
) -> Compliance {
    if minimums.redemption.is_breached_by(amount, units) {
        return Compliance::Violated(ViolationCode::MinRedemptionViolation.into());
    }
    let full_exit = amount >= holding.value;
    if !full_exit && leaves_too_little(&minimums.holding, holding, amount, units) {
        return Compliance::Violated(ViolationCode::MinHoldingViolation.into());
    }
    Compliance::Clean
}

fn leaves_too_little(minimum: &Minimum, holding: &Holding, amount: Decimal, units: Decimal) -> bool {
    minimum.is_breached_by(holding.value - amount, holding.units - units)
}
