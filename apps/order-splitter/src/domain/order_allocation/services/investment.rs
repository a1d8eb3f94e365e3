//! Investment Allocator Domain Service
//!
//! Buys toward the model: each weighted product receives a share of the
//! order proportional to its fee-adjusted shortfall, truncated to the amount
//! precision, then repaired against the initial-investment or top-up
//! minimum that applies to it.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::debug;

use super::formulas::{scale_to_total, shortfall};
use super::repair::{RepairAction, RepairSlot, ViolationRepairEngine};
use crate::domain::order_allocation::value_objects::{
    Allocation, Compliance, Holding, Minimum, ModelTarget, Order, Product, TradeDirection,
    ViolationCode,
};
use crate::domain::shared::Precision;

/// Splits investment orders into BUY allocations.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvestmentAllocator;

impl InvestmentAllocator {
    /// Create an allocator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Allocate an investment order.
    ///
    /// Emits one allocation per model target with a positive weight, in
    /// model order. Gross amounts sum to the order amount exactly.
    #[must_use]
    pub fn allocate(&self, order: &Order) -> Vec<Allocation> {
        let targets: Vec<&ModelTarget> = order
            .targets()
            .iter()
            .filter(|t| t.weight.is_positive())
            .collect();
        if targets.is_empty() {
            return Vec::new();
        }

        let amount_precision = order.amount_precision();
        let unit_precision = order.unit_precision();
        let held = current_values(order.holdings());
        let post_total = order.holdings_value().saturating_add(order.amount());

        let current: Vec<Decimal> = targets
            .iter()
            .map(|t| {
                held.get(t.product.ticker().as_str())
                    .copied()
                    .unwrap_or(Decimal::ZERO)
            })
            .collect();

        let mut ideals: Vec<Decimal> = targets
            .iter()
            .zip(&current)
            .map(|(t, value)| shortfall(t.weight.value(), post_total, *value))
            .collect();
        if ideals.iter().all(Decimal::is_zero) {
            debug!("no product below target, splitting by model weight");
            let total_weight: Decimal = targets.iter().map(|t| t.weight.value()).sum();
            ideals = targets
                .iter()
                .map(|t| t.weight.value() / total_weight * order.amount())
                .collect();
        }

        let fee_adjusted: Vec<Decimal> = targets
            .iter()
            .zip(&ideals)
            .map(|(t, ideal)| t.product.gross_for_net(*ideal))
            .collect();
        let grosses = scale_to_total(&fee_adjusted, order.amount(), amount_precision, None);

        let rules: Vec<(&Minimum, ViolationCode)> = targets
            .iter()
            .zip(&current)
            .map(|(t, value)| applicable_minimum(&t.product, *value))
            .collect();
        let mut slots: Vec<RepairSlot> = grosses
            .iter()
            .zip(&targets)
            .zip(&rules)
            .map(|((gross, t), (minimum, _))| {
                RepairSlot::new(*gross, t.product.required_gross(minimum, amount_precision))
            })
            .collect();
        let report = ViolationRepairEngine::new(amount_precision).repair(&mut slots);

        let allocations: Vec<Allocation> = targets
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let gross = slots[i].gross;
                let (minimum, code) = rules[i];
                Allocation {
                    ticker: t.product.ticker().clone(),
                    direction: TradeDirection::Buy,
                    ideal: ideals[i],
                    fee_adjusted: fee_adjusted[i],
                    gross,
                    units: t.product.units_for(gross, unit_precision),
                    required_gross: slots[i].required,
                    compliance: check_purchase(
                        &t.product,
                        gross,
                        minimum,
                        code,
                        report.action(i),
                        unit_precision,
                    ),
                }
            })
            .collect();

        debug!(
            products = allocations.len(),
            cured = report.count(RepairAction::Cured),
            zeroed = report.count(RepairAction::ZeroedOut),
            flagged = allocations.iter().filter(|a| a.compliance.is_violated()).count(),
            "investment allocated"
        );
        allocations
    }
}

fn current_values(holdings: &[Holding]) -> HashMap<&str, Decimal> {
    let mut values = HashMap::with_capacity(holdings.len());
    for holding in holdings {
        *values
            .entry(holding.product.ticker().as_str())
            .or_insert(Decimal::ZERO) += holding.value;
    }
    values
}

/// Initial-investment rules for products not held, top-up rules otherwise.
fn applicable_minimum(product: &Product, current: Decimal) -> (&Minimum, ViolationCode) {
    if current.is_zero() {
        (
            &product.minimums().initial_investment,
            ViolationCode::MinInvestmentViolation,
        )
    } else {
        (&product.minimums().top_up, ViolationCode::MinTopupViolation)
    }
}

/// Judge a purchase by what actually lands after the fee.
fn check_purchase(
    product: &Product,
    gross: Decimal,
    minimum: &Minimum,
    code: ViolationCode,
    action: RepairAction,
    unit_precision: Precision,
) -> Compliance {
    if gross <= Decimal::ZERO {
        return Compliance::Clean;
    }
    let net = product.net_of_fee(gross);
    let net_units = product.units_for(net, unit_precision);
    if minimum.is_breached_by(net, net_units) {
        Compliance::Violated(code.into())
    } else if action == RepairAction::Cured {
        Compliance::Cured
    } else {
        Compliance::Clean
    }
}
