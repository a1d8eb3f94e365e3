//! Property tests for allocation invariants.
//!
//! Uses proptest to verify:
//! 1. Sum conservation: gross amounts add up to the order amount exactly,
//!    at any amount precision and up to the largest magnitudes accepted
//! 2. Non-negativity of every gross amount
//! 3. Repair settles: nothing violates after repair except reported uncured slots
//! 4. Shortfall monotonicity in current value
//! 5. Full redemptions bypass the minimum-holding check

use order_splitter::domain::order_allocation::services::formulas::shortfall;
use order_splitter::domain::order_allocation::services::{
    RepairAction, RepairSlot, ViolationRepairEngine, check_redemption_minimums,
};
use order_splitter::domain::order_allocation::{
    AllocationService, Compliance, Holding, Minimum, ModelTarget, Order, OrderDirection, Product,
    TradeMinimums,
};
use order_splitter::infrastructure::http::{SplitRequest, ValidationError, parse_split_request};
use order_splitter::{Precision, Rate, Ticker, Weight};
use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::{Value, json};

// ── Strategies (proptest) ────────────────────────────────────────────

/// Percent weights summing to exactly 100.
fn arb_percent_weights() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(1u32..=25, 0..=3).prop_map(|mut parts| {
        let used: u32 = parts.iter().sum();
        parts.push(100 - used);
        parts
    })
}

fn arb_cents(max: i64) -> impl Strategy<Value = Decimal> {
    (1i64..=max).prop_map(|c| Decimal::new(c, 2))
}

fn arb_price() -> impl Strategy<Value = Decimal> {
    (50i64..=20_000).prop_map(|c| Decimal::new(c, 2))
}

fn arb_fee() -> impl Strategy<Value = Decimal> {
    (0i64..=500).prop_map(|bp| Decimal::new(bp, 4))
}

fn arb_minimum() -> impl Strategy<Value = Decimal> {
    prop_oneof![Just(Decimal::ZERO), (1i64..=500).prop_map(Decimal::from)]
}

/// Amount precision and a power of ten every amount and minimum is scaled
/// by. Both bounds keep post-trade totals and unit counts inside what the
/// grid can carry.
#[derive(Debug, Clone, Copy)]
struct Scale {
    places: u32,
    magnitude: u32,
}

impl Scale {
    fn precision(self) -> Precision {
        Precision::new(self.places).unwrap()
    }

    /// `mantissa` hundredths, shifted by the magnitude and snapped to the grid.
    fn amount(self, mantissa: i64) -> Decimal {
        let value = Decimal::new(mantissa, 2) * ten_to(self.magnitude);
        self.precision().truncate(value).max(self.precision().unit())
    }

    fn minimum(self, whole: Decimal) -> Decimal {
        whole * ten_to(self.magnitude)
    }
}

fn ten_to(power: u32) -> Decimal {
    Decimal::from_i128_with_scale(10i128.pow(power), 0)
}

/// Amounts reach `10^(7 + magnitude)` and holdings add a little more, so
/// `magnitude + places` stays at most 20.
fn arb_scale() -> impl Strategy<Value = Scale> {
    prop_oneof![
        Just(Scale { places: 2, magnitude: 0 }),
        (0u32..=8)
            .prop_flat_map(|places| (Just(places), 0..=(20 - places).min(14)))
            .prop_map(|(places, magnitude)| Scale { places, magnitude }),
    ]
}

#[derive(Debug, Clone)]
struct ProductSpec {
    price: Decimal,
    fee: Decimal,
    min_initial: Decimal,
    min_top_up: Decimal,
    min_redemption: Decimal,
    min_holding: Decimal,
    held_value: Option<i64>,
}

fn arb_product_spec() -> impl Strategy<Value = ProductSpec> {
    (
        arb_price(),
        arb_fee(),
        arb_minimum(),
        arb_minimum(),
        arb_minimum(),
        arb_minimum(),
        prop::option::of(1i64..=100_000_000),
    )
        .prop_map(
            |(price, fee, min_initial, min_top_up, min_redemption, min_holding, held_value)| {
                ProductSpec {
                    price,
                    fee,
                    min_initial,
                    min_top_up,
                    min_redemption,
                    min_holding,
                    held_value,
                }
            },
        )
}

fn product(index: usize, spec: &ProductSpec, scale: Scale) -> Product {
    Product::new(
        Ticker::new(format!("P{index}")).unwrap(),
        spec.price,
        Rate::new(spec.fee).unwrap(),
    )
    .unwrap()
    .with_minimums(TradeMinimums {
        initial_investment: Minimum::amount_only(scale.minimum(spec.min_initial)),
        top_up: Minimum::amount_only(scale.minimum(spec.min_top_up)),
        redemption: Minimum::amount_only(scale.minimum(spec.min_redemption)),
        holding: Minimum::amount_only(scale.minimum(spec.min_holding)),
    })
}

fn holding(product: Product, value: Decimal) -> Holding {
    let units = value / product.price();
    Holding::new(product, units, value).unwrap()
}

/// Model products from `weights` and `specs` (paired by index), plus
/// `unwanted` holdings outside the model.
fn build_order(
    direction: OrderDirection,
    amount: Decimal,
    scale: Scale,
    weights: &[u32],
    specs: &[ProductSpec],
    unwanted: &[Decimal],
) -> Order {
    let mut holdings = Vec::new();
    let mut targets = Vec::new();
    for (i, (weight, spec)) in weights.iter().zip(specs).enumerate() {
        let p = product(i, spec, scale);
        if let Some(value) = spec.held_value {
            holdings.push(holding(p.clone(), scale.amount(value)));
        }
        targets.push(ModelTarget::new(
            p,
            Weight::new(Decimal::new(i64::from(*weight), 2)).unwrap(),
        ));
    }
    for (j, value) in unwanted.iter().enumerate() {
        let p = Product::new(Ticker::new(format!("X{j}")).unwrap(), Decimal::ONE, Rate::ZERO)
            .unwrap();
        holdings.push(holding(p, *value));
    }
    Order::new(direction, amount, scale.precision(), Precision::new(4).unwrap())
        .unwrap()
        .with_holdings(holdings)
        .with_targets(targets)
}

fn arb_model() -> impl Strategy<Value = (Vec<u32>, Vec<ProductSpec>)> {
    arb_percent_weights().prop_flat_map(|weights| {
        let n = weights.len();
        (
            Just(weights),
            prop::collection::vec(arb_product_spec(), n..=n),
        )
    })
}

// ── 1 + 2. Sum conservation and non-negativity ───────────────────────

proptest! {
    /// An investment's gross amounts sum to the order amount, after repair.
    #[test]
    fn investment_conserves_order_amount(
        (weights, specs) in arb_model(),
        scale in arb_scale(),
        mantissa in 1i64..=1_000_000_000,
    ) {
        let amount = scale.amount(mantissa);
        let order = build_order(OrderDirection::Investment, amount, scale, &weights, &specs, &[]);
        let result = AllocationService::new().allocate(&order);

        prop_assert_eq!(result.total_gross(), amount);
        for allocation in &result.allocations {
            prop_assert!(allocation.gross >= Decimal::ZERO);
            prop_assert!(allocation.units >= Decimal::ZERO);
            prop_assert!(scale.precision().admits(allocation.gross));
        }
    }

    /// A redemption no larger than the holdings is placed in full, and no
    /// product is sold for more than it is worth.
    #[test]
    fn redemption_conserves_order_amount(
        (weights, specs) in arb_model(),
        scale in arb_scale(),
        unwanted in prop::collection::vec(1i64..=50_000_000, 0..=2),
        per_mille in 1i64..=1000,
    ) {
        let unwanted: Vec<Decimal> = unwanted.into_iter().map(|m| scale.amount(m)).collect();
        let held: Decimal = specs
            .iter()
            .filter_map(|s| s.held_value)
            .map(|m| scale.amount(m))
            .sum::<Decimal>()
            + unwanted.iter().copied().sum::<Decimal>();
        prop_assume!(held > Decimal::ZERO);

        let precision = scale.precision();
        let amount = precision
            .truncate(held * Decimal::new(per_mille, 3))
            .max(precision.unit());
        let order = build_order(OrderDirection::Redemption, amount, scale, &weights, &specs, &unwanted);
        let result = AllocationService::new().allocate(&order);

        prop_assert_eq!(result.total_gross(), amount);
        for allocation in &result.allocations {
            prop_assert!(allocation.gross >= Decimal::ZERO);
            prop_assert!(precision.admits(allocation.gross));
            let value = order
                .holdings()
                .iter()
                .find(|h| h.product.ticker() == &allocation.ticker)
                .map_or(Decimal::ZERO, |h| h.value);
            prop_assert!(allocation.gross <= value);
        }
    }
}

// ── 1b. Conservation for any accepted request ────────────────────────

/// A precision and an amount it carries: any mantissa below `10^28`,
/// usually within a few digits of that bound.
fn arb_precision_and_amount() -> impl Strategy<Value = (Precision, Decimal)> {
    (
        0u32..=28,
        prop_oneof![1i128..1_000_000, 10i128.pow(25)..10i128.pow(28)],
    )
        .prop_map(|(places, mantissa)| {
            (
                Precision::new(places).unwrap(),
                Decimal::from_i128_with_scale(mantissa, places),
            )
        })
}

fn split_request(
    precision: Precision,
    order_type: &str,
    amount: Decimal,
    holdings: &[Value],
    model: &[Value],
) -> SplitRequest {
    serde_json::from_value(json!({
        "amountDecimalPrecision": precision.places().to_string(),
        "unitDecimalPrecision": "0",
        "goals": [{
            "goalId": "g1",
            "orderAmount": amount.to_string(),
            "orderType": order_type,
            "modelPortfolioId": "m1",
            "goalDetails": holdings,
            "modelPortfolioDetails": model
        }]
    }))
    .unwrap()
}

proptest! {
    /// Whatever validation accepts splits exactly on the amount grid, at
    /// every precision up to the largest amount the grid carries. The only
    /// refusals are for magnitude.
    #[test]
    fn accepted_requests_conserve_order_amount(
        (weights, specs) in arb_model(),
        (precision, drawn) in arb_precision_and_amount(),
        redeem in any::<bool>(),
        per_mille in 1i64..=1000,
    ) {
        let carried = |minimum: Decimal| {
            if precision.carries(minimum) { minimum.to_string() } else { String::new() }
        };
        let model: Vec<Value> = weights
            .iter()
            .zip(&specs)
            .enumerate()
            .map(|(i, (weight, spec))| json!({
                "ticker": format!("P{i}"),
                "weight": Decimal::new(i64::from(*weight), 2).to_string(),
                "marketPrice": spec.price.to_string(),
                "transactionFee": spec.fee.to_string(),
                "minInitialInvestmentAmt": carried(spec.min_initial),
                "minRedemptionAmt": carried(spec.min_redemption)
            }))
            .collect();

        let (order_type, amount, holdings) = if redeem {
            // Every model product held at an equal share of the drawn amount.
            let share = precision.truncate(drawn / Decimal::from(specs.len()));
            prop_assume!(share > Decimal::ZERO);
            let holdings: Vec<Value> = specs
                .iter()
                .enumerate()
                .map(|(i, spec)| json!({
                    "ticker": format!("P{i}"),
                    "units": (share / spec.price).trunc().to_string(),
                    "marketPrice": spec.price.to_string(),
                    "value": share.to_string()
                }))
                .collect();
            let held = share * Decimal::from(specs.len());
            let amount = precision
                .truncate(held * Decimal::new(per_mille, 3))
                .max(precision.unit());
            ("redemption", amount, holdings)
        } else {
            ("investment", drawn, Vec::new())
        };

        let request = split_request(precision, order_type, amount, &holdings, &model);
        let parsed = match parse_split_request(&request) {
            Ok(parsed) => parsed,
            Err(ValidationError::TooLarge { .. } | ValidationError::PriceTooSmall { .. }) => {
                return Ok(());
            }
            Err(other) => return Err(TestCaseError::fail(format!("unexpected rejection: {other}"))),
        };
        let order = &parsed.goals[0].order;
        let result = AllocationService::new().allocate(order);

        prop_assert_eq!(result.total_gross(), amount);
        for allocation in &result.allocations {
            prop_assert!(allocation.gross >= Decimal::ZERO);
            prop_assert!(precision.admits(allocation.gross));
            prop_assert!(precision.carries(allocation.gross));
        }
    }
}

// ── 3. Repair ────────────────────────────────────────────────────────

fn arb_slots() -> impl Strategy<Value = Vec<RepairSlot>> {
    prop::collection::vec(
        (
            0i64..=20_000,
            prop::option::of(1i64..=10_000),
        )
            .prop_map(|(gross, required)| {
                RepairSlot::new(Decimal::new(gross, 2), required.map(|r| Decimal::new(r, 2)))
            }),
        1..=6,
    )
}

proptest! {
    /// Repair never changes the total and never leaves a negative slot.
    #[test]
    fn repair_conserves_total(mut slots in arb_slots()) {
        let before: Decimal = slots.iter().map(|s| s.gross).sum();
        ViolationRepairEngine::new(Precision::CENTS).repair(&mut slots);
        let after: Decimal = slots.iter().map(|s| s.gross).sum();

        prop_assert_eq!(before, after);
        prop_assert!(slots.iter().all(|s| s.gross >= Decimal::ZERO));
    }

    /// Only slots reported uncured may still violate, and once nothing is
    /// left uncured a second pass changes nothing.
    #[test]
    fn repair_settles(mut slots in arb_slots()) {
        let engine = ViolationRepairEngine::new(Precision::CENTS);
        let report = engine.repair(&mut slots);

        for (i, slot) in slots.iter().enumerate() {
            if slot.is_violating() {
                prop_assert_eq!(report.action(i), RepairAction::Uncured);
            }
        }

        if report.count(RepairAction::Uncured) == 0 {
            let settled = slots.clone();
            let second = engine.repair(&mut slots);
            prop_assert!(second.is_noop());
            prop_assert_eq!(slots, settled);
        }
    }
}

// ── 4. Shortfall monotonicity ────────────────────────────────────────

proptest! {
    /// More current value never means a larger shortfall.
    #[test]
    fn shortfall_is_monotone_in_current_value(
        weight in 0i64..=100,
        post_total in arb_cents(10_000_000),
        low in 0i64..=10_000_000,
        extra in 0i64..=10_000_000,
    ) {
        let weight = Decimal::new(weight, 2);
        let low = Decimal::new(low, 2);
        let high = low + Decimal::new(extra, 2);

        prop_assert!(shortfall(weight, post_total, low) >= shortfall(weight, post_total, high));
        prop_assert!(shortfall(weight, post_total, high) >= Decimal::ZERO);
    }
}

// ── 5. Full-redemption bypass ────────────────────────────────────────

proptest! {
    /// Selling the whole position passes whatever the holding minimum is;
    /// selling all but less than that minimum does not.
    #[test]
    fn full_redemption_skips_holding_minimum(
        value in (200i64..=1_000_000).prop_map(|c| Decimal::new(c, 2)),
        min_holding in 1i64..=100,
        kept_cents in 1i64..=99,
    ) {
        let min_holding = Decimal::from(min_holding);
        let p = Product::new(Ticker::new("AAA").unwrap(), Decimal::ONE, Rate::ZERO)
            .unwrap()
            .with_minimums(TradeMinimums {
                holding: Minimum::amount_only(min_holding),
                ..TradeMinimums::default()
            });
        let h = holding(p.clone(), value);

        let full = check_redemption_minimums(p.minimums(), &h, value, value);
        prop_assert_eq!(full, Compliance::Clean);

        let kept = Decimal::new(kept_cents, 2).min(value - Decimal::new(1, 2));
        prop_assume!(kept < min_holding);
        let partial_amount = value - kept;
        let partial = check_redemption_minimums(p.minimums(), &h, partial_amount, partial_amount);
        prop_assert!(partial.is_violated());
    }
}
