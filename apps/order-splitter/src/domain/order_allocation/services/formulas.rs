//! Shared allocation formulas.
//!
//! Every function here is exact [`Decimal`] arithmetic; amounts are only
//! snapped to a [`Precision`] grid at the last step.

use rust_decimal::Decimal;

use crate::domain::shared::Precision;

/// Investment shortfall: how far a product sits below its target value
/// once the order lands, `max(0, weight * post_total - current)`.
#[must_use]
pub fn shortfall(weight: Decimal, post_total: Decimal, current: Decimal) -> Decimal {
    (weight * post_total - current).max(Decimal::ZERO)
}

/// Redemption overweight: how far a product sits above its target value
/// once the order leaves, `max(0, current - weight * post_total)`.
#[must_use]
pub fn overweight(current: Decimal, weight: Decimal, post_total: Decimal) -> Decimal {
    (current - weight * post_total).max(Decimal::ZERO)
}

/// Split `total` proportionally to `targets`, truncated to `precision`.
///
/// The truncation residual is handed back one minimal unit at a time,
/// largest dropped remainder first (input order on ties), only to slots
/// with a positive target, so the result sums to `total` exactly. With
/// `caps`, no slot is raised above its cap.
///
/// All-zero targets yield all-zero amounts.
#[must_use]
pub fn scale_to_total(
    targets: &[Decimal],
    total: Decimal,
    precision: Precision,
    caps: Option<&[Decimal]>,
) -> Vec<Decimal> {
    let (targets, sum) = proportions(targets);
    if sum <= Decimal::ZERO || total <= Decimal::ZERO {
        return vec![Decimal::ZERO; targets.len()];
    }

    let mut amounts = Vec::with_capacity(targets.len());
    let mut remainders = Vec::with_capacity(targets.len());
    for (i, target) in targets.iter().enumerate() {
        let exact = pro_rata(total, *target, sum);
        let mut truncated = precision.truncate(exact);
        if let Some(cap) = caps.and_then(|c| c.get(i)) {
            truncated = truncated.min(precision.truncate(*cap));
        }
        amounts.push(truncated);
        remainders.push(exact - truncated);
    }

    let placed: Decimal = amounts.iter().copied().sum();
    let residual = total - placed;
    if residual > Decimal::ZERO {
        let mut order: Vec<usize> = (0..targets.len())
            .filter(|&i| targets[i] > Decimal::ZERO)
            .collect();
        // Stable: ties keep input order.
        order.sort_by(|&a, &b| remainders[b].cmp(&remainders[a]));

        let leftover = hand_out_units(&mut amounts, residual, precision, &order, |i, next| {
            caps.and_then(|c| c.get(i)).is_none_or(|cap| next <= *cap)
        });
        if leftover > Decimal::ZERO {
            tracing::warn!(%leftover, %total, "scaling residual could not be placed");
        }
    } else if residual < Decimal::ZERO {
        // Shares rounded at the last digit can overshoot by a unit.
        let mut order: Vec<usize> = (0..targets.len()).collect();
        order.sort_by(|&a, &b| remainders[a].cmp(&remainders[b]));
        take_back_units(&mut amounts, -residual, precision, &order);
    }

    amounts
}

/// Targets and their sum. When the sum overflows, targets are divided by
/// the largest one first; only their proportions matter.
fn proportions(targets: &[Decimal]) -> (Vec<Decimal>, Decimal) {
    let sum = targets
        .iter()
        .try_fold(Decimal::ZERO, |sum, t| sum.checked_add(*t));
    match sum {
        Some(sum) => (targets.to_vec(), sum),
        None => {
            let largest = targets.iter().copied().fold(Decimal::ZERO, Decimal::max);
            let scaled: Vec<Decimal> = targets.iter().map(|t| *t / largest).collect();
            let sum = scaled.iter().copied().sum();
            (scaled, sum)
        }
    }
}

/// `amount * part / whole` for `0 <= part <= whole`.
///
/// When the product overflows the share is taken as `amount * (part /
/// whole)`, which can land one digit off at the 28th significant place.
pub(crate) fn pro_rata(amount: Decimal, part: Decimal, whole: Decimal) -> Decimal {
    amount
        .checked_mul(part)
        .map_or_else(|| amount * (part / whole), |product| product / whole)
}

/// Remove `excess` from `amounts` one minimal unit at a time, cycling
/// through `order` and never taking a slot below zero.
fn take_back_units(
    amounts: &mut [Decimal],
    mut excess: Decimal,
    precision: Precision,
    order: &[usize],
) {
    let unit = precision.unit();
    while excess >= unit {
        let mut took_any = false;
        for &i in order {
            if excess < unit {
                break;
            }
            if amounts[i] >= unit {
                amounts[i] -= unit;
                excess -= unit;
                took_any = true;
            }
        }
        if !took_any {
            break;
        }
    }
}

/// Add `residual` to `amounts` one minimal unit at a time, cycling through
/// `order` and skipping slots whose next value `accepts` rejects.
///
/// Returns whatever could not be placed (zero unless every slot refused).
pub(crate) fn hand_out_units(
    amounts: &mut [Decimal],
    mut residual: Decimal,
    precision: Precision,
    order: &[usize],
    mut accepts: impl FnMut(usize, Decimal) -> bool,
) -> Decimal {
    let unit = precision.unit();
    while residual >= unit {
        let mut placed_any = false;
        for &i in order {
            if residual < unit {
                break;
            }
            let next = amounts[i] + unit;
            if accepts(i, next) {
                amounts[i] = next;
                residual -= unit;
                placed_any = true;
            }
        }
        if !placed_any {
            break;
        }
    }
    residual
}

/// Add `amount` to the slots listed in `order` as if handing it out one
/// minimal unit at a time, round robin: every slot gets an equal truncated
/// share and the first slots pick up the leftover units.
pub(crate) fn spread_evenly(
    amounts: &mut [Decimal],
    amount: Decimal,
    precision: Precision,
    order: &[usize],
) {
    if order.is_empty() || amount <= Decimal::ZERO {
        return;
    }
    let share = precision.truncate(amount / Decimal::from(order.len()));
    for &i in order {
        amounts[i] += share;
    }
    let rest = amount - share * Decimal::from(order.len());
    hand_out_units(amounts, rest, precision, order, |_, _| true);
}
