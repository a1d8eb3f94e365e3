//! Violation repair engine.
//!
//! After scaling and truncation some positive allocations can sit below the
//! gross amount their product's minimum requires. The repair pass lifts as
//! many of them as possible to exactly that minimum, funding each lift from
//! other allocations, and keeps the total unchanged to the last unit.
//!
//! # Funding tiers
//!
//! 1. **Safe slack**: every compliant allocation can give up what it holds
//!    above its own minimum without becoming a violation.
//! 2. **Zero-out**: a compliant allocation can be dropped entirely (no trade
//!    is always valid). Dropping one frees its whole gross while its slack
//!    leaves the pool, so the net gain is exactly its minimum. Candidates are
//!    taken smallest minimum first.
//!
//! Violations are visited once each, cheapest lift first. A visit either
//! cures the violation or proves it uncurable with every remaining
//! candidate zeroed, in which case nothing is zeroed for it.
//!
//! # Settlement
//!
//! Once all violations are visited the owed amount (lifts minus freed
//! gross) is taken from the surviving donors pro-rata to their slack, each
//! cut truncated to the amount precision, the truncation residual one
//! minimal unit at a time. If zeroing freed more than the lifts needed, the
//! excess is refunded round robin to the cured allocations.

use rust_decimal::Decimal;
use tracing::{debug, trace};

use super::formulas::{hand_out_units, pro_rata, spread_evenly};
use crate::domain::shared::Precision;

/// One allocation as the repair engine sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairSlot {
    /// Gross amount, on the amount precision grid.
    pub gross: Decimal,
    /// Smallest compliant gross, if a minimum binds.
    pub required: Option<Decimal>,
}

impl RepairSlot {
    /// Create a slot.
    #[must_use]
    pub const fn new(gross: Decimal, required: Option<Decimal>) -> Self {
        Self { gross, required }
    }

    fn minimum(&self) -> Decimal {
        self.required.unwrap_or(Decimal::ZERO)
    }

    /// A positive gross below its minimum.
    #[must_use]
    pub fn is_violating(&self) -> bool {
        self.gross > Decimal::ZERO && self.gross < self.minimum()
    }

    /// What the slot can give up and stay compliant.
    #[must_use]
    pub fn safe_slack(&self) -> Decimal {
        (self.gross - self.minimum()).max(Decimal::ZERO)
    }
}

/// What the repair pass did to one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairAction {
    /// Left as it was.
    Untouched,
    /// Gave up part of its slack.
    Reduced,
    /// Lifted to (at least) its minimum.
    Cured,
    /// Dropped to zero to fund a cure.
    ZeroedOut,
    /// Still below its minimum.
    Uncured,
}

/// Per-slot actions of one repair pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairReport {
    actions: Vec<RepairAction>,
}

impl RepairReport {
    fn untouched(len: usize) -> Self {
        Self {
            actions: vec![RepairAction::Untouched; len],
        }
    }

    /// Action taken on slot `index`.
    #[must_use]
    pub fn action(&self, index: usize) -> RepairAction {
        self.actions
            .get(index)
            .copied()
            .unwrap_or(RepairAction::Untouched)
    }

    /// All actions, slot order.
    #[must_use]
    pub fn actions(&self) -> &[RepairAction] {
        &self.actions
    }

    /// Number of slots with the given action.
    #[must_use]
    pub fn count(&self, action: RepairAction) -> usize {
        self.actions.iter().filter(|a| **a == action).count()
    }

    /// Returns true if nothing was changed.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.actions
            .iter()
            .all(|a| matches!(a, RepairAction::Untouched | RepairAction::Uncured))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Idle,
    Donor,
    Pending,
    Cured,
    Zeroed,
    Uncured,
}

/// Funding state of one repair pass.
struct RepairLedger {
    states: Vec<SlotState>,
    /// Slack still available, net of lifts already funded.
    capacity: Decimal,
    /// Sum of all lifts applied.
    lifted: Decimal,
    /// Sum of gross given up by zeroed slots.
    released: Decimal,
    /// Cured slots in cure order.
    cured: Vec<usize>,
}

impl RepairLedger {
    fn open(slots: &[RepairSlot]) -> Self {
        let mut capacity = Decimal::ZERO;
        let states = slots
            .iter()
            .map(|slot| {
                if slot.is_violating() {
                    SlotState::Pending
                } else if slot.gross > Decimal::ZERO {
                    capacity += slot.safe_slack();
                    SlotState::Donor
                } else {
                    SlotState::Idle
                }
            })
            .collect();
        Self {
            states,
            capacity,
            lifted: Decimal::ZERO,
            released: Decimal::ZERO,
            cured: Vec::new(),
        }
    }

    fn pending(&self, slots: &[RepairSlot]) -> Vec<usize> {
        let mut pending: Vec<usize> = (0..slots.len())
            .filter(|&i| self.states[i] == SlotState::Pending)
            .collect();
        // Stable: equal lifts keep input order.
        pending.sort_by_key(|&i| slots[i].minimum() - slots[i].gross);
        pending
    }

    fn visit(&mut self, index: usize, slots: &mut [RepairSlot]) {
        let lift = slots[index].minimum() - slots[index].gross;

        if lift <= self.capacity {
            trace!(slot = index, %lift, capacity = %self.capacity, "cured from safe slack");
            self.cure(index, lift, slots);
            return;
        }

        let mut candidates: Vec<usize> = (0..slots.len())
            .filter(|&i| {
                matches!(self.states[i], SlotState::Donor | SlotState::Cured)
                    && slots[i].minimum() > Decimal::ZERO
            })
            .collect();
        candidates.sort_by_key(|&i| slots[i].minimum());

        let mut reach = self.capacity;
        let mut chosen = Vec::new();
        for candidate in candidates {
            if reach >= lift {
                break;
            }
            reach += slots[candidate].minimum();
            chosen.push(candidate);
        }

        if reach < lift {
            debug!(slot = index, %lift, %reach, "violation cannot be cured");
            self.states[index] = SlotState::Uncured;
            return;
        }

        for candidate in chosen {
            self.zero_out(candidate, slots);
        }
        debug!(slot = index, %lift, capacity = %self.capacity, "cured after zero-out");
        self.cure(index, lift, slots);
    }

    fn cure(&mut self, index: usize, lift: Decimal, slots: &mut [RepairSlot]) {
        slots[index].gross = slots[index].minimum();
        self.capacity -= lift;
        self.lifted += lift;
        self.states[index] = SlotState::Cured;
        self.cured.push(index);
    }

    fn zero_out(&mut self, index: usize, slots: &mut [RepairSlot]) {
        trace!(slot = index, gross = %slots[index].gross, "zeroing out");
        self.capacity += slots[index].minimum();
        self.released += slots[index].gross;
        if self.states[index] == SlotState::Cured {
            self.cured.retain(|&i| i != index);
        }
        slots[index].gross = Decimal::ZERO;
        self.states[index] = SlotState::Zeroed;
    }

    fn settle(self, slots: &mut [RepairSlot], precision: Precision) -> RepairReport {
        let owed = self.lifted - self.released;
        let mut reduced = vec![false; slots.len()];

        if owed > Decimal::ZERO {
            let donors: Vec<usize> = (0..slots.len())
                .filter(|&i| self.states[i] == SlotState::Donor)
                .collect();
            let slack: Vec<Decimal> = slots.iter().map(RepairSlot::safe_slack).collect();
            let total_slack: Decimal = donors.iter().map(|&i| slack[i]).sum();

            if total_slack > Decimal::ZERO {
                let mut cuts = vec![Decimal::ZERO; slots.len()];
                let mut residual = owed;
                for &d in &donors {
                    cuts[d] = precision
                        .truncate(pro_rata(owed, slack[d], total_slack))
                        .min(slack[d])
                        .min(residual);
                    residual -= cuts[d];
                }
                hand_out_units(&mut cuts, residual, precision, &donors, |i, next| {
                    next <= slack[i]
                });
                for &d in &donors {
                    if cuts[d] > Decimal::ZERO {
                        slots[d].gross -= cuts[d];
                        reduced[d] = true;
                    }
                }
            }
        } else if owed < Decimal::ZERO {
            let mut grosses: Vec<Decimal> = slots.iter().map(|s| s.gross).collect();
            spread_evenly(&mut grosses, -owed, precision, &self.cured);
            for (slot, gross) in slots.iter_mut().zip(grosses) {
                slot.gross = gross;
            }
        }

        let actions = self
            .states
            .iter()
            .zip(reduced)
            .map(|(state, was_reduced)| match state {
                SlotState::Idle | SlotState::Pending => RepairAction::Untouched,
                SlotState::Donor if was_reduced => RepairAction::Reduced,
                SlotState::Donor => RepairAction::Untouched,
                SlotState::Cured => RepairAction::Cured,
                SlotState::Zeroed => RepairAction::ZeroedOut,
                SlotState::Uncured => RepairAction::Uncured,
            })
            .collect();

        debug!(%owed, cured = self.cured.len(), "repair settled");
        RepairReport { actions }
    }
}

/// Repairs minimum violations left by truncation.
#[derive(Debug, Clone, Copy)]
pub struct ViolationRepairEngine {
    precision: Precision,
}

impl ViolationRepairEngine {
    /// Create an engine working at `precision` (the amount precision).
    #[must_use]
    pub const fn new(precision: Precision) -> Self {
        Self { precision }
    }

    /// Repair `slots` in place.
    ///
    /// The sum of gross amounts is the same before and after. Running the
    /// pass again on its own output changes nothing.
    pub fn repair(&self, slots: &mut [RepairSlot]) -> RepairReport {
        let mut ledger = RepairLedger::open(slots);
        let pending = ledger.pending(slots);
        if pending.is_empty() {
            return RepairReport::untouched(slots.len());
        }

        debug!(
            violations = pending.len(),
            pool = %ledger.capacity,
            "repairing minimum violations"
        );
        for index in pending {
            ledger.visit(index, slots);
        }
        ledger.settle(slots, self.precision)
    }
}
