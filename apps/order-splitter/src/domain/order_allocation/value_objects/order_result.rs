//! Allocation output for one order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::allocation::Allocation;
use super::transaction_type::TransactionType;

/// Ordered allocations plus the transaction label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResult {
    /// Transaction label.
    pub transaction_type: TransactionType,
    /// Allocations in emission order.
    pub allocations: Vec<Allocation>,
}

impl OrderResult {
    /// Sum of gross amounts across all allocations.
    #[must_use]
    pub fn total_gross(&self) -> Decimal {
        self.allocations.iter().map(|a| a.gross).sum()
    }

    /// Number of allocations still carrying a violation.
    #[must_use]
    pub fn violation_count(&self) -> usize {
        self.allocations
            .iter()
            .filter(|a| a.compliance.is_violated())
            .count()
    }
}
