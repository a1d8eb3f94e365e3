//! Allocation Service
//!
//! Single entry point of the engine: dispatches an order to the allocator
//! for its direction and labels the result.

use tracing::{debug, instrument};

use super::{InvestmentAllocator, RedemptionAllocator};
use crate::domain::order_allocation::value_objects::{
    Order, OrderDirection, OrderResult, TransactionType,
};

/// Allocates one order. Stateless and deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocationService {
    investment: InvestmentAllocator,
    redemption: RedemptionAllocator,
}

impl AllocationService {
    /// Create a service.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            investment: InvestmentAllocator::new(),
            redemption: RedemptionAllocator::new(),
        }
    }

    /// Allocate `order` and attach its transaction type.
    #[must_use]
    #[instrument(skip_all, fields(direction = %order.direction(), amount = %order.amount()))]
    pub fn allocate(&self, order: &Order) -> OrderResult {
        let (transaction_type, allocations) = match order.direction() {
            OrderDirection::Investment => {
                (TransactionType::Investment, self.investment.allocate(order))
            }
            OrderDirection::Redemption => (
                TransactionType::classify_redemption(
                    order.amount(),
                    order.holdings_value(),
                    order.volatility_buffer(),
                ),
                self.redemption.allocate(order),
            ),
        };
        debug!(%transaction_type, allocations = allocations.len(), "order allocated");
        OrderResult {
            transaction_type,
            allocations,
        }
    }
}
