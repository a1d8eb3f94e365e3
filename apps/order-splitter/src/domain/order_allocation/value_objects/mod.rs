//! Allocation value objects.

mod allocation;
mod order;
mod order_result;
mod product;
mod transaction_type;

pub use allocation::{Allocation, Compliance, TradeDirection, Violation, ViolationCode};
pub use order::{Holding, ModelTarget, Order, OrderDirection};
pub use order_result::OrderResult;
pub use product::{Minimum, Product, TradeMinimums};
pub use transaction_type::TransactionType;
