//! Order Allocation Bounded Context
//!
//! Splits one gross cash order across the products of a model portfolio,
//! honouring fees and trade minimums, with amounts that sum exactly to the
//! order at the configured precision.

pub mod services;
pub mod value_objects;

pub use services::{
    AllocationService, InvestmentAllocator, RedemptionAllocator, RepairAction, RepairReport,
    RepairSlot, ViolationRepairEngine, check_redemption_minimums,
};
pub use value_objects::{
    Allocation, Compliance, Holding, Minimum, ModelTarget, Order, OrderDirection, OrderResult,
    Product, TradeDirection, TradeMinimums, TransactionType, Violation, ViolationCode,
};
