//! Order Allocation Domain Services

mod allocation_service;
pub mod formulas;
mod investment;
mod redemption;
mod repair;

pub use allocation_service::AllocationService;
pub use investment::InvestmentAllocator;
pub use redemption::{RedemptionAllocator, check_redemption_minimums};
pub use repair::{RepairAction, RepairReport, RepairSlot, ViolationRepairEngine};
