//! Shared Value Objects
//!
//! Immutable domain types used across the allocation context.
//! Value objects are compared by value, not identity.

mod precision;
mod rate;
mod ticker;

pub use precision::Precision;
pub use rate::{Rate, Weight};
pub use ticker::Ticker;
