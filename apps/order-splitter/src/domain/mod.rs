//! Domain Layer
//!
//! Pure allocation logic with no transport or runtime dependencies.
//!
//! # Bounded Contexts
//!
//! - [`shared`]: decimal precision, rates, tickers and domain errors
//! - [`order_allocation`]: products, orders, the two allocators and the
//!   violation repair engine

pub mod order_allocation;
pub mod shared;
