//! Application Layer
//!
//! Orchestrates the allocation engine over batches of goals.

pub mod use_cases;

pub use use_cases::*;
