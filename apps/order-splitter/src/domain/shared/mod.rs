//! Shared Domain Types
//!
//! The decimal substrate (precision, rates) and errors shared across the domain.

pub mod errors;
pub mod value_objects;

pub use errors::DomainError;
pub use value_objects::{Precision, Rate, Ticker, Weight};
