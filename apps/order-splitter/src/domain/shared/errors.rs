//! Domain errors for the order splitter.

use std::fmt;

/// Domain-level errors raised while constructing value objects and orders.
///
/// These errors are independent of infrastructure concerns. The allocation
/// services themselves are total and never return them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid value for a field.
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },

    /// Value is not representable at the configured decimal precision.
    PrecisionExceeded {
        /// Field name.
        field: String,
        /// Maximum number of decimal places allowed.
        max_places: u32,
    },
}

impl DomainError {
    /// Shorthand for [`DomainError::InvalidValue`].
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { field, message } => {
                write!(f, "Invalid value for '{field}': {message}")
            }
            Self::PrecisionExceeded { field, max_places } => {
                write!(
                    f,
                    "Invalid value for '{field}': must have at most {max_places} decimal place(s)"
                )
            }
        }
    }
}

impl std::error::Error for DomainError {}
