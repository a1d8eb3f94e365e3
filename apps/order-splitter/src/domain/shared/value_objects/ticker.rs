//! Ticker value object for product identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::DomainError;

/// A product identifier (fund code, ETF ticker).
///
/// Tickers are matched exactly between holdings and the model portfolio,
/// so no case normalization is applied; only surrounding whitespace is
/// trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    /// Create a new Ticker.
    ///
    /// # Errors
    ///
    /// Returns error if the ticker is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid("ticker", "must not be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the ticker string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticker_trims_whitespace() {
        let t = Ticker::new("  VWRA ").unwrap();
        assert_eq!(t.as_str(), "VWRA");
    }

    #[test]
    fn ticker_keeps_case() {
        let t = Ticker::new("abc").unwrap();
        assert_eq!(t.to_string(), "abc");
        assert_ne!(t, Ticker::new("ABC").unwrap());
    }

    #[test]
    fn ticker_rejects_blank() {
        assert!(Ticker::new("").is_err());
        assert!(Ticker::new("   ").is_err());
    }
}
