//! HTTP response DTOs.

use serde::{Deserialize, Serialize};

use crate::application::use_cases::GoalResult;
use crate::domain::order_allocation::value_objects::{Allocation, Violation};
use crate::domain::shared::Precision;

/// Allocation of one goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalResultResponse {
    /// Goal identifier from the request.
    pub goal_id: String,
    /// Transaction label, e.g. `Investment` or `Big Redemption`.
    pub transaction_type: String,
    /// One entry per allocated product.
    pub transaction_details: Vec<TransactionDetailResponse>,
}

impl GoalResultResponse {
    /// Render a goal result with amounts and units fixed to their precisions.
    #[must_use]
    pub fn new(goal: &GoalResult, amount_precision: Precision, unit_precision: Precision) -> Self {
        Self {
            goal_id: goal.goal_id.clone(),
            transaction_type: goal.result.transaction_type.label().to_string(),
            transaction_details: goal
                .result
                .allocations
                .iter()
                .map(|a| TransactionDetailResponse::new(a, amount_precision, unit_precision))
                .collect(),
        }
    }
}

/// One product's trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetailResponse {
    /// Product ticker.
    pub ticker: String,
    /// `BUY` or `SELL`.
    pub direction: String,
    /// Gross amount, fixed to the amount precision.
    pub value: String,
    /// Units, fixed to the unit precision.
    pub units: String,
    /// Minimum breach, if flagged.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<TradeErrorResponse>,
}

impl TransactionDetailResponse {
    fn new(allocation: &Allocation, amount_precision: Precision, unit_precision: Precision) -> Self {
        Self {
            ticker: allocation.ticker.to_string(),
            direction: allocation.direction.as_str().to_string(),
            value: amount_precision.format(allocation.gross),
            units: unit_precision.format(allocation.units),
            error: allocation.violation().map(TradeErrorResponse::from),
        }
    }
}

/// A flagged minimum breach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeErrorResponse {
    /// Human-readable message.
    pub message: String,
    /// Violation code.
    pub code: String,
}

impl From<&Violation> for TradeErrorResponse {
    fn from(violation: &Violation) -> Self {
        Self {
            message: violation.message.clone(),
            code: violation.code.as_str().to_string(),
        }
    }
}

/// Error body for rejected requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// What was wrong.
    pub message: String,
    /// Status reason phrase.
    pub error: String,
    /// HTTP status code.
    pub status_code: u16,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}
