//! HTTP request DTOs.
//!
//! Every number travels as a string so no precision is lost before the
//! decimal parser sees it. Absent fields deserialize to empty strings and
//! are judged by the validator.

use serde::{Deserialize, Serialize};

/// Body of `POST /split`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SplitRequest {
    /// Decimal places of every emitted amount.
    pub amount_decimal_precision: String,
    /// Decimal places of every emitted unit count.
    pub unit_decimal_precision: String,
    /// Optional volatility buffer rate for redemption sizing.
    pub volatility_buffer: String,
    /// Goals to split, answered in the same order.
    pub goals: Vec<GoalRequest>,
}

/// One goal: its holdings, its model and the order to place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoalRequest {
    /// Caller's goal identifier.
    pub goal_id: String,
    /// Current holdings.
    pub goal_details: Vec<HoldingRequest>,
    /// Gross order amount.
    pub order_amount: String,
    /// `investment` or `redemption`, any case.
    pub order_type: String,
    /// Model portfolio identifier.
    pub model_portfolio_id: String,
    /// Model portfolio composition.
    pub model_portfolio_details: Vec<ModelItemRequest>,
}

/// Trade minimums shared by holdings and model items. Empty means zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MinimumsRequest {
    /// First purchase, amount.
    pub min_initial_investment_amt: String,
    /// First purchase, units.
    pub min_initial_investment_units: String,
    /// Purchase of a held product, amount.
    pub min_topup_amt: String,
    /// Purchase of a held product, units.
    pub min_topup_units: String,
    /// Any sale, amount.
    pub min_redemption_amt: String,
    /// Any sale, units.
    pub min_redemption_units: String,
    /// Left after a partial sale, amount.
    pub min_holding_amt: String,
    /// Left after a partial sale, units.
    pub min_holding_units: String,
}

/// A current position.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HoldingRequest {
    /// Product ticker.
    pub ticker: String,
    /// Units held.
    pub units: String,
    /// Price per unit.
    pub market_price: String,
    /// Market value of the position.
    pub value: String,
    /// Trade minimums.
    #[serde(flatten)]
    pub minimums: MinimumsRequest,
    /// Fee rate, empty for none.
    pub transaction_fee: String,
}

/// A model portfolio line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelItemRequest {
    /// Product ticker.
    pub ticker: String,
    /// Target weight in `[0, 1]`.
    pub weight: String,
    /// Price per unit.
    pub market_price: String,
    /// Trade minimums.
    #[serde(flatten)]
    pub minimums: MinimumsRequest,
    /// Fee rate, empty for none.
    pub transaction_fee: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_with_flattened_minimums() {
        let json = r#"{
            "amountDecimalPrecision": "2",
            "unitDecimalPrecision": "0",
            "goals": [{
                "goalId": "g1",
                "orderAmount": "100",
                "orderType": "investment",
                "modelPortfolioId": "m1",
                "modelPortfolioDetails": [{
                    "ticker": "AAA",
                    "weight": "1",
                    "marketPrice": "10",
                    "minTopupAmt": "25"
                }]
            }]
        }"#;
        let request: SplitRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.volatility_buffer, "");
        let goal = &request.goals[0];
        assert!(goal.goal_details.is_empty());
        assert_eq!(goal.model_portfolio_details[0].minimums.min_topup_amt, "25");
        assert_eq!(goal.model_portfolio_details[0].transaction_fee, "");
    }
}
