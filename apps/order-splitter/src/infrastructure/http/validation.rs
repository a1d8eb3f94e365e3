//! Request validation.
//!
//! Turns a [`SplitRequest`] into typed goal orders, or the first contract
//! breach found in request order. Error texts are part of the API.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use super::request::{
    GoalRequest, HoldingRequest, MinimumsRequest, ModelItemRequest, SplitRequest,
};
use crate::application::use_cases::GoalOrder;
use crate::domain::order_allocation::value_objects::{
    Holding, Minimum, ModelTarget, Order, OrderDirection, Product, TradeMinimums,
};
use crate::domain::shared::{DomainError, Precision, Rate, Ticker, Weight};

const HOLDINGS: &str = "goalDetails";
const MODEL: &str = "modelPortfolioDetails";

/// A breach of the request contract. `Display` is the response message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Precision is not a non-negative integer.
    #[error("{field}: must be a non-negative integer")]
    InvalidPrecision {
        /// Field name.
        field: &'static str,
    },

    /// Precision beyond what a decimal can carry.
    #[error("{field}: must be at most {max}")]
    PrecisionOutOfRange {
        /// Field name.
        field: &'static str,
        /// Largest accepted precision.
        max: u32,
    },

    /// A required field or list is empty.
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// A redemption came without holdings.
    #[error("goalDetails must not be empty for redemption orders")]
    NoHoldingsToRedeem,

    /// Holding or model line without a ticker.
    #[error("{list}: ticker must not be empty")]
    BlankTicker {
        /// `goalDetails` or `modelPortfolioDetails`.
        list: &'static str,
    },

    /// Same ticker twice in one list.
    #[error("{list}: duplicate ticker {ticker}")]
    DuplicateTicker {
        /// `goalDetails` or `modelPortfolioDetails`.
        list: &'static str,
        /// Repeated ticker.
        ticker: String,
    },

    /// Order type other than investment or redemption.
    #[error("Unsupported order type: {0}")]
    UnsupportedOrderType(String),

    /// Not parseable as a decimal.
    #[error("{field}: must be a valid decimal number")]
    NotADecimal {
        /// Field name.
        field: String,
    },

    /// Zero or negative where a positive value is required.
    #[error("{field}: must be greater than 0")]
    NotPositive {
        /// Field name.
        field: String,
    },

    /// Negative where zero or more is required.
    #[error("{field}: must be >= 0")]
    Negative {
        /// Field name.
        field: String,
    },

    /// More decimal places than the configured precision.
    #[error("{field}: must have at most {max_places} decimal place(s)")]
    TooManyPlaces {
        /// Field name.
        field: String,
        /// Precision in force.
        max_places: u32,
    },

    /// Too many digits for the configured precision to stay exact.
    #[error("{field}: too large for {max_places} decimal place(s)")]
    TooLarge {
        /// Field name.
        field: String,
        /// Precision in force.
        max_places: u32,
    },

    /// Price so small that unit counts overflow the unit precision.
    #[error("marketPrice ({ticker}): too small for units at {max_places} decimal place(s)")]
    PriceTooSmall {
        /// Product ticker.
        ticker: String,
        /// Unit precision in force.
        max_places: u32,
    },

    /// Missing, malformed or non-positive price.
    #[error("{field}: must be a number greater than 0")]
    InvalidPrice {
        /// Field name.
        field: String,
    },

    /// Rate outside `[0, 1)`.
    #[error("{field}: must be a number >= 0 and < 1")]
    InvalidRate {
        /// Field name.
        field: String,
    },

    /// Weight outside `[0, 1]`.
    #[error("weight ({ticker}): must be a number between 0 and 1")]
    InvalidWeight {
        /// Model ticker.
        ticker: String,
    },

    /// Every model weight is zero.
    #[error("modelPortfolioDetails: at least one weight must be greater than 0")]
    NoPositiveWeight,

    /// Redemption larger than everything held.
    #[error("orderAmount: must not exceed the total holding value")]
    RedemptionExceedsHoldings,

    /// Value object rejected a parsed value.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// A validated request, ready for the engine.
#[derive(Debug, Clone)]
pub struct ParsedSplitRequest {
    /// Precision of emitted amounts.
    pub amount_precision: Precision,
    /// Precision of emitted unit counts.
    pub unit_precision: Precision,
    /// Goals, request order.
    pub goals: Vec<GoalOrder>,
}

/// Validate `request` and build one order per goal.
///
/// # Errors
///
/// Returns the first contract breach found, checking the request header
/// first and then each goal in order.
pub fn parse_split_request(
    request: &SplitRequest,
) -> Result<ParsedSplitRequest, ValidationError> {
    let amount_precision =
        parse_precision(&request.amount_decimal_precision, "amountDecimalPrecision")?;
    let unit_precision =
        parse_precision(&request.unit_decimal_precision, "unitDecimalPrecision")?;
    let volatility_buffer =
        parse_optional_rate(&request.volatility_buffer, "volatilityBuffer")?;

    if request.goals.is_empty() {
        return Err(ValidationError::Empty("goals"));
    }

    let precisions = Precisions {
        amount: amount_precision,
        unit: unit_precision,
    };
    let goals = request
        .goals
        .iter()
        .map(|goal| parse_goal(goal, precisions, volatility_buffer))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ParsedSplitRequest {
        amount_precision,
        unit_precision,
        goals,
    })
}

#[derive(Debug, Clone, Copy)]
struct Precisions {
    amount: Precision,
    unit: Precision,
}

fn parse_goal(
    goal: &GoalRequest,
    precisions: Precisions,
    volatility_buffer: Option<Rate>,
) -> Result<GoalOrder, ValidationError> {
    if goal.goal_id.trim().is_empty() {
        return Err(ValidationError::Empty("goalId"));
    }
    if goal.model_portfolio_id.trim().is_empty() {
        return Err(ValidationError::Empty("modelPortfolioId"));
    }
    if goal.order_type.trim().is_empty() {
        return Err(ValidationError::Empty("orderType"));
    }
    let direction = match goal.order_type.trim().to_lowercase().as_str() {
        "investment" => OrderDirection::Investment,
        "redemption" => OrderDirection::Redemption,
        _ => return Err(ValidationError::UnsupportedOrderType(goal.order_type.clone())),
    };
    let amount = parse_amount(&goal.order_amount, "orderAmount", true, precisions.amount)?;

    if direction == OrderDirection::Redemption && goal.goal_details.is_empty() {
        return Err(ValidationError::NoHoldingsToRedeem);
    }
    let mut seen = HashSet::new();
    let holdings = goal
        .goal_details
        .iter()
        .map(|h| parse_holding(h, precisions, &mut seen))
        .collect::<Result<Vec<_>, _>>()?;

    if goal.model_portfolio_details.is_empty() {
        return Err(ValidationError::Empty(MODEL));
    }
    let mut seen = HashSet::new();
    let targets = goal
        .model_portfolio_details
        .iter()
        .map(|m| parse_model_item(m, precisions, &mut seen))
        .collect::<Result<Vec<_>, _>>()?;
    if !targets.iter().any(|t| t.weight.is_positive()) {
        return Err(ValidationError::NoPositiveWeight);
    }

    let order = Order::new(direction, amount, precisions.amount, precisions.unit)?
        .with_holdings(holdings)
        .with_targets(targets)
        .with_volatility_buffer(volatility_buffer);
    if direction == OrderDirection::Redemption && order.amount() > order.holdings_value() {
        return Err(ValidationError::RedemptionExceedsHoldings);
    }
    check_magnitudes(&order)?;

    Ok(GoalOrder {
        goal_id: goal.goal_id.clone(),
        order,
    })
}

/// Every amount the engine derives from `order` has to fit its grid: the
/// portfolio total, fee gross-ups, unit counts and minimum thresholds.
fn check_magnitudes(order: &Order) -> Result<(), ValidationError> {
    let amounts = order.amount_precision();
    let units = order.unit_precision();
    let too_large = |field: String| ValidationError::TooLarge {
        field,
        max_places: amounts.places(),
    };
    let fits = |value: Option<Decimal>| value.is_some_and(|v| amounts.carries(v));

    let held_total = order
        .checked_holdings_value()
        .filter(|total| amounts.carries(*total))
        .ok_or_else(|| too_large(format!("{HOLDINGS} (total value)")))?;
    let post_total = match order.direction() {
        OrderDirection::Investment => held_total
            .checked_add(order.amount())
            .filter(|total| amounts.carries(*total))
            .ok_or_else(|| too_large(format!("orderAmount (plus {HOLDINGS})")))?,
        OrderDirection::Redemption => held_total,
    };

    let products = order
        .holdings()
        .iter()
        .map(|h| &h.product)
        .chain(order.targets().iter().map(|t| &t.product));
    for product in products {
        let minimums = product.minimums();
        if !minimums
            .purchases()
            .chain(minimums.sales())
            .all(|m| fits(m.checked_threshold(product.price())))
        {
            return Err(too_large(format!("minimums ({})", product.ticker())));
        }
    }

    // Largest trade each product can see: the whole order on a purchase,
    // at most what is held on a sale.
    let held: HashMap<&str, Decimal> = order
        .holdings()
        .iter()
        .filter(|h| h.is_held())
        .map(|h| (h.product.ticker().as_str(), h.value))
        .collect();
    let weighted = order.targets().iter().filter(|t| t.weight.is_positive());
    let trades: Vec<(&Product, Decimal)> = match order.direction() {
        OrderDirection::Investment => weighted.map(|t| (&t.product, order.amount())).collect(),
        OrderDirection::Redemption => order
            .holdings()
            .iter()
            .map(|h| (&h.product, h.value))
            .chain(weighted.filter_map(|t| {
                held.get(t.product.ticker().as_str())
                    .map(|value| (&t.product, *value))
            }))
            .collect(),
    };
    for (product, largest) in trades {
        let unit_count = largest.checked_div(product.price());
        if !unit_count.is_some_and(|u| units.carries(u)) {
            return Err(ValidationError::PriceTooSmall {
                ticker: product.ticker().to_string(),
                max_places: units.places(),
            });
        }
    }

    if order.direction() == OrderDirection::Investment {
        for target in order.targets().iter().filter(|t| t.weight.is_positive()) {
            let product = &target.product;
            if !fits(product.checked_gross_for_net(post_total)) {
                return Err(too_large(format!("transactionFee ({})", product.ticker())));
            }
            if !product.minimums().purchases().all(|m| {
                fits(
                    m.checked_threshold(product.price())
                        .and_then(|t| product.checked_gross_for_net(t)),
                )
            }) {
                return Err(too_large(format!("minimums ({})", product.ticker())));
            }
        }
    }
    Ok(())
}

fn parse_holding(
    holding: &HoldingRequest,
    precisions: Precisions,
    seen: &mut HashSet<Ticker>,
) -> Result<Holding, ValidationError> {
    let ticker = parse_ticker(&holding.ticker, HOLDINGS, seen)?;
    let units = parse_amount(
        &holding.units,
        &format!("units ({ticker})"),
        false,
        precisions.unit,
    )?;
    let price = parse_price(&holding.market_price, &ticker)?;
    let value = parse_amount(
        &holding.value,
        &format!("value ({ticker})"),
        false,
        precisions.amount,
    )?;
    let minimums = parse_minimums(&holding.minimums, &ticker, precisions)?;
    let fee = parse_optional_rate(&holding.transaction_fee, &format!("transactionFee ({ticker})"))?
        .unwrap_or(Rate::ZERO);

    let product = Product::new(ticker, price, fee)?.with_minimums(minimums);
    Ok(Holding::new(product, units, value)?)
}

fn parse_model_item(
    item: &ModelItemRequest,
    precisions: Precisions,
    seen: &mut HashSet<Ticker>,
) -> Result<ModelTarget, ValidationError> {
    let ticker = parse_ticker(&item.ticker, MODEL, seen)?;
    let weight = Decimal::from_str(item.weight.trim())
        .ok()
        .and_then(|w| Weight::new(w).ok())
        .ok_or_else(|| ValidationError::InvalidWeight {
            ticker: ticker.to_string(),
        })?;
    let price = parse_price(&item.market_price, &ticker)?;
    let minimums = parse_minimums(&item.minimums, &ticker, precisions)?;
    let fee = parse_optional_rate(&item.transaction_fee, &format!("transactionFee ({ticker})"))?
        .unwrap_or(Rate::ZERO);

    let product = Product::new(ticker, price, fee)?.with_minimums(minimums);
    Ok(ModelTarget::new(product, weight))
}

fn parse_ticker(
    raw: &str,
    list: &'static str,
    seen: &mut HashSet<Ticker>,
) -> Result<Ticker, ValidationError> {
    let ticker = Ticker::new(raw).map_err(|_| ValidationError::BlankTicker { list })?;
    if !seen.insert(ticker.clone()) {
        return Err(ValidationError::DuplicateTicker {
            list,
            ticker: ticker.into_inner(),
        });
    }
    Ok(ticker)
}

/// Amount minimums at the amount precision, unit minimums at the unit
/// precision, all optional.
fn parse_minimums(
    raw: &MinimumsRequest,
    ticker: &Ticker,
    precisions: Precisions,
) -> Result<TradeMinimums, ValidationError> {
    let amount = |value: &str, name: &str| {
        parse_optional_amount(value, &format!("{name} ({ticker})"), precisions.amount)
    };
    let units = |value: &str, name: &str| {
        parse_optional_amount(value, &format!("{name} ({ticker})"), precisions.unit)
    };

    let initial_amount = amount(&raw.min_initial_investment_amt, "minInitialInvestmentAmt")?;
    let top_up_amount = amount(&raw.min_topup_amt, "minTopupAmt")?;
    let redemption_amount = amount(&raw.min_redemption_amt, "minRedemptionAmt")?;
    let holding_amount = amount(&raw.min_holding_amt, "minHoldingAmt")?;
    let initial_units = units(&raw.min_initial_investment_units, "minInitialInvestmentUnits")?;
    let top_up_units = units(&raw.min_topup_units, "minTopupUnits")?;
    let redemption_units = units(&raw.min_redemption_units, "minRedemptionUnits")?;
    let holding_units = units(&raw.min_holding_units, "minHoldingUnits")?;

    Ok(TradeMinimums {
        initial_investment: Minimum::new(initial_amount, initial_units),
        top_up: Minimum::new(top_up_amount, top_up_units),
        redemption: Minimum::new(redemption_amount, redemption_units),
        holding: Minimum::new(holding_amount, holding_units),
    })
}

fn parse_precision(raw: &str, field: &'static str) -> Result<Precision, ValidationError> {
    let places: u32 = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidPrecision { field })?;
    Precision::new(places).map_err(|_| ValidationError::PrecisionOutOfRange {
        field,
        max: Precision::MAX_PLACES,
    })
}

fn parse_decimal(raw: &str, field: &str) -> Result<Decimal, ValidationError> {
    Decimal::from_str(raw.trim()).map_err(|_| ValidationError::NotADecimal {
        field: field.to_string(),
    })
}

fn parse_amount(
    raw: &str,
    field: &str,
    positive: bool,
    precision: Precision,
) -> Result<Decimal, ValidationError> {
    let value = parse_decimal(raw, field)?;
    if positive && value <= Decimal::ZERO {
        return Err(ValidationError::NotPositive {
            field: field.to_string(),
        });
    }
    if value < Decimal::ZERO {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if value.scale() > precision.places() {
        return Err(ValidationError::TooManyPlaces {
            field: field.to_string(),
            max_places: precision.places(),
        });
    }
    if !precision.carries(value) {
        return Err(ValidationError::TooLarge {
            field: field.to_string(),
            max_places: precision.places(),
        });
    }
    Ok(value)
}

fn parse_optional_amount(
    raw: &str,
    field: &str,
    precision: Precision,
) -> Result<Decimal, ValidationError> {
    if raw.trim().is_empty() {
        return Ok(Decimal::ZERO);
    }
    parse_amount(raw, field, false, precision)
}

fn parse_price(raw: &str, ticker: &Ticker) -> Result<Decimal, ValidationError> {
    Decimal::from_str(raw.trim())
        .ok()
        .filter(|price| *price > Decimal::ZERO)
        .ok_or_else(|| ValidationError::InvalidPrice {
            field: format!("marketPrice ({ticker})"),
        })
}

fn parse_optional_rate(raw: &str, field: &str) -> Result<Option<Rate>, ValidationError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    Decimal::from_str(raw.trim())
        .ok()
        .and_then(|r| Rate::new(r).ok())
        .map(Some)
        .ok_or_else(|| ValidationError::InvalidRate {
            field: field.to_string(),
        })
}
