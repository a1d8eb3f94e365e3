// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Order Splitter - Rust Core Library
//!
//! Deterministic engine that splits a goal's cash order across the products
//! of a model portfolio.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: decimal value objects and the allocation engine
//!   - `shared`: `Precision`, `Rate`, `Weight`, `Ticker`, `DomainError`
//!   - `order_allocation`: products, orders, investment and redemption
//!     allocators, violation repair
//!
//! - **Application**: `SplitGoalsUseCase`, batching goals over rayon
//!
//! - **Infrastructure**: the axum `/split` adapter and its validation
//!
//! Configuration and tracing setup live beside the layers in [`config`]
//! and [`telemetry`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases.
pub mod application;

/// Infrastructure layer - Adapters.
pub mod infrastructure;

/// Configuration loading.
pub mod config;

/// Tracing subscriber setup.
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

// Domain re-exports
pub use domain::order_allocation::{
    Allocation, AllocationService, Holding, ModelTarget, Order, OrderDirection, OrderResult,
    Product, TradeDirection, TradeMinimums, TransactionType, Violation, ViolationCode,
};
pub use domain::shared::{DomainError, Precision, Rate, Ticker, Weight};

// Application re-exports
pub use application::use_cases::{GoalOrder, GoalResult, SplitGoalsUseCase};

// Infrastructure re-exports
pub use infrastructure::http::{AppState, create_router};
