//! Split Goals Use Case
//!
//! Allocates every goal of a request independently. Batches at or above
//! the parallel threshold fan out over the rayon pool; results always come
//! back in request order.

use std::time::Instant;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{Level, info, span};

use crate::domain::order_allocation::services::AllocationService;
use crate::domain::order_allocation::value_objects::{Order, OrderResult};

/// Default batch size at which goals are processed in parallel.
pub const DEFAULT_MIN_PARALLEL_GOALS: usize = 8;

/// Errors raised while setting up the use case.
#[derive(Debug, Error)]
pub enum SplitGoalsError {
    /// The global rayon pool could not be built.
    #[error("failed to configure thread pool: {message}")]
    ThreadPool {
        /// Builder error text.
        message: String,
    },
}

/// One goal's order, tagged with its caller-supplied identifier.
#[derive(Debug, Clone)]
pub struct GoalOrder {
    /// Goal identifier, echoed back in the result.
    pub goal_id: String,
    /// Validated order.
    pub order: Order,
}

/// One goal's allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalResult {
    /// Goal identifier.
    pub goal_id: String,
    /// Engine output.
    pub result: OrderResult,
}

/// Runs the allocation engine over a batch of goals.
#[derive(Debug, Clone)]
pub struct SplitGoalsUseCase {
    service: AllocationService,
    min_parallel_goals: usize,
}

impl Default for SplitGoalsUseCase {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_PARALLEL_GOALS)
    }
}

impl SplitGoalsUseCase {
    /// Create a use case that goes parallel from `min_parallel_goals` goals.
    #[must_use]
    pub const fn new(min_parallel_goals: usize) -> Self {
        Self {
            service: AllocationService::new(),
            min_parallel_goals,
        }
    }

    /// Size the global rayon pool. Zero keeps rayon's default.
    ///
    /// # Errors
    ///
    /// Returns error if the global pool was already built.
    pub fn configure_thread_pool(max_threads: usize) -> Result<(), SplitGoalsError> {
        if max_threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(max_threads)
                .build_global()
                .map_err(|e| SplitGoalsError::ThreadPool {
                    message: e.to_string(),
                })?;
        }
        Ok(())
    }

    /// Allocate every goal, preserving input order.
    #[must_use]
    pub fn execute(&self, goals: &[GoalOrder]) -> Vec<GoalResult> {
        let start = Instant::now();
        let parallel = goals.len() >= self.min_parallel_goals;

        let results: Vec<GoalResult> = if parallel {
            goals.par_iter().map(|goal| self.split_one(goal)).collect()
        } else {
            goals.iter().map(|goal| self.split_one(goal)).collect()
        };

        info!(
            goals = results.len(),
            parallel,
            violations = results
                .iter()
                .map(|r| r.result.violation_count())
                .sum::<usize>(),
            elapsed_us = start.elapsed().as_micros(),
            "split goals"
        );
        results
    }

    fn split_one(&self, goal: &GoalOrder) -> GoalResult {
        let _span = span!(Level::DEBUG, "goal", goal_id = %goal.goal_id).entered();
        GoalResult {
            goal_id: goal.goal_id.clone(),
            result: self.service.allocate(&goal.order),
        }
    }
}
