//! Allocation engine tuning.

use serde::{Deserialize, Serialize};

use crate::application::use_cases::DEFAULT_MIN_PARALLEL_GOALS;

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Batch size from which goals are split in parallel.
    #[serde(default = "default_min_parallel_goals")]
    pub min_parallel_goals: usize,
    /// Worker threads for the parallel pool. Zero keeps the rayon default.
    #[serde(default)]
    pub max_threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_parallel_goals: default_min_parallel_goals(),
            max_threads: 0,
        }
    }
}

const fn default_min_parallel_goals() -> usize {
    DEFAULT_MIN_PARALLEL_GOALS
}
