//! Application Use Cases

mod split_goals;

pub use split_goals::{
    DEFAULT_MIN_PARALLEL_GOALS, GoalOrder, GoalResult, SplitGoalsError, SplitGoalsUseCase,
};
