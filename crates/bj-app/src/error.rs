//! Error types for the bj-app service layer.

use bj_sim::SimError;

/// Service-layer error wrapping the backend crates' errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(#[from] bj_config::ConfigError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimError),

    #[error("Results error: {0}")]
    Results(#[from] bj_results::ResultsError),

    #[error("Pair K={stiffness}, eta={loss_factor} failed: {source}")]
    PairFailed {
        stiffness: f64,
        loss_factor: f64,
        source: SimError,
    },

    #[error("Sweep incomplete: {failed} of {total} pairs failed")]
    SweepIncomplete { failed: usize, total: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bj-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<bj_config::ValidationError> for AppError {
    fn from(err: bj_config::ValidationError) -> Self {
        AppError::Config(err.into())
    }
}
