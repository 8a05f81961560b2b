//! Shared application service layer for the bungee sweep.
//!
//! Turns a validated `RunConfig` into a grid of (stiffness, loss factor)
//! pairs, integrates each one and collects the per-pair summaries. The CLI
//! only formats what this crate returns.

pub mod error;
pub mod progress;
pub mod sweep_service;

pub use error::{AppError, AppResult};
pub use progress::{SweepProgressEvent, SweepStage};
pub use sweep_service::{
    PairFailure, PairOutcome, PairRun, ParameterGrid, SweepOptions, SweepReport, SweepRequest,
    SweepTimingSummary, run_sweep, run_sweep_with_progress, simulate_pair,
};
