//! Error types for simulation operations.

use thiserror::Error;

/// Errors encountered while integrating a jump.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Invalid parameter: {what} = {value}")]
    InvalidParameter { what: &'static str, value: f64 },

    #[error("Non-finite state at t = {t} s")]
    NonFinite { t: f64 },

    #[error("Convergence failed at t = {t} s: step size {step:e} s below minimum")]
    ConvergenceFailed { t: f64, step: f64 },

    #[error("Step limit of {max_steps} reached at t = {t} s")]
    StepLimit { max_steps: usize, t: f64 },

    #[error("Wall-clock limit reached at t = {t} s")]
    Timeout { t: f64 },

    #[error("Numeric error: {0}")]
    Core(#[from] bj_core::CoreError),
}

pub type SimResult<T> = Result<T, SimError>;
