//! Parameter checks applied before integration.

use crate::error::{SimError, SimResult};

/// Accept finite values strictly greater than zero.
pub(crate) fn validate_positive(val: f64, what: &'static str) -> SimResult<f64> {
    if !val.is_finite() || val <= 0.0 {
        return Err(SimError::InvalidParameter { what, value: val });
    }
    Ok(val)
}

/// Accept finite values greater than or equal to zero.
pub(crate) fn validate_non_negative(val: f64, what: &'static str) -> SimResult<f64> {
    if !val.is_finite() || val < 0.0 {
        return Err(SimError::InvalidParameter { what, value: val });
    }
    Ok(val)
}

/// Accept any finite value.
pub(crate) fn validate_finite(val: f64, what: &'static str) -> SimResult<f64> {
    if !val.is_finite() {
        return Err(SimError::InvalidParameter { what, value: val });
    }
    Ok(val)
}

/// Sample times must be non-empty, finite and strictly increasing.
pub(crate) fn validate_time_grid(t_eval: &[f64]) -> SimResult<()> {
    if t_eval.is_empty() {
        return Err(SimError::InvalidArg {
            what: "sample times must not be empty",
        });
    }
    if t_eval.iter().any(|t| !t.is_finite()) {
        return Err(SimError::InvalidArg {
            what: "sample times must be finite",
        });
    }
    if t_eval.windows(2).any(|w| w[1] <= w[0]) {
        return Err(SimError::InvalidArg {
            what: "sample times must be strictly increasing",
        });
    }
    Ok(())
}
