//! Run configuration validation.

use std::collections::HashSet;
use std::time::Duration;

use crate::schema::{LATEST_VERSION, RunConfig, SolverMethod};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Empty sweep axis: {axis}")]
    EmptyAxis { axis: String },

    #[error("Duplicate value {value} on sweep axis {axis}")]
    DuplicateValue { axis: String, value: f64 },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn require(ok: bool, field: &str, value: f64, reason: &str) -> Result<(), ValidationError> {
    if ok && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, value, reason))
    }
}

pub fn validate_config(config: &RunConfig) -> Result<(), ValidationError> {
    if config.version == 0 || config.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: config.version,
        });
    }

    let j = &config.jumper;
    require(j.mass_kg > 0.0, "jumper.mass_kg", j.mass_kg, "must be positive")?;
    require(
        j.gravity_mps2 > 0.0,
        "jumper.gravity_mps2",
        j.gravity_mps2,
        "must be positive",
    )?;
    require(
        j.cord_length_m >= 0.0,
        "jumper.cord_length_m",
        j.cord_length_m,
        "must be non-negative",
    )?;
    require(
        j.air_drag_ns_per_m >= 0.0,
        "jumper.air_drag_ns_per_m",
        j.air_drag_ns_per_m,
        "must be non-negative",
    )?;
    require(true, "jumper.start_height_m", j.start_height_m, "must be finite")?;
    require(
        true,
        "jumper.initial_velocity_mps",
        j.initial_velocity_mps,
        "must be finite",
    )?;

    let t = &config.time;
    require(t.t_end_s > 0.0, "time.t_end_s", t.t_end_s, "must be positive")?;
    if t.samples < 2 {
        return Err(invalid("time.samples", t.samples, "need at least 2 samples"));
    }

    validate_axis(
        "grid.stiffness_n_per_m",
        &config.stiffness_values(),
        |k| k > 0.0,
        "stiffness must be positive",
    )?;
    validate_axis(
        "grid.loss_factor",
        &config.loss_factor_values(),
        |eta| eta >= 0.0,
        "loss factor must be non-negative",
    )?;

    let s = &config.solver;
    match s.method {
        SolverMethod::Adaptive => {
            require(s.rtol > 0.0, "solver.rtol", s.rtol, "must be positive")?;
            require(s.atol > 0.0, "solver.atol", s.atol, "must be positive")?;
        }
        SolverMethod::Rk4 | SolverMethod::Euler => {
            require(s.dt_s > 0.0, "solver.dt_s", s.dt_s, "must be positive")?;
        }
    }
    if s.max_steps == 0 {
        return Err(invalid("solver.max_steps", s.max_steps, "must be positive"));
    }
    if let Some(limit) = s.max_wall_time_s {
        require(
            Duration::try_from_secs_f64(limit).is_ok(),
            "solver.max_wall_time_s",
            limit,
            "must be a non-negative duration in range",
        )?;
    }

    Ok(())
}

fn validate_axis(
    axis: &str,
    values: &[f64],
    accept: impl Fn(f64) -> bool,
    reason: &str,
) -> Result<(), ValidationError> {
    if values.is_empty() {
        return Err(ValidationError::EmptyAxis {
            axis: axis.to_string(),
        });
    }
    let mut seen = HashSet::new();
    for &v in values {
        require(accept(v), axis, v, reason)?;
        if !seen.insert(v.to_bits()) {
            return Err(ValidationError::DuplicateValue {
                axis: axis.to_string(),
                value: v,
            });
        }
    }
    Ok(())
}
