//! Reduction of a sampled jump trajectory to peak values and their times.

use bj_core::{CoreError, ensure_finite};

use crate::bungee::JumperState;
use crate::error::SimResult;
use crate::sim::Trajectory;

/// A value and the sample time at which it occurs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extremum {
    pub value: f64,
    pub time: f64,
}

/// Peak quantities of one trajectory.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrajectoryExtrema {
    /// Largest |acceleration| of the differentiated velocity series.
    pub max_acceleration: Extremum,
    /// Largest |velocity|.
    pub max_velocity: Extremum,
    /// Lowest (signed) position.
    pub min_position: Extremum,
}

/// Derivative of `values` with respect to `times`.
///
/// Interior points use the second-order central difference for non-uniform
/// spacing; the two end points use first-order one-sided differences.
pub fn gradient(values: &[f64], times: &[f64]) -> SimResult<Vec<f64>> {
    if values.len() != times.len() {
        return Err(CoreError::LengthMismatch {
            what: "gradient values/times",
            left: values.len(),
            right: times.len(),
        }
        .into());
    }
    let n = values.len();
    if n < 2 {
        return Err(CoreError::TooFewSamples {
            what: "gradient",
            needed: 2,
            got: n,
        }
        .into());
    }

    let mut out = Vec::with_capacity(n);
    out.push((values[1] - values[0]) / (times[1] - times[0]));
    for i in 1..n - 1 {
        let hs = times[i] - times[i - 1];
        let hd = times[i + 1] - times[i];
        let num = hs * hs * values[i + 1] + (hd * hd - hs * hs) * values[i] - hd * hd * values[i - 1];
        out.push(num / (hs * hd * (hd + hs)));
    }
    out.push((values[n - 1] - values[n - 2]) / (times[n - 1] - times[n - 2]));
    Ok(out)
}

/// Index of the largest |value|; first index on ties.
pub fn argmax_abs(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.iter().map(|v| v.abs()).enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the smallest value; first index on ties.
pub fn argmin(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v >= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Position series of a jump trajectory.
pub fn positions(trajectory: &Trajectory<JumperState>) -> Vec<f64> {
    trajectory.x.iter().map(|s| s.position).collect()
}

/// Velocity series of a jump trajectory.
pub fn velocities(trajectory: &Trajectory<JumperState>) -> Vec<f64> {
    trajectory.x.iter().map(|s| s.velocity).collect()
}

/// Acceleration series obtained by differentiating the sampled velocity.
pub fn accelerations(trajectory: &Trajectory<JumperState>) -> SimResult<Vec<f64>> {
    gradient(&velocities(trajectory), &trajectory.t)
}

/// Extract peak acceleration, peak speed and lowest point with their times.
pub fn summarize(trajectory: &Trajectory<JumperState>) -> SimResult<TrajectoryExtrema> {
    let accel = accelerations(trajectory)?;
    let vel = velocities(trajectory);
    let pos = positions(trajectory);

    for (series, what) in [(&accel, "acceleration"), (&vel, "velocity"), (&pos, "position")] {
        for &v in series.iter() {
            ensure_finite(v, what)?;
        }
    }

    // gradient() already guarantees at least two samples.
    let pick = |idx: Option<usize>, series: &[f64], abs: bool| {
        let i = idx.unwrap_or(0);
        Extremum {
            value: if abs { series[i].abs() } else { series[i] },
            time: trajectory.t[i],
        }
    };

    Ok(TrajectoryExtrema {
        max_acceleration: pick(argmax_abs(&accel), accel.as_slice(), true),
        max_velocity: pick(argmax_abs(&vel), vel.as_slice(), true),
        min_position: pick(argmin(&pos), pos.as_slice(), false),
    })
}
