use crate::{CoreError, CoreResult};

/// Floating point type used throughout the simulator.
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> CoreResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Evenly spaced points from `start` to `end` inclusive.
///
/// A single point yields `[start]`; the last point is always exactly `end`.
pub fn linspace(start: Real, end: Real, count: usize) -> Vec<Real> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let delta = (end - start) / (count - 1) as Real;
            let mut points: Vec<Real> = (0..count).map(|i| start + i as Real * delta).collect();
            points[count - 1] = end;
            points
        }
    }
}

/// Round half away from zero to the given number of decimal places.
pub fn round_to(value: Real, decimals: u32) -> Real {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn linspace_matches_stiffness_axis() {
        let points = linspace(40.0, 240.0, 7);
        assert_eq!(points.len(), 7);
        assert!((points[1] - 73.333_333_333).abs() < 1e-6);
        assert_eq!(points[6], 240.0);
    }

    #[test]
    fn linspace_single_point_is_start() {
        assert_eq!(linspace(0.15, 0.30, 1), vec![0.15]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn round_to_decimals() {
        assert_eq!(round_to(73.333_333, 1), 73.3);
        assert_eq!(round_to(106.666_666, 1), 106.7);
        assert_eq!(round_to(0.15, 3), 0.15);
    }
}
