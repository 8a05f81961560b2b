//! Run configuration schema.
//!
//! Every section has defaults, so an empty file describes the reference
//! jump: 70 kg jumper from 100 m on an 18 m cord, 20 s sampled 1000 times,
//! stiffness 40..240 N/m in 7 steps and a single loss factor of 0.15.

use std::time::Duration;

use bj_core::units::{kg, m, mps, mps2, ns_per_m};
use bj_core::{linspace, round_to};
use bj_sim::{JumpConstants, SimResult, SolverKind, SolverOptions};
use serde::{Deserialize, Serialize};

pub const LATEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub jumper: JumperDef,
    #[serde(default)]
    pub time: TimeDef,
    #[serde(default)]
    pub grid: GridDef,
    #[serde(default)]
    pub solver: SolverDef,
}

fn default_version() -> u32 {
    LATEST_VERSION
}

fn default_name() -> String {
    "bungee jump".to_string()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            name: default_name(),
            jumper: JumperDef::default(),
            time: TimeDef::default(),
            grid: GridDef::default(),
            solver: SolverDef::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JumperDef {
    pub mass_kg: f64,
    pub gravity_mps2: f64,
    pub cord_length_m: f64,
    pub air_drag_ns_per_m: f64,
    pub start_height_m: f64,
    pub initial_velocity_mps: f64,
}

impl Default for JumperDef {
    fn default() -> Self {
        let c = JumpConstants::default();
        Self {
            mass_kg: c.mass(),
            gravity_mps2: c.gravity(),
            cord_length_m: c.cord_length(),
            air_drag_ns_per_m: c.air_drag(),
            start_height_m: c.start_height(),
            initial_velocity_mps: c.initial_velocity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimeDef {
    pub t_end_s: f64,
    pub samples: usize,
}

impl Default for TimeDef {
    fn default() -> Self {
        Self {
            t_end_s: 20.0,
            samples: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GridDef {
    pub stiffness_n_per_m: AxisDef,
    pub loss_factor: AxisDef,
}

impl Default for GridDef {
    fn default() -> Self {
        Self {
            stiffness_n_per_m: AxisDef::Linspace {
                start: 40.0,
                end: 240.0,
                count: 7,
                decimals: Some(1),
            },
            loss_factor: AxisDef::Linspace {
                start: 0.15,
                end: 0.30,
                count: 1,
                decimals: Some(3),
            },
        }
    }
}

/// One sweep axis: an explicit list or an evenly spaced range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AxisDef {
    Values(Vec<f64>),
    Linspace {
        start: f64,
        end: f64,
        count: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        decimals: Option<u32>,
    },
}

impl AxisDef {
    /// Expanded axis values, in order.
    pub fn points(&self) -> Vec<f64> {
        match self {
            AxisDef::Values(values) => values.clone(),
            AxisDef::Linspace {
                start,
                end,
                count,
                decimals,
            } => {
                let points = linspace(*start, *end, *count);
                match decimals {
                    Some(d) => points.into_iter().map(|p| round_to(p, *d)).collect(),
                    None => points,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SolverMethod {
    #[default]
    Adaptive,
    Rk4,
    Euler,
}

impl From<SolverMethod> for SolverKind {
    fn from(method: SolverMethod) -> Self {
        match method {
            SolverMethod::Adaptive => SolverKind::Adaptive,
            SolverMethod::Rk4 => SolverKind::RK4,
            SolverMethod::Euler => SolverKind::ForwardEuler,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SolverDef {
    pub method: SolverMethod,
    pub rtol: f64,
    pub atol: f64,
    pub dt_s: f64,
    pub max_steps: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_wall_time_s: Option<f64>,
}

impl Default for SolverDef {
    fn default() -> Self {
        let opts = SolverOptions::default();
        Self {
            method: SolverMethod::default(),
            rtol: opts.rtol,
            atol: opts.atol,
            dt_s: opts.dt,
            max_steps: opts.max_steps,
            max_wall_time_s: None,
        }
    }
}

impl RunConfig {
    /// Equally spaced sample times from 0 to `t_end_s`, both ends included.
    pub fn time_grid(&self) -> Vec<f64> {
        linspace(0.0, self.time.t_end_s, self.time.samples)
    }

    pub fn stiffness_values(&self) -> Vec<f64> {
        self.grid.stiffness_n_per_m.points()
    }

    pub fn loss_factor_values(&self) -> Vec<f64> {
        self.grid.loss_factor.points()
    }

    pub fn jump_constants(&self) -> SimResult<JumpConstants> {
        let j = &self.jumper;
        JumpConstants::new(
            kg(j.mass_kg),
            mps2(j.gravity_mps2),
            m(j.cord_length_m),
            ns_per_m(j.air_drag_ns_per_m),
            m(j.start_height_m),
        )?
        .with_initial_velocity(mps(j.initial_velocity_mps))
    }

    pub fn solver_options(&self) -> SolverOptions {
        SolverOptions {
            kind: self.solver.method.into(),
            rtol: self.solver.rtol,
            atol: self.solver.atol,
            dt: self.solver.dt_s,
            max_steps: self.solver.max_steps,
            // Out-of-range limits are rejected by validation and dropped here.
            max_wall_time: self
                .solver
                .max_wall_time_s
                .and_then(|s| Duration::try_from_secs_f64(s).ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_matches_reference_sweep() {
        let cfg = RunConfig::default();
        assert_eq!(
            cfg.stiffness_values(),
            vec![40.0, 73.3, 106.7, 140.0, 173.3, 206.7, 240.0]
        );
        assert_eq!(cfg.loss_factor_values(), vec![0.15]);
    }

    #[test]
    fn default_time_grid() {
        let t = RunConfig::default().time_grid();
        assert_eq!(t.len(), 1000);
        assert_eq!(t[0], 0.0);
        assert_eq!(t[999], 20.0);
    }

    #[test]
    fn default_constants_round_trip_through_units() {
        let c = RunConfig::default().jump_constants().unwrap();
        assert_eq!(c, JumpConstants::default());
    }

    #[test]
    fn solver_options_follow_method() {
        let mut cfg = RunConfig::default();
        cfg.solver.method = SolverMethod::Rk4;
        cfg.solver.max_wall_time_s = Some(2.5);
        let opts = cfg.solver_options();
        assert_eq!(opts.kind, SolverKind::RK4);
        assert_eq!(opts.max_wall_time, Some(Duration::from_millis(2500)));

        cfg.solver.max_wall_time_s = Some(1e20);
        assert_eq!(cfg.solver_options().max_wall_time, None);
    }

    proptest::proptest! {
        #[test]
        fn linspace_axis_spans_both_ends(
            start in 1.0f64..100.0,
            span in 1.0f64..300.0,
            count in 2usize..50,
        ) {
            let axis = AxisDef::Linspace { start, end: start + span, count, decimals: None };
            let points = axis.points();
            proptest::prop_assert_eq!(points.len(), count);
            proptest::prop_assert_eq!(points[0], start);
            proptest::prop_assert_eq!(points[count - 1], start + span);
            proptest::prop_assert!(points.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn explicit_axis_values_kept_verbatim() {
        let axis = AxisDef::Values(vec![0.3, 0.1]);
        assert_eq!(axis.points(), vec![0.3, 0.1]);
    }
}
