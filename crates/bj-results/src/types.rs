//! Result data types.

use bj_sim::{CordParams, JumpConstants, JumperState, SimResult, Trajectory, TrajectoryExtrema};
use serde::{Deserialize, Serialize};

/// Column order of the summary table.
pub const SUMMARY_HEADER: [&str; 8] = [
    "eta",
    "K",
    "max_acc",
    "max_acc_time",
    "max_vel",
    "max_vel_time",
    "min_pos",
    "min_pos_time",
];

/// Peak values of one (stiffness, loss factor) pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SummaryRecord {
    #[serde(rename = "eta")]
    pub loss_factor: f64,
    #[serde(rename = "K")]
    pub stiffness: f64,
    pub max_acc: f64,
    pub max_acc_time: f64,
    pub max_vel: f64,
    pub max_vel_time: f64,
    pub min_pos: f64,
    pub min_pos_time: f64,
}

impl SummaryRecord {
    pub fn new(cord: &CordParams, extrema: &TrajectoryExtrema) -> Self {
        Self {
            loss_factor: cord.loss_factor(),
            stiffness: cord.stiffness(),
            max_acc: extrema.max_acceleration.value,
            max_acc_time: extrema.max_acceleration.time,
            max_vel: extrema.max_velocity.value,
            max_vel_time: extrema.max_velocity.time,
            min_pos: extrema.min_position.value,
            min_pos_time: extrema.min_position.time,
        }
    }
}

/// Sampled position/velocity/acceleration of one pair, ready for export.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectorySeries {
    pub stiffness: f64,
    pub loss_factor: f64,
    pub t: Vec<f64>,
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    pub acceleration: Vec<f64>,
}

impl TrajectorySeries {
    pub fn from_trajectory(cord: &CordParams, traj: &Trajectory<JumperState>) -> SimResult<Self> {
        Ok(Self {
            stiffness: cord.stiffness(),
            loss_factor: cord.loss_factor(),
            t: traj.t.clone(),
            position: bj_sim::extrema::positions(traj),
            velocity: bj_sim::extrema::velocities(traj),
            acceleration: bj_sim::accelerations(traj)?,
        })
    }

    pub fn label(&self) -> String {
        format!("K={}, η={}", self.stiffness, self.loss_factor)
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }
}

/// Reference overlays for the position panel.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceLines {
    /// Drag-free fall from the start height, clamped at the ground.
    pub free_fall: Vec<(f64, f64)>,
    /// Position at which the cord reaches its natural length.
    pub cord_position: f64,
}

impl ReferenceLines {
    pub fn new(constants: &JumpConstants, t: &[f64]) -> Self {
        Self {
            free_fall: t
                .iter()
                .map(|&ti| (ti, constants.free_fall_position(ti).max(0.0)))
                .collect(),
            cord_position: constants.engagement_position(),
        }
    }
}
