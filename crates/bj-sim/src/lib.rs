//! Bungee jump dynamics simulator.
//!
//! Provides:
//! - Two-phase jumper model (free fall, elastic cord) with an explicit phase predicate
//! - `IvpSolver` capability with adaptive Dormand-Prince and fixed-step RK4/Euler solvers
//! - Extrema extraction (peak acceleration, peak speed, lowest point)

pub mod bungee;
pub mod error;
pub mod extrema;
pub mod integrator;
pub mod model;
pub mod sim;

// Internal modules
mod validate;

// Re-exports for public API
pub use bungee::{BungeeModel, CordParams, JumpConstants, JumperState, Phase};
pub use error::{SimError, SimResult};
pub use extrema::{Extremum, TrajectoryExtrema, accelerations, gradient, summarize};
pub use integrator::{DormandPrince45, ForwardEuler, Integrator, RK4};
pub use model::TransientModel;
pub use sim::{
    AdaptiveSolver, ConfiguredSolver, FixedStepSolver, IvpSolver, SolveStats, SolverKind,
    SolverOptions, Trajectory,
};
