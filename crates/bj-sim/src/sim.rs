//! Initial-value problem solvers and sampled trajectories.
//!
//! An [`IvpSolver`] takes a [`TransientModel`] and a strictly increasing list
//! of sample times and returns the state at every sample time. The model's
//! initial state is taken to hold at the first sample time. Any compliant
//! integrator can be substituted; the sweep only depends on this contract.

use std::time::Duration;

use bj_core::timing::Deadline;

use crate::error::{SimError, SimResult};
use crate::integrator::{DormandPrince45, ForwardEuler, Integrator, RK4, error_norm};
use crate::model::{TransientModel, is_finite_state};
use crate::validate::validate_time_grid;

/// Counters collected while solving.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SolveStats {
    pub rhs_calls: usize,
    pub accepted_steps: usize,
    pub rejected_steps: usize,
}

/// Sampled solution of an initial-value problem.
#[derive(Clone, Debug)]
pub struct Trajectory<S> {
    /// Sample times (seconds)
    pub t: Vec<f64>,
    /// State at each sample time
    pub x: Vec<S>,
    pub stats: SolveStats,
}

impl<S> Trajectory<S> {
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }
}

/// Injected integration capability.
pub trait IvpSolver {
    /// Integrate `model` from `t_eval[0]` and sample it at every `t_eval`.
    fn solve<M: TransientModel>(
        &self,
        model: &M,
        t_eval: &[f64],
    ) -> SimResult<Trajectory<M::State>>;
}

/// Integrator selection for simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SolverKind {
    /// Dormand-Prince 5(4) with adaptive step size (default).
    #[default]
    Adaptive,
    /// 4th-order Runge-Kutta, fixed step.
    RK4,
    /// Forward Euler, fixed step.
    ForwardEuler,
}

/// Options for simulation runs.
#[derive(Clone, Debug)]
pub struct SolverOptions {
    pub kind: SolverKind,
    /// Relative tolerance (adaptive only)
    pub rtol: f64,
    /// Absolute tolerance (adaptive only)
    pub atol: f64,
    /// Fixed step size in seconds (fixed-step only)
    pub dt: f64,
    /// Maximum number of attempted steps per integration
    pub max_steps: usize,
    /// Optional wall-clock ceiling per integration
    pub max_wall_time: Option<Duration>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            kind: SolverKind::default(),
            rtol: 1e-6,
            atol: 1e-9,
            dt: 1e-3,
            max_steps: 1_000_000,
            max_wall_time: None,
        }
    }
}

/// Fixed-step solver that lands exactly on every sample time.
///
/// Each sample interval is split into `ceil(interval / dt)` equal substeps.
#[derive(Clone, Debug)]
pub struct FixedStepSolver<I> {
    pub integrator: I,
    pub dt: f64,
    pub max_steps: usize,
    pub max_wall_time: Option<Duration>,
}

impl<I: Integrator> FixedStepSolver<I> {
    pub fn new(integrator: I, dt: f64) -> Self {
        Self {
            integrator,
            dt,
            max_steps: SolverOptions::default().max_steps,
            max_wall_time: None,
        }
    }
}

impl<I: Integrator> IvpSolver for FixedStepSolver<I> {
    fn solve<M: TransientModel>(
        &self,
        model: &M,
        t_eval: &[f64],
    ) -> SimResult<Trajectory<M::State>> {
        validate_time_grid(t_eval)?;
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "dt must be positive",
            });
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidArg {
                what: "max_steps must be positive",
            });
        }

        let deadline = Deadline::after(self.max_wall_time);
        let mut stats = SolveStats::default();
        let mut x = model.initial_state();
        let mut t_record = Vec::with_capacity(t_eval.len());
        let mut x_record = Vec::with_capacity(t_eval.len());
        t_record.push(t_eval[0]);
        x_record.push(x.clone());

        for window in t_eval.windows(2) {
            let (t0, t1) = (window[0], window[1]);
            let substeps = ((t1 - t0) / self.dt).ceil().max(1.0) as usize;
            let h = (t1 - t0) / substeps as f64;
            for i in 0..substeps {
                let t = t0 + i as f64 * h;
                if stats.accepted_steps >= self.max_steps {
                    return Err(SimError::StepLimit {
                        max_steps: self.max_steps,
                        t,
                    });
                }
                if deadline.expired() {
                    return Err(SimError::Timeout { t });
                }
                x = self.integrator.step(model, t, &x, h)?;
                stats.rhs_calls += I::RHS_EVALS;
                stats.accepted_steps += 1;
                if !is_finite_state(model, &x) {
                    return Err(SimError::NonFinite { t: t + h });
                }
            }
            t_record.push(t1);
            x_record.push(x.clone());
        }

        tracing::debug!(
            steps = stats.accepted_steps,
            rhs_calls = stats.rhs_calls,
            "fixed-step solve finished"
        );

        Ok(Trajectory {
            t: t_record,
            x: x_record,
            stats,
        })
    }
}

/// Adaptive Dormand-Prince 5(4) solver.
///
/// Steps are clipped so every sample time is reached exactly; the step-size
/// controller follows the usual safety-factor rule with growth in [0.2, 10].
/// A step that changes the model's [`TransientModel::regime`] is bisected
/// until it is no longer than `switch_step`, then error-controlled as usual.
#[derive(Clone, Debug)]
pub struct AdaptiveSolver {
    pub rtol: f64,
    pub atol: f64,
    /// Initial step; chosen automatically when `None`.
    pub first_step: Option<f64>,
    pub max_step: f64,
    /// Failure threshold for the step size.
    pub min_step: f64,
    /// Longest step allowed to cross a regime switch.
    pub switch_step: f64,
    pub max_steps: usize,
    pub max_wall_time: Option<Duration>,
}

impl Default for AdaptiveSolver {
    fn default() -> Self {
        let opts = SolverOptions::default();
        Self {
            rtol: opts.rtol,
            atol: opts.atol,
            first_step: None,
            max_step: f64::INFINITY,
            min_step: 1e-12,
            switch_step: 1e-9,
            max_steps: opts.max_steps,
            max_wall_time: None,
        }
    }
}

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;
const ERROR_EXPONENT: f64 = -1.0 / 5.0;

impl AdaptiveSolver {
    pub fn with_tolerances(rtol: f64, atol: f64) -> Self {
        Self {
            rtol,
            atol,
            ..Self::default()
        }
    }

    fn check(&self) -> SimResult<()> {
        if !(self.rtol > 0.0 && self.rtol.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "rtol must be positive",
            });
        }
        if !(self.atol > 0.0 && self.atol.is_finite()) {
            return Err(SimError::InvalidArg {
                what: "atol must be positive",
            });
        }
        if !(self.max_step > 0.0) {
            return Err(SimError::InvalidArg {
                what: "max_step must be positive",
            });
        }
        if !(self.switch_step > self.min_step) {
            return Err(SimError::InvalidArg {
                what: "switch_step must exceed min_step",
            });
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidArg {
                what: "max_steps must be positive",
            });
        }
        Ok(())
    }

    /// Starting step estimate from the local derivative scale.
    fn initial_step<M: TransientModel>(
        &self,
        model: &M,
        t0: f64,
        x0: &M::State,
        f0: &M::State,
        stats: &mut SolveStats,
    ) -> SimResult<f64> {
        let y = model.components(x0);
        let f = model.components(f0);
        let scale: Vec<f64> = y.iter().map(|v| self.atol + v.abs() * self.rtol).collect();
        let rms = |v: &[f64]| {
            let n = v.len().max(1) as f64;
            (v.iter().zip(&scale).map(|(a, s)| (a / s).powi(2)).sum::<f64>() / n).sqrt()
        };

        let d0 = rms(&y);
        let d1 = rms(&f);
        let h0 = if d0 < 1e-5 || d1 < 1e-5 {
            1e-6
        } else {
            0.01 * d0 / d1
        };

        let x1 = model.add(x0, &model.scale(f0, h0));
        let f1 = model.rhs(t0 + h0, &x1)?;
        stats.rhs_calls += 1;
        let df: Vec<f64> = model
            .components(&f1)
            .iter()
            .zip(&f)
            .map(|(a, b)| a - b)
            .collect();
        let d2 = rms(&df) / h0;

        let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
            (h0 * 1e-3).max(1e-6)
        } else {
            (0.01 / d1.max(d2)).powf(1.0 / 5.0)
        };
        Ok((100.0 * h0).min(h1).min(self.max_step))
    }
}

impl IvpSolver for AdaptiveSolver {
    fn solve<M: TransientModel>(
        &self,
        model: &M,
        t_eval: &[f64],
    ) -> SimResult<Trajectory<M::State>> {
        validate_time_grid(t_eval)?;
        self.check()?;

        let deadline = Deadline::after(self.max_wall_time);
        let mut stats = SolveStats::default();
        let mut t = t_eval[0];
        let mut x = model.initial_state();
        if !is_finite_state(model, &x) {
            return Err(SimError::NonFinite { t });
        }
        let mut xdot = model.rhs(t, &x)?;
        stats.rhs_calls += 1;

        let mut t_record = Vec::with_capacity(t_eval.len());
        let mut x_record = Vec::with_capacity(t_eval.len());
        t_record.push(t);
        x_record.push(x.clone());

        if t_eval.len() == 1 {
            return Ok(Trajectory {
                t: t_record,
                x: x_record,
                stats,
            });
        }

        let mut h = match self.first_step {
            Some(h) if h > 0.0 => h.min(self.max_step),
            Some(_) => {
                return Err(SimError::InvalidArg {
                    what: "first_step must be positive",
                });
            }
            None => self.initial_step(model, t, &x, &xdot, &mut stats)?,
        };

        let stepper = DormandPrince45;
        let mut regime = model.regime(&x);
        // Controller step to restore once a regime switch has been crossed.
        let mut resume_h: Option<f64> = None;
        for &t_target in &t_eval[1..] {
            while t < t_target {
                let attempts = stats.accepted_steps + stats.rejected_steps;
                if attempts >= self.max_steps {
                    return Err(SimError::StepLimit {
                        max_steps: self.max_steps,
                        t,
                    });
                }
                if deadline.expired() {
                    return Err(SimError::Timeout { t });
                }

                let remaining = t_target - t;
                let clipped = h >= remaining;
                let h_try = if clipped { remaining } else { h };

                let step = stepper.step(model, t, &x, &xdot, h_try)?;
                stats.rhs_calls += DormandPrince45::RHS_EVALS;

                let next_regime = model.regime(&step.x);
                if next_regime != regime && h_try > self.switch_step {
                    stats.rejected_steps += 1;
                    if resume_h.is_none() {
                        resume_h = Some(h);
                    }
                    h = 0.5 * h_try;
                    continue;
                }

                let err = error_norm(model, &step.error, &x, &step.x, self.rtol, self.atol);

                if err.is_finite() && err <= 1.0 {
                    if !is_finite_state(model, &step.x) {
                        return Err(SimError::NonFinite { t: t + h_try });
                    }
                    t = if clipped { t_target } else { t + h_try };
                    x = step.x;
                    xdot = step.xdot;
                    stats.accepted_steps += 1;

                    if next_regime != regime {
                        tracing::trace!(t, from = regime, to = next_regime, "regime switch");
                        regime = next_regime;
                        h = resume_h.take().unwrap_or(h).min(self.max_step);
                        continue;
                    }
                    if let Some(prev) = resume_h {
                        // Still short of the switch; halve the remaining bracket.
                        // A bracket that collapses without a switch was a graze.
                        h = if h_try > self.switch_step {
                            0.5 * h_try
                        } else {
                            resume_h = None;
                            prev.min(self.max_step)
                        };
                        continue;
                    }

                    let factor = if err == 0.0 {
                        MAX_FACTOR
                    } else {
                        (SAFETY * err.powf(ERROR_EXPONENT)).min(MAX_FACTOR)
                    };
                    let proposal = (h_try * factor).min(self.max_step);
                    // A step shortened only to hit a sample time says nothing
                    // about the controller's preferred size.
                    h = if clipped { h.max(proposal) } else { proposal };
                } else {
                    stats.rejected_steps += 1;
                    let factor = if err.is_finite() {
                        (SAFETY * err.powf(ERROR_EXPONENT)).max(MIN_FACTOR)
                    } else {
                        MIN_FACTOR
                    };
                    h = h_try * factor;
                    if h < self.min_step {
                        tracing::debug!(t, h, "adaptive step size collapsed");
                        return Err(SimError::ConvergenceFailed { t, step: h });
                    }
                }
            }
            t_record.push(t_target);
            x_record.push(x.clone());
        }

        tracing::debug!(
            accepted = stats.accepted_steps,
            rejected = stats.rejected_steps,
            rhs_calls = stats.rhs_calls,
            "adaptive solve finished"
        );

        Ok(Trajectory {
            t: t_record,
            x: x_record,
            stats,
        })
    }
}

/// Solver chosen at runtime from [`SolverOptions`].
#[derive(Clone, Debug)]
pub enum ConfiguredSolver {
    Adaptive(AdaptiveSolver),
    RK4(FixedStepSolver<RK4>),
    ForwardEuler(FixedStepSolver<ForwardEuler>),
}

impl From<&SolverOptions> for ConfiguredSolver {
    fn from(opts: &SolverOptions) -> Self {
        match opts.kind {
            SolverKind::Adaptive => ConfiguredSolver::Adaptive(AdaptiveSolver {
                rtol: opts.rtol,
                atol: opts.atol,
                max_steps: opts.max_steps,
                max_wall_time: opts.max_wall_time,
                ..AdaptiveSolver::default()
            }),
            SolverKind::RK4 => ConfiguredSolver::RK4(FixedStepSolver {
                integrator: RK4,
                dt: opts.dt,
                max_steps: opts.max_steps,
                max_wall_time: opts.max_wall_time,
            }),
            SolverKind::ForwardEuler => ConfiguredSolver::ForwardEuler(FixedStepSolver {
                integrator: ForwardEuler,
                dt: opts.dt,
                max_steps: opts.max_steps,
                max_wall_time: opts.max_wall_time,
            }),
        }
    }
}

impl IvpSolver for ConfiguredSolver {
    fn solve<M: TransientModel>(
        &self,
        model: &M,
        t_eval: &[f64],
    ) -> SimResult<Trajectory<M::State>> {
        match self {
            ConfiguredSolver::Adaptive(s) => s.solve(model, t_eval),
            ConfiguredSolver::RK4(s) => s.solve(model, t_eval),
            ConfiguredSolver::ForwardEuler(s) => s.solve(model, t_eval),
        }
    }
}
