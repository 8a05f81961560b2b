//! Parameter sweep execution.

use std::panic;
use std::sync::mpsc;
use std::thread;

use bj_config::{RunConfig, validate_config};
use bj_core::timing::Stopwatch;
use bj_results::{ReferenceLines, SummaryRecord, TrajectorySeries};
use bj_sim::{
    BungeeModel, ConfiguredSolver, CordParams, IvpSolver, JumpConstants, JumperState, SimError,
    SimResult, SolveStats, Trajectory, summarize,
};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::progress::{SweepProgressEvent, SweepStage};

/// Cartesian product of the stiffness and loss-factor axes.
///
/// Pairs are ordered stiffness-major: every loss factor for the first
/// stiffness, then every loss factor for the second, and so on.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGrid {
    stiffness: Vec<f64>,
    loss_factor: Vec<f64>,
}

impl ParameterGrid {
    pub fn new(stiffness: Vec<f64>, loss_factor: Vec<f64>) -> Self {
        Self {
            stiffness,
            loss_factor,
        }
    }

    /// Axes of `config` as-is; [`validate_config`] rejects empty or duplicate axes.
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(config.stiffness_values(), config.loss_factor_values())
    }

    pub fn stiffness(&self) -> &[f64] {
        &self.stiffness
    }

    pub fn loss_factor(&self) -> &[f64] {
        &self.loss_factor
    }

    pub fn len(&self) -> usize {
        self.stiffness.len() * self.loss_factor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pair at grid position `index`.
    pub fn pair(&self, index: usize) -> Option<(f64, f64)> {
        if index >= self.len() {
            return None;
        }
        let n_eta = self.loss_factor.len();
        Some((self.stiffness[index / n_eta], self.loss_factor[index % n_eta]))
    }

    pub fn pairs(&self) -> Vec<(f64, f64)> {
        self.stiffness
            .iter()
            .flat_map(|&k| self.loss_factor.iter().map(move |&eta| (k, eta)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SweepOptions {
    /// Solve pairs on the rayon thread pool.
    pub parallel: bool,
    /// Keep sampled series of successful pairs for plotting.
    pub keep_trajectories: bool,
}

/// Request to run a sweep.
pub struct SweepRequest<'a> {
    pub config: &'a RunConfig,
    pub options: SweepOptions,
}

/// A pair that could not be integrated.
#[derive(Debug, Clone, PartialEq)]
pub struct PairFailure {
    pub index: usize,
    pub stiffness: f64,
    pub loss_factor: f64,
    pub error: SimError,
}

#[derive(Debug, Clone)]
pub enum PairOutcome {
    Completed {
        index: usize,
        record: SummaryRecord,
        stats: SolveStats,
        series: Option<TrajectorySeries>,
    },
    Failed(PairFailure),
}

impl PairOutcome {
    pub fn index(&self) -> usize {
        match self {
            PairOutcome::Completed { index, .. } => *index,
            PairOutcome::Failed(f) => f.index,
        }
    }
}

/// Timing and solver effort of one sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepTimingSummary {
    pub build_time_s: f64,
    pub simulate_time_s: f64,
    pub total_time_s: f64,
    pub pairs: usize,
    pub failed_pairs: usize,
    pub parallel: bool,
    pub rhs_calls: usize,
    pub accepted_steps: usize,
    pub rejected_steps: usize,
}

/// Everything a sweep produced, indexed by grid position.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub grid: ParameterGrid,
    pub constants: JumpConstants,
    pub t_eval: Vec<f64>,
    pub outcomes: Vec<PairOutcome>,
    pub timing: SweepTimingSummary,
}

impl SweepReport {
    /// Summaries of successful pairs in grid order.
    pub fn records(&self) -> Vec<SummaryRecord> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                PairOutcome::Completed { record, .. } => Some(*record),
                PairOutcome::Failed(_) => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<&PairFailure> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                PairOutcome::Failed(f) => Some(f),
                PairOutcome::Completed { .. } => None,
            })
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures().is_empty()
    }

    /// Series retained when `keep_trajectories` was set, in grid order.
    pub fn trajectories(&self) -> Vec<&TrajectorySeries> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                PairOutcome::Completed { series, .. } => series.as_ref(),
                PairOutcome::Failed(_) => None,
            })
            .collect()
    }

    pub fn reference_lines(&self) -> ReferenceLines {
        ReferenceLines::new(&self.constants, &self.t_eval)
    }

    /// Equilibrium position of the hanging jumper for each stiffness.
    pub fn equilibrium_positions(&self) -> Vec<(f64, f64)> {
        self.grid
            .stiffness()
            .iter()
            .map(|&k| (k, self.constants.equilibrium_position(k)))
            .collect()
    }
}

/// One integrated pair with its derived series and summary.
#[derive(Debug, Clone)]
pub struct PairRun {
    pub trajectory: Trajectory<JumperState>,
    pub series: TrajectorySeries,
    pub record: SummaryRecord,
}

/// Integrate a single (stiffness, loss factor) pair under `config`.
pub fn simulate_pair(config: &RunConfig, stiffness: f64, loss_factor: f64) -> AppResult<PairRun> {
    validate_config(config)?;
    let constants = config.jump_constants()?;
    let solver = ConfiguredSolver::from(&config.solver_options());
    let cord = CordParams::new(stiffness, loss_factor).map_err(|source| AppError::PairFailed {
        stiffness,
        loss_factor,
        source,
    })?;

    let run = || -> SimResult<PairRun> {
        let trajectory = solver.solve(&BungeeModel::new(constants, cord), &config.time_grid())?;
        let extrema = summarize(&trajectory)?;
        Ok(PairRun {
            series: TrajectorySeries::from_trajectory(&cord, &trajectory)?,
            record: SummaryRecord::new(&cord, &extrema),
            trajectory,
        })
    };
    run().map_err(|source| AppError::PairFailed {
        stiffness,
        loss_factor,
        source,
    })
}

pub fn run_sweep(request: &SweepRequest) -> AppResult<SweepReport> {
    run_sweep_with_progress(request, None)
}

fn emit(
    progress_cb: &mut Option<&mut dyn FnMut(SweepProgressEvent)>,
    stage: SweepStage,
    completed: usize,
    total: usize,
    clock: &Stopwatch,
    message: Option<String>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(SweepProgressEvent::stage(
            stage,
            completed,
            total,
            clock.elapsed_s(),
            message,
        ));
    }
}

/// Run the sweep and stream progress events.
///
/// Configuration problems abort the sweep. A pair that fails to integrate is
/// recorded as [`PairOutcome::Failed`] and the remaining pairs still run.
pub fn run_sweep_with_progress(
    request: &SweepRequest,
    mut progress_cb: Option<&mut dyn FnMut(SweepProgressEvent)>,
) -> AppResult<SweepReport> {
    let clock = Stopwatch::start();
    let mut phase = Stopwatch::start();
    let config = request.config;
    let options = request.options;

    emit(
        &mut progress_cb,
        SweepStage::ValidatingConfig,
        0,
        0,
        &clock,
        Some("Validating configuration".to_string()),
    );
    validate_config(config)?;
    let constants = config.jump_constants()?;

    emit(
        &mut progress_cb,
        SweepStage::BuildingGrid,
        0,
        0,
        &clock,
        Some("Building parameter grid".to_string()),
    );
    let grid = ParameterGrid::from_config(config);
    let t_eval = config.time_grid();
    let solver = ConfiguredSolver::from(&config.solver_options());
    let total = grid.len();
    let build_time_s = phase.lap_s();

    info!(
        pairs = total,
        stiffness = grid.stiffness().len(),
        loss_factor = grid.loss_factor().len(),
        parallel = options.parallel,
        "starting sweep"
    );

    emit(
        &mut progress_cb,
        SweepStage::Simulating,
        0,
        total,
        &clock,
        Some(format!("Simulating {total} pairs")),
    );

    let solve = |index: usize| {
        solve_pair(
            index,
            &grid,
            &constants,
            &solver,
            &t_eval,
            options.keep_trajectories,
        )
    };

    let outcomes: Vec<PairOutcome> = if options.parallel {
        // Workers report finished indices; the calling thread owns the callback.
        let (done_tx, done_rx) = mpsc::channel::<usize>();
        thread::scope(|scope| {
            let workers = scope.spawn(move || {
                // rayon's indexed collect preserves grid order.
                (0..total)
                    .into_par_iter()
                    .map_with(done_tx, |done_tx, index| {
                        let outcome = solve(index);
                        let _ = done_tx.send(index);
                        outcome
                    })
                    .collect::<Vec<_>>()
            });
            for (completed, index) in done_rx.iter().enumerate() {
                let message = grid
                    .pair(index)
                    .map(|(k, eta)| format!("K={k}, eta={eta}"));
                emit(
                    &mut progress_cb,
                    SweepStage::Simulating,
                    completed + 1,
                    total,
                    &clock,
                    message,
                );
            }
            workers
                .join()
                .unwrap_or_else(|payload| panic::resume_unwind(payload))
        })
    } else {
        let mut outcomes = Vec::with_capacity(total);
        for index in 0..total {
            let outcome = solve(index);
            let message = grid
                .pair(index)
                .map(|(k, eta)| format!("K={k}, eta={eta}"));
            outcomes.push(outcome);
            emit(
                &mut progress_cb,
                SweepStage::Simulating,
                index + 1,
                total,
                &clock,
                message,
            );
        }
        outcomes
    };
    let simulate_time_s = phase.lap_s();

    let mut timing = SweepTimingSummary {
        build_time_s,
        simulate_time_s,
        pairs: total,
        parallel: options.parallel,
        ..SweepTimingSummary::default()
    };
    for outcome in &outcomes {
        match outcome {
            PairOutcome::Completed { stats, .. } => {
                timing.rhs_calls += stats.rhs_calls;
                timing.accepted_steps += stats.accepted_steps;
                timing.rejected_steps += stats.rejected_steps;
            }
            PairOutcome::Failed(failure) => {
                timing.failed_pairs += 1;
                warn!(
                    index = failure.index,
                    stiffness = failure.stiffness,
                    loss_factor = failure.loss_factor,
                    error = %failure.error,
                    "pair failed"
                );
            }
        }
    }
    timing.total_time_s = clock.elapsed_s();

    info!(
        pairs = total,
        failed = timing.failed_pairs,
        rhs_calls = timing.rhs_calls,
        elapsed_s = timing.total_time_s,
        "sweep finished"
    );

    emit(
        &mut progress_cb,
        SweepStage::Completed,
        total,
        total,
        &clock,
        Some(format!(
            "{} of {total} pairs completed",
            total - timing.failed_pairs
        )),
    );

    Ok(SweepReport {
        grid,
        constants,
        t_eval,
        outcomes,
        timing,
    })
}

fn solve_pair(
    index: usize,
    grid: &ParameterGrid,
    constants: &JumpConstants,
    solver: &ConfiguredSolver,
    t_eval: &[f64],
    keep_series: bool,
) -> PairOutcome {
    let Some((stiffness, loss_factor)) = grid.pair(index) else {
        return PairOutcome::Failed(PairFailure {
            index,
            stiffness: f64::NAN,
            loss_factor: f64::NAN,
            error: SimError::InvalidArg {
                what: "grid index out of range",
            },
        });
    };

    let run = || -> SimResult<PairOutcome> {
        let cord = CordParams::new(stiffness, loss_factor)?;
        let trajectory = solver.solve(&BungeeModel::new(*constants, cord), t_eval)?;
        let extrema = summarize(&trajectory)?;
        let series = if keep_series {
            Some(TrajectorySeries::from_trajectory(&cord, &trajectory)?)
        } else {
            None
        };
        Ok(PairOutcome::Completed {
            index,
            record: SummaryRecord::new(&cord, &extrema),
            stats: trajectory.stats,
            series,
        })
    };

    run().unwrap_or_else(|error| {
        PairOutcome::Failed(PairFailure {
            index,
            stiffness,
            loss_factor,
            error,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    proptest! {
        #[test]
        fn every_index_maps_to_a_distinct_pair(n_k in 1usize..8, n_eta in 1usize..8) {
            let stiffness: Vec<f64> = (0..n_k).map(|i| 40.0 + 10.0 * i as f64).collect();
            let loss: Vec<f64> = (0..n_eta).map(|i| 0.1 + 0.05 * i as f64).collect();
            let grid = ParameterGrid::new(stiffness, loss);
            let pairs = grid.pairs();
            prop_assert_eq!(pairs.len(), n_k * n_eta);
            let distinct: HashSet<(u64, u64)> =
                pairs.iter().map(|(k, e)| (k.to_bits(), e.to_bits())).collect();
            prop_assert_eq!(distinct.len(), pairs.len());
            for (i, pair) in pairs.iter().enumerate() {
                prop_assert_eq!(grid.pair(i), Some(*pair));
            }
        }
    }

    #[test]
    fn grid_is_stiffness_major() {
        let grid = ParameterGrid::new(vec![40.0, 140.0], vec![0.1, 0.2, 0.3]);
        assert_eq!(grid.len(), 6);
        assert_eq!(
            grid.pairs(),
            vec![
                (40.0, 0.1),
                (40.0, 0.2),
                (40.0, 0.3),
                (140.0, 0.1),
                (140.0, 0.2),
                (140.0, 0.3),
            ]
        );
        for (i, pair) in grid.pairs().into_iter().enumerate() {
            assert_eq!(grid.pair(i), Some(pair));
        }
        assert_eq!(grid.pair(6), None);
    }

    #[test]
    fn invalid_cord_becomes_pair_failure() {
        let grid = ParameterGrid::new(vec![-5.0], vec![0.15]);
        let solver = ConfiguredSolver::from(&bj_sim::SolverOptions::default());
        let outcome = solve_pair(
            0,
            &grid,
            &JumpConstants::default(),
            &solver,
            &[0.0, 1.0],
            false,
        );
        match outcome {
            PairOutcome::Failed(f) => {
                assert_eq!(f.index, 0);
                assert_eq!(f.stiffness, -5.0);
                assert!(matches!(f.error, SimError::InvalidParameter { .. }));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn progress_fraction() {
        let e = SweepProgressEvent::stage(SweepStage::Simulating, 3, 6, 0.0, None);
        assert_eq!(e.fraction_complete(), 0.5);
        let e = SweepProgressEvent::stage(SweepStage::ValidatingConfig, 0, 0, 0.0, None);
        assert_eq!(e.fraction_complete(), 1.0);
    }
}
