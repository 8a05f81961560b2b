//! Integration tests for the sweep service.

use std::collections::HashSet;

use bj_app::{
    AppError, PairOutcome, SweepOptions, SweepProgressEvent, SweepRequest, SweepStage, run_sweep,
    run_sweep_with_progress, simulate_pair,
};
use bj_config::{AxisDef, RunConfig, SolverMethod};
use bj_sim::SimError;

fn short_config() -> RunConfig {
    let mut config = RunConfig::default();
    config.time.t_end_s = 8.0;
    config.time.samples = 401;
    config.grid.loss_factor = AxisDef::Values(vec![0.15, 0.3]);
    config
}

fn run(config: &RunConfig, options: SweepOptions) -> bj_app::SweepReport {
    run_sweep(&SweepRequest { config, options }).expect("sweep should run")
}

#[test]
fn default_sweep_produces_one_row_per_pair() {
    let config = RunConfig::default();
    let report = run(&config, SweepOptions::default());

    assert!(report.is_complete());
    let records = report.records();
    assert_eq!(records.len(), 7);

    let pairs: HashSet<(u64, u64)> = records
        .iter()
        .map(|r| (r.stiffness.to_bits(), r.loss_factor.to_bits()))
        .collect();
    assert_eq!(pairs.len(), records.len());

    let mut csv = Vec::new();
    bj_results::write_summary(&mut csv, &records).unwrap();
    assert_eq!(String::from_utf8(csv).unwrap().lines().count(), 8);

    // Reference pair K=40: lowest point well below the cord engagement height.
    let first = &records[0];
    assert_eq!(first.stiffness, 40.0);
    assert!(first.min_pos > 30.0 && first.min_pos < 60.0, "{first:?}");
    for pair in records.windows(2) {
        assert!(pair[0].min_pos < pair[1].min_pos);
    }
    assert_eq!(report.timing.pairs, 7);
    assert_eq!(report.timing.failed_pairs, 0);
    assert!(report.timing.rhs_calls > 0);
}

#[test]
fn parallel_sweep_matches_serial_order() {
    let config = short_config();
    let serial = run(&config, SweepOptions::default());
    let parallel = run(
        &config,
        SweepOptions {
            parallel: true,
            keep_trajectories: false,
        },
    );

    assert_eq!(serial.records(), parallel.records());
    for (i, outcome) in parallel.outcomes.iter().enumerate() {
        assert_eq!(outcome.index(), i);
    }
    assert_eq!(
        parallel
            .records()
            .iter()
            .map(|r| (r.stiffness, r.loss_factor))
            .collect::<Vec<_>>(),
        parallel.grid.pairs()
    );
}

#[test]
fn failed_pair_does_not_stop_the_sweep() {
    let mut config = short_config();
    config.time.t_end_s = 5.0;
    config.time.samples = 101;
    config.grid.stiffness_n_per_m = AxisDef::Values(vec![40.0, f64::MAX, 240.0]);
    config.grid.loss_factor = AxisDef::Values(vec![0.15]);

    for parallel in [false, true] {
        let report = run(
            &config,
            SweepOptions {
                parallel,
                ..SweepOptions::default()
            },
        );

        assert!(!report.is_complete());
        assert_eq!(report.records().len(), 2);
        let failures = report.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 1);
        assert_eq!(failures[0].stiffness, f64::MAX);
        assert!(
            matches!(
                failures[0].error,
                SimError::ConvergenceFailed { .. } | SimError::NonFinite { .. }
            ),
            "got {:?}",
            failures[0].error
        );
        assert!(matches!(report.outcomes[0], PairOutcome::Completed { .. }));
        assert!(matches!(report.outcomes[2], PairOutcome::Completed { .. }));
        assert_eq!(report.timing.failed_pairs, 1);
    }
}

#[test]
fn invalid_config_aborts_before_simulating() {
    let mut config = RunConfig::default();
    config.jumper.mass_kg = 0.0;
    let mut stages = Vec::new();
    let err = run_sweep_with_progress(
        &SweepRequest {
            config: &config,
            options: SweepOptions::default(),
        },
        Some(&mut |e: SweepProgressEvent| stages.push(e.stage)),
    )
    .unwrap_err();
    assert!(matches!(err, AppError::Config(_)), "got {err}");
    assert_eq!(stages, vec![SweepStage::ValidatingConfig]);
}

#[test]
fn progress_stages_are_reported_in_order() {
    let config = short_config();
    let mut events = Vec::new();
    let report = run_sweep_with_progress(
        &SweepRequest {
            config: &config,
            options: SweepOptions {
                parallel: false,
                keep_trajectories: true,
            },
        },
        Some(&mut |e| events.push(e)),
    )
    .unwrap();

    let stages: Vec<SweepStage> = events.iter().map(|e| e.stage).collect();
    assert_eq!(stages.first(), Some(&SweepStage::ValidatingConfig));
    assert_eq!(stages.last(), Some(&SweepStage::Completed));
    let simulated: Vec<usize> = events
        .iter()
        .filter(|e| e.stage == SweepStage::Simulating)
        .map(|e| e.completed)
        .collect();
    assert_eq!(simulated, (0..=report.grid.len()).collect::<Vec<_>>());

    assert_eq!(report.trajectories().len(), report.grid.len());
    assert_eq!(report.trajectories()[0].len(), 401);
    let eq = report.equilibrium_positions();
    assert!((eq[0].1 - (82.0 - 70.0 * 9.81 / 40.0)).abs() < 1e-12);
}

#[test]
fn parallel_sweep_reports_each_pair() {
    let config = short_config();
    let mut events = Vec::new();
    let report = run_sweep_with_progress(
        &SweepRequest {
            config: &config,
            options: SweepOptions {
                parallel: true,
                keep_trajectories: false,
            },
        },
        Some(&mut |e| events.push(e)),
    )
    .unwrap();

    let simulated: Vec<&SweepProgressEvent> = events
        .iter()
        .filter(|e| e.stage == SweepStage::Simulating)
        .collect();
    let completed: Vec<usize> = simulated.iter().map(|e| e.completed).collect();
    assert_eq!(completed, (0..=report.grid.len()).collect::<Vec<_>>());

    let mut reported: Vec<String> = simulated[1..]
        .iter()
        .filter_map(|e| e.message.clone())
        .collect();
    reported.sort();
    let mut expected: Vec<String> = report
        .grid
        .pairs()
        .iter()
        .map(|(k, eta)| format!("K={k}, eta={eta}"))
        .collect();
    expected.sort();
    assert_eq!(reported, expected);
    assert_eq!(events.last().map(|e| e.stage), Some(SweepStage::Completed));
}

#[test]
fn single_pair_matches_sweep_row() {
    let mut config = short_config();
    config.solver.method = SolverMethod::Rk4;
    config.solver.dt_s = 0.005;
    let report = run(&config, SweepOptions::default());

    let pair = simulate_pair(&config, 40.0, 0.3).unwrap();
    assert_eq!(pair.record, report.records()[1]);
    assert_eq!(pair.series.len(), pair.trajectory.len());

    let err = simulate_pair(&config, 0.0, 0.3).unwrap_err();
    assert!(matches!(err, AppError::PairFailed { stiffness, .. } if stiffness == 0.0));
}
