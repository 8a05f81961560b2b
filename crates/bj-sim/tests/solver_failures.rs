//! Solver failures surface as errors instead of non-finite samples.

use bj_core::linspace;
use bj_sim::{
    AdaptiveSolver, BungeeModel, CordParams, FixedStepSolver, ForwardEuler, IvpSolver,
    JumpConstants, SimError, SimResult, TransientModel,
};

/// x' = x^2 with x(0) = 1 blows up at t = 1.
struct BlowUp;

impl TransientModel for BlowUp {
    type State = f64;

    fn initial_state(&self) -> Self::State {
        1.0
    }

    fn rhs(&self, _t: f64, x: &Self::State) -> SimResult<Self::State> {
        Ok(x * x)
    }

    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State {
        a + b
    }

    fn scale(&self, a: &Self::State, scale: f64) -> Self::State {
        a * scale
    }

    fn components(&self, x: &Self::State) -> Vec<f64> {
        vec![*x]
    }
}

#[test]
fn adaptive_solver_reports_finite_time_blow_up() {
    let err = AdaptiveSolver::default()
        .solve(&BlowUp, &linspace(0.0, 2.0, 21))
        .expect_err("blow-up must not produce a trajectory");
    assert!(
        matches!(
            err,
            SimError::ConvergenceFailed { .. }
                | SimError::StepLimit { .. }
                | SimError::NonFinite { .. }
        ),
        "unexpected error {err:?}"
    );
}

#[test]
fn fixed_step_solver_reports_non_finite_state() {
    let solver = FixedStepSolver::new(ForwardEuler, 0.25);
    let err = solver
        .solve(&BlowUp, &linspace(0.0, 50.0, 3))
        .expect_err("Euler on x' = x^2 overflows");
    assert!(matches!(err, SimError::NonFinite { .. }), "got {err:?}");
}

#[test]
fn rigid_cord_collapses_the_step_size() {
    // Any step across cord engagement carries an error far above tolerance.
    let model = BungeeModel::new(
        JumpConstants::default(),
        CordParams::new(f64::MAX, 0.15).unwrap(),
    );
    let err = AdaptiveSolver::default()
        .solve(&model, &linspace(0.0, 5.0, 51))
        .expect_err("rigid cord cannot be resolved");
    assert!(
        matches!(
            err,
            SimError::ConvergenceFailed { .. } | SimError::NonFinite { .. }
        ),
        "got {err:?}"
    );
    if let SimError::ConvergenceFailed { t, .. } | SimError::NonFinite { t } = err {
        assert!(t > 1.5 && t < 2.5, "failed away from engagement at t = {t}");
    }
}

#[test]
fn step_ceiling_is_enforced() {
    // 999 sample intervals need at least 999 attempts.
    let model = BungeeModel::new(
        JumpConstants::default(),
        CordParams::new(40.0, 0.15).unwrap(),
    );
    let solver = AdaptiveSolver {
        max_steps: 500,
        ..AdaptiveSolver::default()
    };
    let err = solver
        .solve(&model, &linspace(0.0, 20.0, 1000))
        .expect_err("sample count exceeds the step budget");
    assert!(
        matches!(err, SimError::StepLimit { max_steps: 500, .. }),
        "got {err:?}"
    );
}
