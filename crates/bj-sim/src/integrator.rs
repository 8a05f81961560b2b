//! Single-step time integrators.

use crate::error::SimResult;
use crate::model::{TransientModel, combine};

/// Trait for fixed-step time integrators.
pub trait Integrator {
    /// Number of rhs evaluations per step.
    const RHS_EVALS: usize;

    /// Advance state by one time step using the transient model.
    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State>;
}

/// Classical RK4 (Runge-Kutta 4th order) integrator.
#[derive(Clone, Debug)]
pub struct RK4;

impl Integrator for RK4 {
    const RHS_EVALS: usize = 4;

    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let k1 = model.rhs(t, x)?;

        let x2 = model.add(x, &model.scale(&k1, 0.5 * dt));
        let k2 = model.rhs(t + 0.5 * dt, &x2)?;

        let x3 = model.add(x, &model.scale(&k2, 0.5 * dt));
        let k3 = model.rhs(t + 0.5 * dt, &x3)?;

        let x4 = model.add(x, &model.scale(&k3, dt));
        let k4 = model.rhs(t + dt, &x4)?;

        // x_new = x + (dt/6) * (k1 + 2*k2 + 2*k3 + k4)
        let k_sum = model.add(
            &model.add(&k1, &model.scale(&k2, 2.0)),
            &model.add(&model.scale(&k3, 2.0), &k4),
        );

        Ok(model.add(x, &model.scale(&k_sum, dt / 6.0)))
    }
}

/// Forward Euler (explicit, 1st order, fast for testing).
/// Calls rhs() once per step instead of 4 times (RK4).
#[derive(Clone, Debug)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    const RHS_EVALS: usize = 1;

    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let xdot = model.rhs(t, x)?;
        Ok(model.add(x, &model.scale(&xdot, dt)))
    }
}

// Dormand-Prince 5(4) tableau.
const C: [f64; 6] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0];
const A2: [f64; 1] = [1.0 / 5.0];
const A3: [f64; 2] = [3.0 / 40.0, 9.0 / 40.0];
const A4: [f64; 3] = [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0];
const A5: [f64; 4] = [
    19372.0 / 6561.0,
    -25360.0 / 2187.0,
    64448.0 / 6561.0,
    -212.0 / 729.0,
];
const A6: [f64; 5] = [
    9017.0 / 3168.0,
    -355.0 / 33.0,
    46732.0 / 5247.0,
    49.0 / 176.0,
    -5103.0 / 18656.0,
];
const B: [f64; 6] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
];
// 5th-order minus embedded 4th-order weights (7 stages, last is FSAL).
const E: [f64; 7] = [
    -71.0 / 57600.0,
    0.0,
    71.0 / 16695.0,
    -71.0 / 1920.0,
    17253.0 / 339200.0,
    -22.0 / 525.0,
    1.0 / 40.0,
];

/// Result of one embedded Dormand-Prince step.
#[derive(Clone, Debug)]
pub struct EmbeddedStep<S> {
    /// 5th-order solution at t + dt.
    pub x: S,
    /// Local error estimate (5th minus 4th order).
    pub error: S,
    /// Derivative at the new point, reusable as the next step's first stage.
    pub xdot: S,
}

/// Dormand-Prince 5(4) embedded pair with first-same-as-last reuse.
#[derive(Clone, Debug)]
pub struct DormandPrince45;

impl DormandPrince45 {
    /// Rhs evaluations per step when `k1` is carried over from the last step.
    pub const RHS_EVALS: usize = 6;

    pub fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        k1: &M::State,
        dt: f64,
    ) -> SimResult<EmbeddedStep<M::State>> {
        let k2 = model.rhs(t + C[1] * dt, &combine(model, x, dt, &[(A2[0], k1)]))?;
        let k3 = model.rhs(
            t + C[2] * dt,
            &combine(model, x, dt, &[(A3[0], k1), (A3[1], &k2)]),
        )?;
        let k4 = model.rhs(
            t + C[3] * dt,
            &combine(model, x, dt, &[(A4[0], k1), (A4[1], &k2), (A4[2], &k3)]),
        )?;
        let k5 = model.rhs(
            t + C[4] * dt,
            &combine(
                model,
                x,
                dt,
                &[(A5[0], k1), (A5[1], &k2), (A5[2], &k3), (A5[3], &k4)],
            ),
        )?;
        let k6 = model.rhs(
            t + C[5] * dt,
            &combine(
                model,
                x,
                dt,
                &[
                    (A6[0], k1),
                    (A6[1], &k2),
                    (A6[2], &k3),
                    (A6[3], &k4),
                    (A6[4], &k5),
                ],
            ),
        )?;

        let x_new = combine(
            model,
            x,
            dt,
            &[
                (B[0], k1),
                (B[1], &k2),
                (B[2], &k3),
                (B[3], &k4),
                (B[4], &k5),
                (B[5], &k6),
            ],
        );
        let k7 = model.rhs(t + dt, &x_new)?;

        let zero = model.scale(x, 0.0);
        let error = combine(
            model,
            &zero,
            dt,
            &[
                (E[0], k1),
                (E[1], &k2),
                (E[2], &k3),
                (E[3], &k4),
                (E[4], &k5),
                (E[5], &k6),
                (E[6], &k7),
            ],
        );

        Ok(EmbeddedStep {
            x: x_new,
            error,
            xdot: k7,
        })
    }
}

/// Weighted RMS norm of `error` with scale `atol + rtol * max(|x0|, |x1|)`.
pub fn error_norm<M: TransientModel>(
    model: &M,
    error: &M::State,
    x0: &M::State,
    x1: &M::State,
    rtol: f64,
    atol: f64,
) -> f64 {
    let e = model.components(error);
    let a = model.components(x0);
    let b = model.components(x1);
    if e.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = e
        .iter()
        .zip(a.iter().zip(&b))
        .map(|(ei, (ai, bi))| {
            let scale = atol + rtol * ai.abs().max(bi.abs());
            (ei / scale).powi(2)
        })
        .sum();
    (sum_sq / e.len() as f64).sqrt()
}
