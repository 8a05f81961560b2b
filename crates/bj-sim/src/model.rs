//! TransientModel trait for pluggable dynamic systems.

use crate::error::SimResult;

/// Trait for transient (dynamic) system models.
///
/// A TransientModel must implement:
/// - State type (Clone, for snapshots)
/// - Initial state
/// - RHS (right-hand side) computation: x_dot = f(t, x)
/// - Vector-space arithmetic for integration: add states, scale by scalar
/// - A flat component view used for error control and finiteness checks
pub trait TransientModel {
    /// State type (must be Clone).
    type State: Clone;

    /// Return the initial state at the first sample time.
    fn initial_state(&self) -> Self::State;

    /// Compute state derivative dxdt = f(t, x).
    ///
    /// Must be a pure function of `t` and `x`; solvers may evaluate it at
    /// trial points that are later rejected.
    fn rhs(&self, t: f64, x: &Self::State) -> SimResult<Self::State>;

    /// Add two states element-wise: result = a + b.
    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State;

    /// Scale a state by a scalar: result = scale * a.
    fn scale(&self, a: &Self::State, scale: f64) -> Self::State;

    /// Flat view of the state components.
    fn components(&self, x: &Self::State) -> Vec<f64>;

    /// Smooth branch of `rhs` that `x` lies on.
    ///
    /// Adaptive solvers shrink any step whose end point changes regime, so a
    /// switch in the force law is crossed with a tiny step. Models with a
    /// smooth rhs keep the default.
    fn regime(&self, _x: &Self::State) -> u8 {
        0
    }
}

/// `x + dt * sum(c_i * k_i)` built from the model's add/scale.
pub(crate) fn combine<M: TransientModel>(
    model: &M,
    x: &M::State,
    dt: f64,
    terms: &[(f64, &M::State)],
) -> M::State {
    let mut acc = x.clone();
    for (c, k) in terms {
        if *c != 0.0 {
            acc = model.add(&acc, &model.scale(k, c * dt));
        }
    }
    acc
}

/// True when every component of the state is finite.
pub(crate) fn is_finite_state<M: TransientModel>(model: &M, x: &M::State) -> bool {
    model.components(x).iter().all(|v| v.is_finite())
}
