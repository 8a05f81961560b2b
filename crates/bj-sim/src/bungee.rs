//! Two-phase bungee jumper dynamics.
//!
//! Position `z` is the jumper's height above the ground; the jump starts at
//! `start_height` and the cord starts pulling once the jumper has dropped a
//! full cord length. Above that point the jumper is in free fall, at or below
//! it the cord adds spring and damping force. The phase is decided from the
//! position alone at every rhs evaluation.

use bj_core::units::{Accel, Damping, Length, Mass, Velocity};

use crate::error::{SimError, SimResult};
use crate::model::TransientModel;
use crate::validate::{validate_finite, validate_non_negative, validate_positive};

/// Fixed physical constants for one simulation run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JumpConstants {
    mass_kg: f64,
    gravity_mps2: f64,
    cord_length_m: f64,
    air_drag_ns_per_m: f64,
    start_height_m: f64,
    initial_velocity_mps: f64,
}

impl Default for JumpConstants {
    fn default() -> Self {
        Self {
            mass_kg: 70.0,
            gravity_mps2: bj_core::units::constants::G_MPS2,
            cord_length_m: 18.0,
            air_drag_ns_per_m: 8.0,
            start_height_m: 100.0,
            initial_velocity_mps: 0.0,
        }
    }
}

impl JumpConstants {
    /// Build validated constants; the jumper starts at rest.
    pub fn new(
        mass: Mass,
        gravity: Accel,
        cord_length: Length,
        air_drag: Damping,
        start_height: Length,
    ) -> SimResult<Self> {
        Ok(Self {
            mass_kg: validate_positive(mass.value, "mass")?,
            gravity_mps2: validate_positive(gravity.value, "gravity")?,
            cord_length_m: validate_non_negative(cord_length.value, "cord length")?,
            air_drag_ns_per_m: validate_non_negative(air_drag.value, "air drag")?,
            start_height_m: validate_finite(start_height.value, "start height")?,
            initial_velocity_mps: 0.0,
        })
    }

    pub fn with_initial_velocity(mut self, velocity: Velocity) -> SimResult<Self> {
        self.initial_velocity_mps = validate_finite(velocity.value, "initial velocity")?;
        Ok(self)
    }

    pub fn mass(&self) -> f64 {
        self.mass_kg
    }

    pub fn gravity(&self) -> f64 {
        self.gravity_mps2
    }

    pub fn cord_length(&self) -> f64 {
        self.cord_length_m
    }

    pub fn air_drag(&self) -> f64 {
        self.air_drag_ns_per_m
    }

    pub fn start_height(&self) -> f64 {
        self.start_height_m
    }

    pub fn initial_velocity(&self) -> f64 {
        self.initial_velocity_mps
    }

    /// Position at which the cord reaches its natural length.
    pub fn engagement_position(&self) -> f64 {
        self.start_height_m - self.cord_length_m
    }

    /// Static equilibrium of the elastic phase for the given stiffness.
    pub fn equilibrium_position(&self, stiffness: f64) -> f64 {
        self.engagement_position() - self.mass_kg * self.gravity_mps2 / stiffness
    }

    /// Drag-free ballistic reference `z0 + v0 t - g t^2 / 2`.
    pub fn free_fall_position(&self, t: f64) -> f64 {
        self.start_height_m + self.initial_velocity_mps * t - 0.5 * self.gravity_mps2 * t * t
    }
}

/// Cord stiffness and damping loss factor for one grid point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CordParams {
    stiffness: f64,
    loss_factor: f64,
}

impl CordParams {
    /// Stiffness in N/m (> 0) and dimensionless loss factor (>= 0).
    pub fn new(stiffness: f64, loss_factor: f64) -> SimResult<Self> {
        Ok(Self {
            stiffness: validate_positive(stiffness, "stiffness")?,
            loss_factor: validate_non_negative(loss_factor, "loss factor")?,
        })
    }

    pub fn stiffness(&self) -> f64 {
        self.stiffness
    }

    pub fn loss_factor(&self) -> f64 {
        self.loss_factor
    }

    /// sqrt(K / m)
    pub fn natural_frequency(&self, mass: f64) -> f64 {
        (self.stiffness / mass).sqrt()
    }

    /// Cord-internal damping coefficient K * eta / omega_n.
    pub fn cord_damping(&self, mass: f64) -> f64 {
        self.stiffness * self.loss_factor / self.natural_frequency(mass)
    }
}

/// Jumper position and velocity.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JumperState {
    pub position: f64,
    pub velocity: f64,
}

impl JumperState {
    pub fn new(position: f64, velocity: f64) -> Self {
        Self { position, velocity }
    }
}

/// Which force law applies at a given position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    FreeFall,
    Elastic,
}

impl Phase {
    /// Free fall strictly above the engagement position, elastic otherwise.
    pub fn at(position: f64, constants: &JumpConstants) -> Phase {
        if position > constants.engagement_position() {
            Phase::FreeFall
        } else {
            Phase::Elastic
        }
    }

    /// Velocity derivative under this phase's force law.
    ///
    /// Does not check that `state` actually lies in this phase, so both
    /// branches can be compared at the boundary.
    pub fn acceleration(
        self,
        constants: &JumpConstants,
        cord: &CordParams,
        state: &JumperState,
    ) -> f64 {
        let m = constants.mass_kg;
        let g = constants.gravity_mps2;
        let da = constants.air_drag_ns_per_m;
        match self {
            // Drag enters with a positive sign here; kept as in the reference model.
            Phase::FreeFall => -g + (da / m) * state.velocity,
            Phase::Elastic => {
                let damping = da + cord.cord_damping(m);
                let stretch = constants.engagement_position() - state.position;
                (-g * m - damping * state.velocity + cord.stiffness * stretch) / m
            }
        }
    }
}

/// The jumper ODE for one (stiffness, loss factor) pair.
#[derive(Clone, Copy, Debug)]
pub struct BungeeModel {
    pub constants: JumpConstants,
    pub cord: CordParams,
}

impl BungeeModel {
    pub fn new(constants: JumpConstants, cord: CordParams) -> Self {
        Self { constants, cord }
    }

    /// Time derivative of the state; pure.
    pub fn derivative(&self, state: &JumperState) -> JumperState {
        let phase = Phase::at(state.position, &self.constants);
        JumperState {
            position: state.velocity,
            velocity: phase.acceleration(&self.constants, &self.cord, state),
        }
    }
}

impl TransientModel for BungeeModel {
    type State = JumperState;

    fn initial_state(&self) -> JumperState {
        JumperState::new(
            self.constants.start_height_m,
            self.constants.initial_velocity_mps,
        )
    }

    fn rhs(&self, t: f64, x: &JumperState) -> SimResult<JumperState> {
        if !(x.position.is_finite() && x.velocity.is_finite()) {
            return Err(SimError::NonFinite { t });
        }
        Ok(self.derivative(x))
    }

    fn add(&self, a: &JumperState, b: &JumperState) -> JumperState {
        JumperState::new(a.position + b.position, a.velocity + b.velocity)
    }

    fn scale(&self, a: &JumperState, scale: f64) -> JumperState {
        JumperState::new(a.position * scale, a.velocity * scale)
    }

    fn regime(&self, x: &JumperState) -> u8 {
        Phase::at(x.position, &self.constants) as u8
    }

    fn components(&self, x: &JumperState) -> Vec<f64> {
        vec![x.position, x.velocity]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bj_core::units::{kg, m, mps, mps2, ns_per_m};

    fn cord() -> CordParams {
        CordParams::new(40.0, 0.15).unwrap()
    }

    #[test]
    fn defaults_match_reference_jump() {
        let c = JumpConstants::default();
        assert_eq!(c.mass(), 70.0);
        assert_eq!(c.gravity(), 9.81);
        assert_eq!(c.engagement_position(), 82.0);
        assert!((c.equilibrium_position(40.0) - 64.8325).abs() < 1e-9);
    }

    #[test]
    fn constants_from_quantities() {
        let c = JumpConstants::new(kg(70.0), mps2(9.81), m(18.0), ns_per_m(8.0), m(100.0))
            .unwrap()
            .with_initial_velocity(mps(0.0))
            .unwrap();
        assert_eq!(c, JumpConstants::default());
    }

    #[test]
    fn constants_reject_non_positive_mass() {
        let err = JumpConstants::new(kg(0.0), mps2(9.81), m(18.0), ns_per_m(8.0), m(100.0))
            .unwrap_err();
        assert_eq!(
            err,
            SimError::InvalidParameter {
                what: "mass",
                value: 0.0
            }
        );
    }

    #[test]
    fn cord_params_validation() {
        assert!(CordParams::new(40.0, 0.0).is_ok());
        assert!(matches!(
            CordParams::new(0.0, 0.15),
            Err(SimError::InvalidParameter {
                what: "stiffness",
                ..
            })
        ));
        assert!(matches!(
            CordParams::new(-5.0, 0.15),
            Err(SimError::InvalidParameter { .. })
        ));
        assert!(matches!(
            CordParams::new(40.0, -0.01),
            Err(SimError::InvalidParameter {
                what: "loss factor",
                ..
            })
        ));
    }

    #[test]
    fn phase_predicate_is_positional() {
        let c = JumpConstants::default();
        assert_eq!(Phase::at(100.0, &c), Phase::FreeFall);
        assert_eq!(Phase::at(82.000_001, &c), Phase::FreeFall);
        assert_eq!(Phase::at(82.0, &c), Phase::Elastic);
        assert_eq!(Phase::at(10.0, &c), Phase::Elastic);
    }

    #[test]
    fn free_fall_branch_ignores_cord() {
        let c = JumpConstants::default();
        let state = JumperState::new(90.0, -7.5);
        let expected = -9.81 + (8.0 / 70.0) * -7.5;
        for (k, eta) in [(40.0, 0.15), (240.0, 0.3), (1.0, 0.0)] {
            let model = BungeeModel::new(c, CordParams::new(k, eta).unwrap());
            let d = model.derivative(&state);
            assert_eq!(d.velocity, expected);
            assert_eq!(d.position, -7.5);
        }
    }

    #[test]
    fn elastic_branch_formula() {
        let c = JumpConstants::default();
        let cord = cord();
        let state = JumperState::new(70.0, -3.0);
        let omega_n = (40.0f64 / 70.0).sqrt();
        let damping = 8.0 + 40.0 * 0.15 / omega_n;
        let expected = (-9.81 * 70.0 - damping * -3.0 + 40.0 * (82.0 - 70.0)) / 70.0;
        let d = BungeeModel::new(c, cord).derivative(&state);
        assert!((d.velocity - expected).abs() < 1e-12);
        assert_eq!(d.position, -3.0);
    }

    #[test]
    fn branches_agree_at_rest_on_boundary() {
        let c = JumpConstants::default();
        let state = JumperState::new(c.engagement_position(), 0.0);
        let free = Phase::FreeFall.acceleration(&c, &cord(), &state);
        let elastic = Phase::Elastic.acceleration(&c, &cord(), &state);
        assert!((free - elastic).abs() < 1e-12);
        assert!((free + 9.81).abs() < 1e-12);
    }

    #[test]
    fn damping_jumps_across_boundary() {
        let c = JumpConstants::default();
        let cord = cord();
        let v = -19.0;
        let state = JumperState::new(c.engagement_position(), v);
        let free = Phase::FreeFall.acceleration(&c, &cord, &state);
        let elastic = Phase::Elastic.acceleration(&c, &cord, &state);
        let jump = (2.0 * c.air_drag() + cord.cord_damping(c.mass())) * v / c.mass();
        assert!((free - elastic - jump).abs() < 1e-9);
        assert!(jump.abs() > 1.0);
    }

    #[test]
    fn elastic_equilibrium_is_a_fixed_point() {
        let c = JumpConstants::default();
        let model = BungeeModel::new(c, cord());
        let state = JumperState::new(c.equilibrium_position(40.0), 0.0);
        let d = model.derivative(&state);
        assert!(d.velocity.abs() < 1e-12);
    }

    #[test]
    fn rhs_rejects_non_finite_state() {
        let model = BungeeModel::new(JumpConstants::default(), cord());
        let err = model
            .rhs(1.5, &JumperState::new(f64::NAN, 0.0))
            .unwrap_err();
        assert_eq!(err, SimError::NonFinite { t: 1.5 });
    }
}
