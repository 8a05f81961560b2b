// bj-core/src/units.rs

use uom::si::f64::{
    Acceleration as UomAcceleration, Length as UomLength, Mass as UomMass,
    MassRate as UomMassRate, Velocity as UomVelocity,
};

// Public canonical unit types (SI, f64)
pub type Accel = UomAcceleration;
pub type Length = UomLength;
pub type Mass = UomMass;
/// Linear damping coefficient (N·s/m reduces to kg/s).
pub type Damping = UomMassRate;
pub type Velocity = UomVelocity;

#[inline]
pub fn kg(v: f64) -> Mass {
    use uom::si::mass::kilogram;
    Mass::new::<kilogram>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn mps(v: f64) -> Velocity {
    use uom::si::velocity::meter_per_second;
    Velocity::new::<meter_per_second>(v)
}

#[inline]
pub fn mps2(v: f64) -> Accel {
    use uom::si::acceleration::meter_per_second_squared;
    Accel::new::<meter_per_second_squared>(v)
}

/// Damping coefficient from N·s/m.
#[inline]
pub fn ns_per_m(v: f64) -> Damping {
    use uom::si::mass_rate::kilogram_per_second;
    Damping::new::<kilogram_per_second>(v)
}

pub mod constants {
    /// Gravity of the jump model (rounded, not standard g0).
    pub const G_MPS2: f64 = 9.81;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_store_si_values() {
        assert_eq!(kg(70.0).value, 70.0);
        assert_eq!(m(18.0).value, 18.0);
        assert_eq!(mps(-3.0).value, -3.0);
        assert_eq!(ns_per_m(8.0).value, 8.0);
    }
}
