//! bj-core: numeric foundation for the bungee simulator.
//!
//! Contains:
//! - units (uom SI types + constructors for the jump constants)
//! - numeric (Real + tolerances + float helpers)
//! - timing (wall-clock stopwatch used by the sweep service)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod timing;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use units::*;
