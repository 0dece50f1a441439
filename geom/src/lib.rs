//! Typed units for simulation time and network lengths. Everything downstream should pass these
//! around instead of raw `f64`s.

#[macro_use]
extern crate anyhow;

pub use crate::distance::Distance;
pub use crate::duration::Duration;
pub use crate::time::Time;

mod distance;
mod duration;
mod time;

/// Reduce the precision of an f64. This helps ensure serialization is idempotent (everything is
/// exactly the same before and after saving/loading). Ideally we'd use some kind of proper
/// fixed-precision type instead of f64.
pub fn trim_f64(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}
