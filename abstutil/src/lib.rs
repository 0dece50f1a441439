//! Grab-bag of utilities shared by the other crates: counting, throttled warnings, JSON I/O, and
//! logger setup.

#[macro_use]
extern crate log;

mod collections;
mod io;
pub mod logger;
mod logs;

pub use crate::collections::Counter;
pub use crate::io::{read_json, to_json, write_json};
pub use crate::logs::RateLimitedWarn;
