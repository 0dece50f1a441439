use std::{error, fmt};

use geom::Time;

use crate::{EdgeID, PersonID};

/// The failures callers may want to tell apart. These travel inside `anyhow::Error`; use
/// `err.downcast_ref::<ParkingError>()` to inspect them.
#[derive(Clone, Debug, PartialEq)]
pub enum ParkingError {
    /// Something about the setup makes the cost feedback meaningless. Caught before the run.
    Config(String),
    /// The same person left traffic twice without re-entering in between, so their vehicle would
    /// be parked in two places at once. The event log is broken.
    DoubleParked {
        person: PersonID,
        mode: String,
        edge: EdgeID,
        time: Time,
    },
    UnknownEdge(EdgeID),
    /// Costs only exist for the simulated day.
    TimeOutOfRange { time: Time, end_of_day: Time },
    /// Occupancy is only known after the iteration's events have all been processed.
    OccupancyUnavailable { iteration: usize },
    IterationMismatch { requested: usize, analyzed: usize },
}

impl fmt::Display for ParkingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParkingError::Config(msg) => write!(f, "bad parking config: {}", msg),
            ParkingError::DoubleParked {
                person,
                mode,
                edge,
                time,
            } => write!(
                f,
                "at {}, {} left traffic with {} on {}, but is already parked elsewhere",
                time, person, mode, edge
            ),
            ParkingError::UnknownEdge(edge) => write!(f, "{} isn't in the network", edge),
            ParkingError::TimeOutOfRange { time, end_of_day } => write!(
                f,
                "no parking cost at {}; the day ends at {}",
                time, end_of_day
            ),
            ParkingError::OccupancyUnavailable { iteration } => write!(
                f,
                "occupancy for iteration {} was requested before the iteration finished",
                iteration
            ),
            ParkingError::IterationMismatch {
                requested,
                analyzed,
            } => write!(
                f,
                "occupancy for iteration {} was requested, but iteration {} is analyzed",
                requested, analyzed
            ),
        }
    }
}

impl error::Error for ParkingError {}

/// Shorthand for `bail!(ParkingError::Config(...))`.
macro_rules! config_error {
    ($($arg:tt)*) => {
        return Err($crate::ParkingError::Config(format!($($arg)*)).into())
    };
}
pub(crate) use config_error;
