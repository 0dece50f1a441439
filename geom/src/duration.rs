use std::{fmt, ops};

use serde::{Deserialize, Serialize};

use crate::trim_f64;

/// A span of simulated time, in seconds. Can be negative.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Duration(f64);

impl Duration {
    pub const ZERO: Duration = Duration(0.0);

    pub fn seconds(value: f64) -> Duration {
        if !value.is_finite() {
            panic!("Bad Duration {}", value);
        }
        Duration(trim_f64(value))
    }

    pub fn minutes(mins: usize) -> Duration {
        Duration::seconds((mins as f64) * 60.0)
    }

    pub fn hours(hours: usize) -> Duration {
        Duration::seconds((hours as f64) * 3600.0)
    }

    pub fn inner_seconds(self) -> f64 {
        self.0
    }

    /// For anything priced per hour.
    pub fn inner_hours(self) -> f64 {
        self.0 / 3600.0
    }

    /// Does `multiple` fit into this duration a whole number of times?
    pub fn is_multiple_of(self, multiple: Duration) -> bool {
        multiple.0 != 0.0 && (self.0 % multiple.0) == 0.0
    }
}

// Config files hold durations as plain seconds. Non-finite values become zero, which config
// validation then rejects.
impl From<f64> for Duration {
    fn from(value: f64) -> Duration {
        if value.is_finite() {
            Duration(trim_f64(value))
        } else {
            Duration::ZERO
        }
    }
}

impl From<Duration> for f64 {
    fn from(d: Duration) -> f64 {
        d.0
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl ops::Mul<f64> for Duration {
    type Output = Duration;

    fn mul(self, other: f64) -> Duration {
        Duration::seconds(self.0 * other)
    }
}

impl ops::Div<Duration> for Duration {
    type Output = f64;

    fn div(self, other: Duration) -> f64 {
        if other.0 == 0.0 {
            panic!("Can't divide {} / {}", self, other);
        }
        self.0 / other.0
    }
}
