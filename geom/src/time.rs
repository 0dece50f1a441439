use std::{cmp, fmt, ops};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{trim_f64, Duration};

/// A moment during the simulated day, in seconds since the start of the day. Can't be negative,
/// but may exceed 24 hours; simulations routinely run past midnight.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Time(f64);

// By construction, Time is a finite f64 with trimmed precision.
impl Eq for Time {}

#[allow(clippy::derive_ord_xor_partial_ord)] // false positive
impl Ord for Time {
    fn cmp(&self, other: &Time) -> cmp::Ordering {
        self.partial_cmp(other).unwrap()
    }
}

impl Time {
    pub const START_OF_DAY: Time = Time(0.0);

    /// Panics on negative or non-finite input. Use `Time::try_from` for untrusted values.
    pub fn seconds_since_midnight(value: f64) -> Time {
        match Time::checked(value) {
            Ok(t) => t,
            Err(err) => panic!("{}", err),
        }
    }

    fn checked(value: f64) -> Result<Time> {
        if !value.is_finite() || value < 0.0 {
            bail!("Bad Time {}", value);
        }
        Ok(Time(trim_f64(value)))
    }

    /// Returns the time in seconds. Prefer working in typesafe `Time`s.
    pub fn inner_seconds(self) -> f64 {
        self.0
    }

    /// How many whole `width`-sized buckets have passed since the start of the day?
    pub fn bucket(self, width: Duration) -> usize {
        ((self - Time::START_OF_DAY) / width).floor() as usize
    }

    /// (hours, minutes, seconds, deciseconds)
    fn get_parts(self) -> (usize, usize, usize, usize) {
        let mut remainder = self.0;
        let hours = (remainder / 3600.0).floor();
        remainder -= hours * 3600.0;
        let minutes = (remainder / 60.0).floor();
        remainder -= minutes * 60.0;
        let seconds = remainder.floor();
        remainder -= seconds;
        let deci = (remainder / 0.1).floor();

        (
            hours as usize,
            minutes as usize,
            seconds as usize,
            deci as usize,
        )
    }
}

impl TryFrom<f64> for Time {
    type Error = anyhow::Error;

    fn try_from(value: f64) -> Result<Time> {
        Time::checked(value)
    }
}

impl From<Time> for f64 {
    fn from(t: Time) -> f64 {
        t.0
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (hours, minutes, seconds, deci) = self.get_parts();
        write!(f, "{:02}:{:02}:{:02}.{:01}", hours, minutes, seconds, deci)
    }
}

impl ops::Add<Duration> for Time {
    type Output = Time;

    fn add(self, other: Duration) -> Time {
        Time::seconds_since_midnight(self.0 + other.inner_seconds())
    }
}

impl ops::Sub for Time {
    type Output = Duration;

    fn sub(self, other: Time) -> Duration {
        Duration::seconds(self.0 - other.0)
    }
}
