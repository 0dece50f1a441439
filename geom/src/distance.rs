use std::{fmt, ops};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::trim_f64;

/// A length along the network, in meters.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Distance(f64);

impl Distance {
    pub const ZERO: Distance = Distance(0.0);

    /// Panics on NaN or infinity. Use `Distance::try_from` for untrusted values.
    pub fn meters(value: f64) -> Distance {
        match Distance::checked(value) {
            Ok(d) => d,
            Err(err) => panic!("{}", err),
        }
    }

    fn checked(value: f64) -> Result<Distance> {
        if !value.is_finite() {
            bail!("Bad Distance {}", value);
        }
        Ok(Distance(trim_f64(value)))
    }
}

// Lengths in network and config files are plain meters.
impl TryFrom<f64> for Distance {
    type Error = anyhow::Error;

    fn try_from(value: f64) -> Result<Distance> {
        Distance::checked(value)
    }
}

impl From<Distance> for f64 {
    fn from(d: Distance) -> f64 {
        d.0
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}

impl ops::Add for Distance {
    type Output = Distance;

    fn add(self, other: Distance) -> Distance {
        Distance::meters(self.0 + other.0)
    }
}

impl ops::Mul<f64> for Distance {
    type Output = Distance;

    fn mul(self, scalar: f64) -> Distance {
        Distance::meters(self.0 * scalar)
    }
}

/// How many times does `other` fit into this distance?
impl ops::Div<Distance> for Distance {
    type Output = f64;

    fn div(self, other: Distance) -> f64 {
        if other == Distance::ZERO {
            panic!("Can't divide {} / {}", self, other);
        }
        self.0 / other.0
    }
}
