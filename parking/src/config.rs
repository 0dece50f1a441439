use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use geom::{Distance, Duration, Time};
use serde::{Deserialize, Serialize};

use crate::error::config_error;
use crate::{ActivityFilter, ActivityMatch, EdgeID};

/// Everything tunable about parking costs. Usually read from JSON; any missing field takes its
/// default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParkingConfig {
    /// When the simulation stops. Costs only exist before this.
    pub day_length: Duration,
    /// The width of one column of the cost table. Must divide `day_length` exactly.
    pub bin_width: Duration,
    /// How much curb one parked vehicle takes up.
    pub spot_length: Distance,
    /// What fraction of the real population is simulated, in (0, 1].
    pub sample_rate: f64,
    /// Hourly cost for every edge and bin without an entry in `initial_costs`.
    pub default_hourly_cost: f64,
    /// Starting hourly costs for some edges, one per bin.
    pub initial_costs: BTreeMap<EdgeID, Vec<f64>>,
    /// Occupancy is tracked for all of these modes together, and each one is charged separately.
    pub parking_modes: Vec<String>,
    /// Starting one of these activities means the traveler's vehicle leaves the parking system,
    /// so the pending stay isn't charged.
    pub untracked_activities: Vec<String>,
    pub activity_match: ActivityMatch,
    /// How many times each kind of event log inconsistency is logged before going quiet.
    pub max_warnings: usize,
}

impl Default for ParkingConfig {
    fn default() -> ParkingConfig {
        ParkingConfig {
            day_length: Duration::hours(24),
            bin_width: Duration::hours(2),
            spot_length: Distance::meters(7.5),
            sample_rate: 1.0,
            default_hourly_cost: 0.0,
            initial_costs: BTreeMap::new(),
            parking_modes: vec!["car".to_string(), "truck".to_string(), "freight".to_string()],
            untracked_activities: Vec::new(),
            activity_match: ActivityMatch::Contains,
            max_warnings: 10,
        }
    }
}

impl ParkingConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ParkingConfig> {
        let config: ParkingConfig = abstutil::read_json(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks everything that doesn't need the network. Initial costs are checked against the
    /// network when the `CostHistory` is built.
    pub fn validate(&self) -> Result<()> {
        if self.bin_width <= Duration::ZERO {
            config_error!("bin_width must be positive, not {}", self.bin_width);
        }
        if self.day_length <= Duration::ZERO {
            config_error!("day_length must be positive, not {}", self.day_length);
        }
        if !self.day_length.is_multiple_of(self.bin_width) {
            config_error!(
                "day_length {} must be a multiple of bin_width {}",
                self.day_length,
                self.bin_width
            );
        }
        if self.spot_length <= Distance::ZERO {
            config_error!("spot_length must be positive, not {}", self.spot_length);
        }
        if !(self.sample_rate > 0.0 && self.sample_rate <= 1.0) {
            config_error!("sample_rate must be in (0, 1], not {}", self.sample_rate);
        }
        if !(self.default_hourly_cost.is_finite() && self.default_hourly_cost >= 0.0) {
            config_error!(
                "default_hourly_cost must be non-negative, not {}",
                self.default_hourly_cost
            );
        }
        for (edge, costs) in &self.initial_costs {
            if let Some(bad) = costs.iter().find(|c| !(c.is_finite() && **c >= 0.0)) {
                config_error!("initial costs for {} contain {}", edge, bad);
            }
        }
        if self.parking_modes.is_empty() {
            config_error!("no parking_modes");
        }
        Ok(())
    }

    /// Every parking mode has to be something the simulation actually moves on the network.
    pub fn check_main_modes(&self, main_modes: &[String]) -> Result<()> {
        for mode in &self.parking_modes {
            if !main_modes.contains(mode) {
                config_error!("mode {} not found in main modes {:?}", mode, main_modes);
            }
        }
        Ok(())
    }

    pub fn num_bins(&self) -> usize {
        (self.day_length / self.bin_width) as usize
    }

    pub fn end_of_day(&self) -> Time {
        Time::START_OF_DAY + self.day_length
    }

    pub fn untracked_filter(&self) -> ActivityFilter {
        ActivityFilter::new(self.untracked_activities.clone(), self.activity_match)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParkingError;

    fn is_config_error(result: Result<()>) -> bool {
        matches!(
            result.unwrap_err().downcast_ref::<ParkingError>(),
            Some(ParkingError::Config(_))
        )
    }

    #[test]
    fn defaults_are_valid() {
        let config = ParkingConfig::default();
        config.validate().unwrap();
        assert_eq!(config.num_bins(), 12);
    }

    #[test]
    fn bin_width_must_divide_the_day() {
        let mut config = ParkingConfig::default();
        config.bin_width = Duration::seconds(7000.0);
        assert!(is_config_error(config.validate()));

        config.bin_width = Duration::ZERO;
        assert!(is_config_error(config.validate()));
    }

    #[test]
    fn sample_rate_range() {
        let mut config = ParkingConfig::default();
        config.sample_rate = 0.0;
        assert!(is_config_error(config.validate()));
        config.sample_rate = 1.5;
        assert!(is_config_error(config.validate()));
        config.sample_rate = 0.25;
        config.validate().unwrap();
    }

    #[test]
    fn negative_initial_costs() {
        let mut config = ParkingConfig::default();
        config
            .initial_costs
            .insert(EdgeID::from("1"), vec![1.0, -2.0]);
        assert!(is_config_error(config.validate()));
    }

    #[test]
    fn main_modes() {
        let config = ParkingConfig::default();
        let declared = vec!["car".to_string(), "truck".to_string()];
        assert!(is_config_error(config.check_main_modes(&declared)));

        let declared = vec![
            "car".to_string(),
            "truck".to_string(),
            "freight".to_string(),
            "bike".to_string(),
        ];
        config.check_main_modes(&declared).unwrap();
    }

    #[test]
    fn partial_json() {
        let config: ParkingConfig =
            serde_json::from_str(r#"{"bin_width": 3600, "sample_rate": 0.1, "parking_modes": ["car"]}"#)
                .unwrap();
        config.validate().unwrap();
        assert_eq!(config.num_bins(), 24);
        assert_eq!(config.spot_length, Distance::meters(7.5));
    }
}
