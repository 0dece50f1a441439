//! Tracks where vehicles are parked over the simulated day, and feeds the observed occupancy back
//! into per-edge parking prices between iterations.
//!
//! One iteration looks like this:
//!
//! 1. `ParkingController::start_iteration` hands every `ParkingChargeHandler` the current cost
//!    snapshot and locks the `ParkingAnalyzer`.
//! 2. The simulation feeds every `Event` through `ParkingController::handle_event`, which charges
//!    travelers as they pick their vehicles up again and records traffic events for later.
//! 3. `ParkingController::end_iteration` replays the recorded log twice (`initial_occupancy`, then
//!    `OccupancyTimeline::build`), and `CostHistory` turns the per-bin occupancy into a new cost
//!    table.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

pub use crate::charging::{ActivityFilter, ActivityMatch, ParkingChargeHandler};
pub use crate::config::ParkingConfig;
pub use crate::controller::ParkingController;
pub use crate::cost_history::{CostHistory, CostTable};
pub use crate::error::ParkingError;
pub use crate::events::{Event, MoneyEvent, TrafficEvent};
pub use crate::export::{
    peak_occupancy, peak_occupancy_csv, write_peak_occupancy_csv, PeakOccupancy,
};
pub use crate::ids::{EdgeID, PersonID, VehicleID};
pub use crate::network::{Edge, Network};
pub use crate::occupancy::{
    entries_in_window, initial_occupancy, InitialOccupancy, OccupancyChange, OccupancyEntry,
    OccupancySource, OccupancyTimeline, ParkingAnalyzer, TimelineDiagnostics, TrafficFilter,
};
pub use crate::pricing::{InverseLinear, PricingPolicy};

mod charging;
mod config;
mod controller;
mod cost_history;
mod error;
mod events;
mod export;
mod ids;
mod network;
mod occupancy;
mod pricing;
