use geom::Time;
use serde::{Deserialize, Serialize};

use crate::{EdgeID, PersonID, VehicleID};

/// A vehicle entering or leaving traffic on some edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrafficEvent {
    pub time: Time,
    pub edge: EdgeID,
    pub vehicle: VehicleID,
    pub person: PersonID,
    pub mode: String,
}

/// Everything this crate consumes from the running simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// The vehicle was parked and now starts driving.
    VehicleEntersTraffic(TrafficEvent),
    /// The vehicle stops driving and parks.
    VehicleLeavesTraffic(TrafficEvent),
    ActivityStart {
        time: Time,
        person: PersonID,
        activity: String,
    },
}

impl Event {
    pub fn time(&self) -> Time {
        match self {
            Event::VehicleEntersTraffic(ev) | Event::VehicleLeavesTraffic(ev) => ev.time,
            Event::ActivityStart { time, .. } => *time,
        }
    }

    pub fn enters(time: f64, edge: &str, vehicle: &str, person: &str, mode: &str) -> Event {
        Event::VehicleEntersTraffic(TrafficEvent::new(time, edge, vehicle, person, mode))
    }

    pub fn leaves(time: f64, edge: &str, vehicle: &str, person: &str, mode: &str) -> Event {
        Event::VehicleLeavesTraffic(TrafficEvent::new(time, edge, vehicle, person, mode))
    }
}

impl TrafficEvent {
    pub fn new(time: f64, edge: &str, vehicle: &str, person: &str, mode: &str) -> TrafficEvent {
        TrafficEvent {
            time: Time::seconds_since_midnight(time),
            edge: EdgeID::from(edge),
            vehicle: VehicleID::from(vehicle),
            person: PersonID::from(person),
            mode: mode.to_string(),
        }
    }
}

/// Charged to (or, if positive, paid out to) a person; picked up by the simulation's scoring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoneyEvent {
    pub time: Time,
    pub person: PersonID,
    pub amount: f64,
    pub purpose: String,
    pub edge: EdgeID,
}
