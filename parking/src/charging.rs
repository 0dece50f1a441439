use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use geom::Time;
use serde::{Deserialize, Serialize};

use crate::{
    CostTable, EdgeID, Event, MoneyEvent, PersonID, TrafficEvent, TrafficFilter, VehicleID,
};

/// How an activity type is compared against the configured untracked activities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityMatch {
    /// "home" matches "home_morning" too.
    #[default]
    Contains,
    Exact,
}

/// Activities that take a traveler's vehicle out of the parking system for good.
#[derive(Clone, Debug, PartialEq)]
pub struct ActivityFilter {
    activities: Vec<String>,
    policy: ActivityMatch,
}

impl ActivityFilter {
    pub fn new(activities: Vec<String>, policy: ActivityMatch) -> ActivityFilter {
        ActivityFilter { activities, policy }
    }

    pub fn matches(&self, activity: &str) -> bool {
        self.activities.iter().any(|a| match self.policy {
            ActivityMatch::Contains => activity.contains(a.as_str()),
            ActivityMatch::Exact => activity == a,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
struct ParkingInfo {
    edge: EdgeID,
    driver: PersonID,
    start: Time,
}

/// Charges travelers of one mode for how long their vehicle stayed parked, at the hourly cost in
/// effect when they parked. Live during an iteration; prices come from a frozen snapshot.
pub struct ParkingChargeHandler {
    mode: String,
    purpose: String,
    traffic: TrafficFilter,
    untracked: ActivityFilter,
    costs: Arc<CostTable>,

    parking_per_vehicle: HashMap<VehicleID, ParkingInfo>,
    last_vehicle_per_driver: HashMap<PersonID, VehicleID>,
}

impl ParkingChargeHandler {
    /// `traffic` should be the same filter the occupancy passes use, so nothing is charged on an
    /// edge that never shows up in the occupancy.
    pub fn new(
        mode: &str,
        traffic: TrafficFilter,
        untracked: ActivityFilter,
        costs: Arc<CostTable>,
    ) -> ParkingChargeHandler {
        ParkingChargeHandler {
            mode: mode.to_string(),
            purpose: format!("{} parking cost", mode),
            traffic,
            untracked,
            costs,
            parking_per_vehicle: HashMap::new(),
            last_vehicle_per_driver: HashMap::new(),
        }
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    /// Returns a charge when a parked vehicle starts driving again.
    pub fn handle_event(&mut self, ev: &Event) -> Result<Option<MoneyEvent>> {
        match ev {
            Event::VehicleLeavesTraffic(t) if self.tracks(t) => {
                // No double-parking check here; the occupancy passes catch that
                self.parking_per_vehicle.insert(
                    t.vehicle.clone(),
                    ParkingInfo {
                        edge: t.edge.clone(),
                        driver: t.person.clone(),
                        start: t.time,
                    },
                );
                self.last_vehicle_per_driver
                    .insert(t.person.clone(), t.vehicle.clone());
                Ok(None)
            }
            Event::VehicleEntersTraffic(t) if self.tracks(t) => {
                // Vehicles that were parked since before the day began ride free
                let info = match self.parking_per_vehicle.remove(&t.vehicle) {
                    Some(info) => info,
                    None => return Ok(None),
                };
                let hourly = self.costs.cost(&info.edge, info.start)?;
                let parked = t.time - info.start;
                Ok(Some(MoneyEvent {
                    time: t.time,
                    person: info.driver,
                    amount: -hourly * parked.inner_hours(),
                    purpose: self.purpose.clone(),
                    edge: info.edge,
                }))
            }
            Event::ActivityStart {
                person, activity, ..
            } => {
                if self.untracked.matches(activity) {
                    if let Some(vehicle) = self.last_vehicle_per_driver.remove(person) {
                        if self.parking_per_vehicle.remove(&vehicle).is_some() {
                            debug!(
                                "{} started {}; not charging for {} parking",
                                person, activity, vehicle
                            );
                        }
                    }
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    /// Starts a new iteration with fresh prices. Anything still parked is forgotten.
    pub fn reset(&mut self, costs: Arc<CostTable>) {
        self.finish();
        self.costs = costs;
    }

    /// Drops vehicles still parked at the end of the day, returning how many there were.
    pub fn finish(&mut self) -> usize {
        let leftover = self.parking_per_vehicle.len();
        if leftover > 0 {
            info!(
                "{} {} vehicles were still parked at the end of the day and weren't charged",
                leftover, self.mode
            );
        }
        self.parking_per_vehicle.clear();
        self.last_vehicle_per_driver.clear();
        leftover
    }

    fn tracks(&self, ev: &TrafficEvent) -> bool {
        // Transit vehicles stop on their own infrastructure, which isn't priced
        ev.mode == self.mode && self.traffic.accepts(ev)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{CostHistory, Edge, InverseLinear, Network, ParkingConfig};

    fn costs() -> Arc<CostTable> {
        let network = Network::new(vec![Edge::new("1", 75.0), Edge::new("2", 75.0)]).unwrap();
        let mut config = ParkingConfig::default();
        config.bin_width = geom::Duration::hours(1);
        config.day_length = geom::Duration::hours(3);
        config
            .initial_costs
            .insert(EdgeID::from("1"), vec![2.0, 4.0, 6.0]);
        CostHistory::new(&network, &config, Box::new(InverseLinear))
            .unwrap()
            .snapshot()
    }

    fn new_handler(untracked: Vec<&str>, policy: ActivityMatch) -> ParkingChargeHandler {
        ParkingChargeHandler::new(
            "car",
            TrafficFilter::new(&["car".to_string()]),
            ActivityFilter::new(untracked.into_iter().map(|a| a.to_string()).collect(), policy),
            costs(),
        )
    }

    fn activity(time: f64, person: &str, activity: &str) -> Event {
        Event::ActivityStart {
            time: Time::seconds_since_midnight(time),
            person: PersonID::from(person),
            activity: activity.to_string(),
        }
    }

    #[test]
    fn charges_at_the_price_when_parked() {
        let mut handler = new_handler(Vec::new(), ActivityMatch::Contains);
        assert_eq!(
            handler
                .handle_event(&Event::leaves(3000.0, "1", "v", "p", "car"))
                .unwrap(),
            None
        );
        // Parked at 2/hour, and still pays that rate after the price went up
        let charge = handler
            .handle_event(&Event::enters(4800.0, "1", "v", "p", "car"))
            .unwrap()
            .unwrap();
        assert_eq!(
            charge,
            MoneyEvent {
                time: Time::seconds_since_midnight(4800.0),
                person: PersonID::from("p"),
                amount: -1.0,
                purpose: "car parking cost".to_string(),
                edge: EdgeID::from("1"),
            }
        );

        // The record was consumed
        assert_eq!(
            handler
                .handle_event(&Event::enters(5000.0, "1", "v", "p", "car"))
                .unwrap(),
            None
        );
    }

    #[test]
    fn first_departure_and_other_modes_are_free() {
        let mut handler = new_handler(Vec::new(), ActivityMatch::Contains);
        assert_eq!(
            handler
                .handle_event(&Event::enters(100.0, "1", "v", "p", "car"))
                .unwrap(),
            None
        );
        handler
            .handle_event(&Event::leaves(100.0, "1", "b", "p", "bike"))
            .unwrap();
        assert_eq!(
            handler
                .handle_event(&Event::enters(4000.0, "1", "b", "p", "bike"))
                .unwrap(),
            None
        );
        assert_eq!(handler.finish(), 0);
    }

    #[test]
    fn transit_edges_are_free() {
        let network = Network::new(vec![
            Edge::new("1", 75.0),
            Edge {
                transit_only: true,
                ..Edge::new("r1", 75.0)
            },
        ])
        .unwrap();
        let mut config = ParkingConfig::default();
        config.bin_width = geom::Duration::hours(1);
        config.day_length = geom::Duration::hours(3);
        config
            .initial_costs
            .insert(EdgeID::from("r1"), vec![3.0, 3.0, 3.0]);
        let costs = CostHistory::new(&network, &config, Box::new(InverseLinear))
            .unwrap()
            .snapshot();
        let car = vec!["car".to_string()];
        let mut handler = ParkingChargeHandler::new(
            "car",
            TrafficFilter::for_network(&car, &network),
            ActivityFilter::new(Vec::new(), ActivityMatch::Contains),
            costs,
        );

        // Flagged in the network, even though the name doesn't give it away
        handler
            .handle_event(&Event::leaves(0.0, "r1", "v", "p", "car"))
            .unwrap();
        assert_eq!(
            handler
                .handle_event(&Event::enters(3600.0, "r1", "v", "p", "car"))
                .unwrap(),
            None
        );
        // Recognized by name alone
        handler
            .handle_event(&Event::leaves(0.0, "pt_1", "v", "p", "car"))
            .unwrap();
        assert_eq!(
            handler
                .handle_event(&Event::enters(3600.0, "pt_1", "v", "p", "car"))
                .unwrap(),
            None
        );
        assert_eq!(handler.finish(), 0);
    }

    #[test]
    fn unknown_edges_are_fatal() {
        let mut handler = new_handler(Vec::new(), ActivityMatch::Contains);
        handler
            .handle_event(&Event::leaves(100.0, "nowhere", "v", "p", "car"))
            .unwrap();
        assert!(handler
            .handle_event(&Event::enters(200.0, "nowhere", "v", "p", "car"))
            .is_err());
    }

    #[test]
    fn untracked_activities_cancel_the_stay() {
        let mut handler = new_handler(vec!["home"], ActivityMatch::Contains);
        handler
            .handle_event(&Event::leaves(100.0, "1", "v", "p", "car"))
            .unwrap();
        handler.handle_event(&activity(150.0, "p", "home_evening")).unwrap();
        assert_eq!(
            handler
                .handle_event(&Event::enters(3000.0, "1", "v", "p", "car"))
                .unwrap(),
            None
        );

        let mut handler = new_handler(vec!["home"], ActivityMatch::Exact);
        handler
            .handle_event(&Event::leaves(100.0, "1", "v", "p", "car"))
            .unwrap();
        handler.handle_event(&activity(150.0, "p", "home_evening")).unwrap();
        handler.handle_event(&activity(150.0, "p", "work")).unwrap();
        assert!(handler
            .handle_event(&Event::enters(3700.0, "1", "v", "p", "car"))
            .unwrap()
            .is_some());
    }

    #[test]
    fn reset_forgets_parked_vehicles() {
        let mut handler = new_handler(Vec::new(), ActivityMatch::Contains);
        handler
            .handle_event(&Event::leaves(100.0, "1", "v1", "p1", "car"))
            .unwrap();
        handler
            .handle_event(&Event::leaves(200.0, "2", "v2", "p2", "car"))
            .unwrap();
        assert_eq!(handler.finish(), 2);

        handler
            .handle_event(&Event::leaves(100.0, "1", "v1", "p1", "car"))
            .unwrap();
        handler.reset(costs());
        assert_eq!(
            handler
                .handle_event(&Event::enters(3000.0, "1", "v1", "p1", "car"))
                .unwrap(),
            None
        );
    }

    #[test]
    fn activity_matching() {
        let contains = ActivityFilter::new(vec!["home".to_string()], ActivityMatch::Contains);
        assert!(contains.matches("home"));
        assert!(contains.matches("home_morning"));
        assert!(!contains.matches("work"));

        let exact = ActivityFilter::new(vec!["home".to_string()], ActivityMatch::Exact);
        assert!(exact.matches("home"));
        assert!(!exact.matches("home_morning"));

        assert!(!ActivityFilter::new(Vec::new(), ActivityMatch::Contains).matches("home"));
    }
}
