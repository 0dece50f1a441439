use std::collections::HashMap;

use abstutil::{Counter, RateLimitedWarn};
use anyhow::Result;

use super::{traffic, TrafficFilter, Transition};
use crate::{EdgeID, Event, ParkingError, PersonID};

/// How many vehicles were already parked on each edge when the log started.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InitialOccupancy {
    counts: Counter<EdgeID>,
    /// Vehicles that started driving somewhere other than where they last parked.
    pub mismatched_departures: usize,
}

impl InitialOccupancy {
    /// Missing edges have nothing parked initially.
    pub fn get(&self, edge: &EdgeID) -> usize {
        self.counts.get(edge)
    }

    pub fn total(&self) -> usize {
        self.counts.sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EdgeID, usize)> {
        self.counts.borrow().iter().map(|(e, n)| (e, *n))
    }
}

/// The first pass over a whole day's events. Any vehicle that enters traffic without having left
/// it earlier in the log must have been parked there since before the log began.
///
/// Fails if someone leaves traffic twice without entering in between.
pub fn initial_occupancy(
    log: &[Event],
    filter: &TrafficFilter,
    max_warnings: usize,
) -> Result<InitialOccupancy> {
    let mut result = InitialOccupancy::default();
    // Where is each (mode, person) parked right now, as far as this log knows?
    let mut parked_at: HashMap<(&str, &PersonID), &EdgeID> = HashMap::new();
    let mut mismatch = RateLimitedWarn::new("vehicle left from an unexpected edge", max_warnings);

    for (transition, ev) in traffic(log, filter) {
        let key = (ev.mode.as_str(), &ev.person);
        match transition {
            Transition::EntersTraffic => match parked_at.remove(&key) {
                None => {
                    result.counts.inc(ev.edge.clone());
                }
                Some(edge) if edge != &ev.edge => {
                    result.mismatched_departures += 1;
                    mismatch.warn(|| {
                        format!(
                            "at {}, {} entered traffic with {} on {}, but parked on {}",
                            ev.time, ev.person, ev.mode, ev.edge, edge
                        )
                    });
                }
                Some(_) => {}
            },
            Transition::LeavesTraffic => {
                if parked_at.insert(key, &ev.edge).is_some() {
                    return Err(ParkingError::DoubleParked {
                        person: ev.person.clone(),
                        mode: ev.mode.clone(),
                        edge: ev.edge.clone(),
                        time: ev.time,
                    }
                    .into());
                }
            }
        }
    }
    mismatch.summarize();

    Ok(result)
}
