//! Reconstructs how many vehicles are parked on every edge over the day, from nothing but the
//! vehicles entering and leaving traffic.
//!
//! The log doesn't say where vehicles were parked before the day began, so this takes two passes:
//! `initial_occupancy` finds vehicles whose first appearance is driving away, and
//! `OccupancyTimeline::build` replays the log again starting from those counts.

use std::collections::BTreeSet;

use anyhow::Result;
use geom::{Duration, Time};
use serde::{Deserialize, Serialize};

use crate::{EdgeID, Event, Network, TrafficEvent};

pub use self::analyzer::ParkingAnalyzer;
pub use self::initializer::{initial_occupancy, InitialOccupancy};
pub use self::timeline::{OccupancyTimeline, TimelineDiagnostics};

mod analyzer;
mod initializer;
mod timeline;

/// A step in the occupancy of one edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OccupancyChange {
    pub time: Time,
    pub delta: i64,
}

/// `level` vehicles were parked on an edge during `[from, to)`. An entry with no `to` lasts
/// forever.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OccupancyEntry {
    pub from: Time,
    pub to: Option<Time>,
    /// Should never be negative for a consistent log, but broken logs do produce this.
    pub level: i64,
}

impl OccupancyEntry {
    pub fn new(from: f64, to: f64, level: i64) -> OccupancyEntry {
        OccupancyEntry {
            from: Time::seconds_since_midnight(from),
            to: Some(Time::seconds_since_midnight(to)),
            level,
        }
    }

    pub fn open_ended(from: f64, level: i64) -> OccupancyEntry {
        OccupancyEntry {
            from: Time::seconds_since_midnight(from),
            to: None,
            level,
        }
    }

    /// None for open-ended entries.
    pub fn duration(&self) -> Option<Duration> {
        self.to.map(|to| to - self.from)
    }
}

/// Clips a chronological list of entries to the window `[from, to)`, dropping entries that don't
/// overlap it at all.
pub fn entries_in_window(from: Time, to: Time, entries: &[OccupancyEntry]) -> Vec<OccupancyEntry> {
    let mut result = Vec::new();
    for entry in entries {
        let ends_before = match entry.to {
            Some(end) => end <= from,
            None => false,
        };
        if ends_before || entry.from >= to {
            continue;
        }
        result.push(OccupancyEntry {
            from: entry.from.max(from),
            to: Some(match entry.to {
                Some(end) => end.min(to),
                None => to,
            }),
            level: entry.level,
        });
    }
    result
}

/// Answers "what was parked on this edge during this window" for a finished iteration.
pub trait OccupancySource {
    fn occupancy(
        &self,
        iteration: usize,
        edge: &EdgeID,
        from: Time,
        to: Time,
    ) -> Result<Vec<OccupancyEntry>>;
}

/// Decides which traffic events count towards parking at all.
#[derive(Clone, Debug)]
pub struct TrafficFilter {
    modes: BTreeSet<String>,
    transit_edges: BTreeSet<EdgeID>,
}

impl TrafficFilter {
    /// Transit edges are only recognized by name.
    pub fn new(modes: &[String]) -> TrafficFilter {
        TrafficFilter {
            modes: modes.iter().cloned().collect(),
            transit_edges: BTreeSet::new(),
        }
    }

    pub fn for_network(modes: &[String], network: &Network) -> TrafficFilter {
        let mut filter = TrafficFilter::new(modes);
        filter.transit_edges = network
            .edges()
            .iter()
            .filter(|e| e.is_transit())
            .map(|e| e.id.clone())
            .collect();
        filter
    }

    pub fn accepts(&self, ev: &TrafficEvent) -> bool {
        self.modes.contains(&ev.mode)
            && !self.transit_edges.contains(&ev.edge)
            && !ev.edge.looks_like_transit()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Transition {
    EntersTraffic,
    LeavesTraffic,
}

fn traffic<'a>(
    log: &'a [Event],
    filter: &'a TrafficFilter,
) -> impl Iterator<Item = (Transition, &'a TrafficEvent)> + 'a {
    log.iter().filter_map(move |ev| {
        let (transition, traffic) = match ev {
            Event::VehicleEntersTraffic(t) => (Transition::EntersTraffic, t),
            Event::VehicleLeavesTraffic(t) => (Transition::LeavesTraffic, t),
            Event::ActivityStart { .. } => return None,
        };
        if filter.accepts(traffic) {
            Some((transition, traffic))
        } else {
            None
        }
    })
}
