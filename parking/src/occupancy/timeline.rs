use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};

use abstutil::RateLimitedWarn;
use anyhow::Result;
use geom::Time;

use super::{
    entries_in_window, traffic, InitialOccupancy, OccupancyChange, OccupancyEntry,
    OccupancySource, TrafficFilter, Transition,
};
use crate::{EdgeID, Event, PersonID};

/// Counters for things a consistent event log never produces. None of them stop the analysis.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimelineDiagnostics {
    /// Entries whose level dropped below zero.
    pub negative_entries: usize,
    pub edges_with_negative_occupancy: usize,
    /// Vehicles that entered traffic somewhere other than where they last parked. Their old spot
    /// is released too.
    pub reconciled_departures: usize,
    /// Edges first seen through a vehicle parking there, with no initial occupancy known. Assumed
    /// to start empty.
    pub edges_without_initial_occupancy: usize,
    /// Events timestamped before the previous change on the same edge. They're still placed at
    /// their own time.
    pub out_of_order_events: usize,
}

#[derive(Clone, Debug)]
struct EdgeHistory {
    changes: Vec<OccupancyChange>,
    // Never empty; the last entry is always open-ended.
    entries: Vec<OccupancyEntry>,
}

impl EdgeHistory {
    fn seeded(initial: usize) -> EdgeHistory {
        let mut changes = Vec::new();
        if initial > 0 {
            changes.push(OccupancyChange {
                time: Time::START_OF_DAY,
                delta: initial as i64,
            });
        }
        EdgeHistory {
            changes,
            entries: vec![OccupancyEntry {
                from: Time::START_OF_DAY,
                to: None,
                level: initial as i64,
            }],
        }
    }

    /// Returns false if the change is earlier than the last one. It still lands at its own time,
    /// after any other changes at that same moment, and everything after it is rebuilt.
    fn apply(&mut self, time: Time, delta: i64) -> bool {
        let change = OccupancyChange { time, delta };
        if time >= self.entries.last().unwrap().from {
            self.changes.push(change);
            push_change(&mut self.entries, change);
            return true;
        }

        let idx = self.changes.partition_point(|c| c.time <= time);
        self.changes.insert(idx, change);
        self.entries = vec![OccupancyEntry {
            from: Time::START_OF_DAY,
            to: None,
            level: 0,
        }];
        for change in &self.changes {
            push_change(&mut self.entries, *change);
        }
        false
    }
}

fn push_change(entries: &mut Vec<OccupancyEntry>, change: OccupancyChange) {
    let open = entries.last_mut().unwrap();
    if open.from == change.time {
        // Several changes at the same moment fold into one entry
        open.level += change.delta;
    } else {
        open.to = Some(change.time);
        let level = open.level + change.delta;
        entries.push(OccupancyEntry {
            from: change.time,
            to: None,
            level,
        });
    }
}

/// Per-edge occupancy over the whole day, rebuilt from scratch for every iteration.
#[derive(Clone, Debug)]
pub struct OccupancyTimeline {
    per_edge: BTreeMap<EdgeID, EdgeHistory>,
    diagnostics: TimelineDiagnostics,
}

impl OccupancyTimeline {
    /// The second pass over a day's events, seeded with what was parked before the log started.
    /// Vehicles entering traffic free a spot, vehicles leaving traffic take one.
    pub fn build(
        log: &[Event],
        filter: &TrafficFilter,
        initial: &InitialOccupancy,
        max_warnings: usize,
    ) -> OccupancyTimeline {
        let mut per_edge: BTreeMap<EdgeID, EdgeHistory> = BTreeMap::new();
        let mut diagnostics = TimelineDiagnostics::default();
        let mut last_parked: HashMap<(&str, &PersonID), &EdgeID> = HashMap::new();

        let mut warn_reconciled =
            RateLimitedWarn::new("releasing a spot the vehicle didn't leave from", max_warnings);
        let mut warn_no_initial =
            RateLimitedWarn::new("parking on an edge with no initial occupancy", max_warnings);
        let mut warn_out_of_order = RateLimitedWarn::new("out-of-order event", max_warnings);

        let mut change = |edge: &EdgeID,
                          time: Time,
                          delta: i64,
                          diagnostics: &mut TimelineDiagnostics| {
            let history = match per_edge.entry(edge.clone()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let count = initial.get(edge);
                    if count == 0 && delta > 0 {
                        diagnostics.edges_without_initial_occupancy += 1;
                        warn_no_initial.warn(|| format!("{} at {}, assuming it was empty", edge, time));
                    }
                    entry.insert(EdgeHistory::seeded(count))
                }
            };
            if !history.apply(time, delta) {
                diagnostics.out_of_order_events += 1;
                warn_out_of_order.warn(|| format!("{} on {}", time, edge));
            }
        };

        for (transition, ev) in traffic(log, filter) {
            let key = (ev.mode.as_str(), &ev.person);
            match transition {
                Transition::EntersTraffic => {
                    change(&ev.edge, ev.time, -1, &mut diagnostics);
                    if let Some(last) = last_parked.remove(&key) {
                        if last != &ev.edge {
                            // Mass conservation: the vehicle isn't on its old edge anymore either
                            diagnostics.reconciled_departures += 1;
                            warn_reconciled.warn(|| {
                                format!(
                                    "at {}, {} entered traffic on {}, but parked on {}",
                                    ev.time, ev.person, ev.edge, last
                                )
                            });
                            change(last, ev.time, -1, &mut diagnostics);
                        }
                    }
                }
                Transition::LeavesTraffic => {
                    change(&ev.edge, ev.time, 1, &mut diagnostics);
                    last_parked.insert(key, &ev.edge);
                }
            }
        }
        drop(change);

        for history in per_edge.values() {
            let negative = history.entries.iter().filter(|e| e.level < 0).count();
            if negative > 0 {
                diagnostics.negative_entries += negative;
                diagnostics.edges_with_negative_occupancy += 1;
            }
        }
        warn_reconciled.summarize();
        warn_no_initial.summarize();
        warn_out_of_order.summarize();
        if diagnostics.edges_with_negative_occupancy > 0 {
            warn!(
                "{} edges had negative occupancy at some point; the event log is inconsistent",
                diagnostics.edges_with_negative_occupancy
            );
        }

        OccupancyTimeline {
            per_edge,
            diagnostics,
        }
    }

    /// Every edge that saw any parking activity.
    pub fn edges(&self) -> impl Iterator<Item = &EdgeID> {
        self.per_edge.keys()
    }

    /// Chronological and gap-free, starting at the start of the day. Empty for edges without any
    /// activity.
    pub fn entries(&self, edge: &EdgeID) -> &[OccupancyEntry] {
        match self.per_edge.get(edge) {
            Some(history) => &history.entries,
            None => &[],
        }
    }

    /// The raw changes, including the initial occupancy as a change at the start of the day.
    pub fn changes(&self, edge: &EdgeID) -> &[OccupancyChange] {
        match self.per_edge.get(edge) {
            Some(history) => &history.changes,
            None => &[],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EdgeID, &[OccupancyEntry])> {
        self.per_edge
            .iter()
            .map(|(edge, history)| (edge, history.entries.as_slice()))
    }

    /// Entries overlapping `[from, to)`, clipped to that window.
    pub fn occupancy(&self, edge: &EdgeID, from: Time, to: Time) -> Vec<OccupancyEntry> {
        entries_in_window(from, to, self.entries(edge))
    }

    /// The occupancy at the end of the day.
    pub fn final_level(&self, edge: &EdgeID) -> i64 {
        self.entries(edge).last().map(|e| e.level).unwrap_or(0)
    }

    pub fn diagnostics(&self) -> &TimelineDiagnostics {
        &self.diagnostics
    }
}

/// A timeline doesn't know which iteration it came from; it answers for any.
impl OccupancySource for OccupancyTimeline {
    fn occupancy(
        &self,
        _: usize,
        edge: &EdgeID,
        from: Time,
        to: Time,
    ) -> Result<Vec<OccupancyEntry>> {
        Ok(OccupancyTimeline::occupancy(self, edge, from, to))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::occupancy::initial_occupancy;

    fn build(log: &[Event]) -> OccupancyTimeline {
        let filter = TrafficFilter::new(&["car".to_string(), "truck".to_string()]);
        let initial = initial_occupancy(log, &filter, 10).unwrap();
        OccupancyTimeline::build(log, &filter, &initial, 10)
    }

    fn change(time: f64, delta: i64) -> OccupancyChange {
        OccupancyChange {
            time: Time::seconds_since_midnight(time),
            delta,
        }
    }

    #[test]
    fn one_person() {
        let timeline = build(&[
            Event::enters(1.0, "1", "p", "p", "car"),
            Event::leaves(1.0, "2", "p", "p", "car"),
        ]);

        assert_eq!(
            timeline.changes(&"1".into()),
            &[change(0.0, 1), change(1.0, -1)]
        );
        assert_eq!(timeline.changes(&"2".into()), &[change(1.0, 1)]);
        assert_eq!(
            timeline.entries(&"1".into()),
            &[
                OccupancyEntry::new(0.0, 1.0, 1),
                OccupancyEntry::open_ended(1.0, 0)
            ]
        );
        assert_eq!(
            timeline.entries(&"2".into()),
            &[
                OccupancyEntry::new(0.0, 1.0, 0),
                OccupancyEntry::open_ended(1.0, 1)
            ]
        );
        assert_eq!(timeline.diagnostics().edges_without_initial_occupancy, 1);
    }

    #[test]
    fn intermediate_arrivals() {
        let timeline = build(&[
            Event::enters(1.0, "0", "p1", "p1", "car"),
            Event::leaves(2.0, "1", "p1", "p1", "car"),
            Event::enters(3.0, "1", "p2", "p2", "car"),
            Event::enters(4.0, "1", "p3", "p3", "car"),
            Event::leaves(5.0, "2", "p2", "p2", "car"),
            Event::leaves(6.0, "3", "p3", "p3", "car"),
        ]);

        assert_eq!(
            timeline.changes(&"1".into()),
            &[
                change(0.0, 2),
                change(2.0, 1),
                change(3.0, -1),
                change(4.0, -1)
            ]
        );
        assert_eq!(
            timeline.entries(&"1".into()),
            &[
                OccupancyEntry::new(0.0, 2.0, 2),
                OccupancyEntry::new(2.0, 3.0, 3),
                OccupancyEntry::new(3.0, 4.0, 2),
                OccupancyEntry::open_ended(4.0, 1),
            ]
        );
        assert_eq!(
            timeline.entries(&"3".into()),
            &[
                OccupancyEntry::new(0.0, 6.0, 0),
                OccupancyEntry::open_ended(6.0, 1)
            ]
        );
        assert_eq!(timeline.edges().count(), 4);
    }

    #[test]
    fn modes_share_the_curb() {
        let timeline = build(&[
            Event::enters(1.0, "1", "p1", "p1", "car"),
            Event::leaves(2.0, "2", "p1", "p1", "car"),
            Event::enters(3.0, "1", "p2", "p2", "truck"),
            Event::leaves(4.0, "2", "p2", "p2", "truck"),
        ]);
        assert_eq!(
            timeline.entries(&"1".into()),
            &[
                OccupancyEntry::new(0.0, 1.0, 2),
                OccupancyEntry::new(1.0, 3.0, 1),
                OccupancyEntry::open_ended(3.0, 0),
            ]
        );
        assert_eq!(
            timeline.entries(&"2".into()),
            &[
                OccupancyEntry::new(0.0, 2.0, 0),
                OccupancyEntry::new(2.0, 4.0, 1),
                OccupancyEntry::open_ended(4.0, 2),
            ]
        );
    }

    #[test]
    fn simultaneous_arrival_and_departure() {
        let timeline = build(&[
            Event::enters(1.0, "1", "p1", "p1", "car"),
            Event::leaves(2.0, "2", "p1", "p1", "car"),
            Event::enters(2.0, "2", "p2", "p2", "car"),
            Event::leaves(3.0, "3", "p2", "p2", "car"),
        ]);
        // Both changes at t=2 are kept in log order...
        assert_eq!(
            timeline.changes(&"2".into()),
            &[change(0.0, 1), change(2.0, 1), change(2.0, -1)]
        );
        // ...but don't produce a zero-width entry
        assert_eq!(
            timeline.entries(&"2".into()),
            &[
                OccupancyEntry::new(0.0, 2.0, 1),
                OccupancyEntry::open_ended(2.0, 1)
            ]
        );
    }

    #[test]
    fn change_at_start_of_day_adjusts_the_seed() {
        let timeline = build(&[
            Event::enters(0.0, "1", "p1", "p1", "car"),
            Event::leaves(10.0, "2", "p1", "p1", "car"),
        ]);
        assert_eq!(
            timeline.entries(&"1".into()),
            &[OccupancyEntry::open_ended(0.0, 0)]
        );
    }

    #[test]
    fn departure_from_elsewhere_releases_the_old_spot() {
        let timeline = build(&[
            Event::leaves(1.0, "1", "c", "p", "car"),
            Event::enters(2.0, "2", "c", "p", "car"),
        ]);
        assert_eq!(
            timeline.entries(&"1".into()),
            &[
                OccupancyEntry::new(0.0, 1.0, 0),
                OccupancyEntry::new(1.0, 2.0, 1),
                OccupancyEntry::open_ended(2.0, 0),
            ]
        );
        // The edge it magically drove away from goes negative. That's tolerated, but counted.
        assert_eq!(
            timeline.entries(&"2".into()),
            &[
                OccupancyEntry::new(0.0, 2.0, 0),
                OccupancyEntry::open_ended(2.0, -1)
            ]
        );
        let diagnostics = timeline.diagnostics();
        assert_eq!(diagnostics.reconciled_departures, 1);
        assert_eq!(diagnostics.negative_entries, 1);
        assert_eq!(diagnostics.edges_with_negative_occupancy, 1);
    }

    #[test]
    fn out_of_order_events_keep_their_time() {
        let timeline = build(&[
            Event::leaves(5.0, "1", "a", "a", "car"),
            Event::leaves(3.0, "1", "b", "b", "car"),
            Event::enters(5.0, "1", "a", "a", "car"),
            Event::leaves(3.0, "1", "d", "d", "car"),
        ]);
        assert_eq!(
            timeline.entries(&"1".into()),
            &[
                OccupancyEntry::new(0.0, 3.0, 0),
                OccupancyEntry::new(3.0, 5.0, 2),
                OccupancyEntry::open_ended(5.0, 2)
            ]
        );
        // Late arrivals go after everything already logged at their time
        assert_eq!(
            timeline
                .changes(&"1".into())
                .iter()
                .map(|c| (c.time, c.delta))
                .collect::<Vec<_>>(),
            vec![
                (Time::seconds_since_midnight(3.0), 1),
                (Time::seconds_since_midnight(3.0), 1),
                (Time::seconds_since_midnight(5.0), 1),
                (Time::seconds_since_midnight(5.0), -1),
            ]
        );
        assert_eq!(timeline.diagnostics().out_of_order_events, 2);
    }

    #[test]
    fn window_queries() {
        let timeline = build(&[
            Event::enters(1.0, "l1", "p", "p", "car"),
            Event::leaves(1.0, "l2", "p", "p", "car"),
        ]);
        let hour = |h: f64| Time::seconds_since_midnight(h * 3600.0);

        assert_eq!(
            timeline.occupancy(&"l1".into(), hour(0.0), hour(1.0)),
            vec![
                OccupancyEntry::new(0.0, 1.0, 1),
                OccupancyEntry::new(1.0, 3600.0, 0)
            ]
        );
        assert_eq!(
            timeline.occupancy(&"l2".into(), hour(1.0), hour(2.0)),
            vec![OccupancyEntry::new(3600.0, 7200.0, 1)]
        );
        assert_eq!(
            timeline.occupancy(&"nobody".into(), hour(0.0), hour(1.0)),
            Vec::new()
        );
    }
}
