use std::mem;

use anyhow::Result;
use geom::Time;

use super::{initial_occupancy, OccupancyEntry, OccupancySource, OccupancyTimeline, TrafficFilter};
use crate::{EdgeID, Event, ParkingError};

enum State {
    Idle,
    /// The simulation is running; occupancy can't be known yet.
    Recording { iteration: usize, log: Vec<Event> },
    Analyzed {
        iteration: usize,
        timeline: OccupancyTimeline,
    },
}

/// Records one iteration's parking-relevant events while the simulation runs, then analyzes them
/// once the day is over. Occupancy queries are refused until then.
pub struct ParkingAnalyzer {
    filter: TrafficFilter,
    max_warnings: usize,
    state: State,
}

impl ParkingAnalyzer {
    pub fn new(filter: TrafficFilter, max_warnings: usize) -> ParkingAnalyzer {
        ParkingAnalyzer {
            filter,
            max_warnings,
            state: State::Idle,
        }
    }

    /// Runs both passes over a complete, already-recorded log.
    pub fn analyze(
        log: &[Event],
        filter: &TrafficFilter,
        max_warnings: usize,
    ) -> Result<OccupancyTimeline> {
        let initial = initial_occupancy(log, filter, max_warnings)?;
        info!(
            "{} vehicles were parked before the first event",
            initial.total()
        );
        Ok(OccupancyTimeline::build(
            log,
            filter,
            &initial,
            max_warnings,
        ))
    }

    /// Forgets the previous iteration entirely.
    pub fn begin_iteration(&mut self, iteration: usize) {
        self.state = State::Recording {
            iteration,
            log: Vec::new(),
        };
    }

    pub fn handle_event(&mut self, ev: &Event) {
        if let State::Recording { ref mut log, .. } = self.state {
            let relevant = match ev {
                Event::VehicleEntersTraffic(t) | Event::VehicleLeavesTraffic(t) => {
                    self.filter.accepts(t)
                }
                Event::ActivityStart { .. } => false,
            };
            if relevant {
                log.push(ev.clone());
            }
        }
    }

    /// Call once all of the iteration's events have been handled.
    pub fn finish_iteration(&mut self) -> Result<&OccupancyTimeline> {
        let (iteration, log) = match mem::replace(&mut self.state, State::Idle) {
            State::Recording { iteration, log } => (iteration, log),
            State::Idle => bail!("finish_iteration called before begin_iteration"),
            State::Analyzed { iteration, .. } => {
                bail!("iteration {} was already analyzed", iteration)
            }
        };

        info!(
            "Analyzing parking for iteration {} from {} events",
            iteration,
            log.len()
        );
        let timeline = ParkingAnalyzer::analyze(&log, &self.filter, self.max_warnings)?;
        self.state = State::Analyzed {
            iteration,
            timeline,
        };
        match self.state {
            State::Analyzed { ref timeline, .. } => Ok(timeline),
            _ => unreachable!(),
        }
    }

    /// Only available between `finish_iteration` and the next `begin_iteration`.
    pub fn timeline(&self) -> Option<&OccupancyTimeline> {
        match self.state {
            State::Analyzed { ref timeline, .. } => Some(timeline),
            _ => None,
        }
    }
}

impl OccupancySource for ParkingAnalyzer {
    fn occupancy(
        &self,
        iteration: usize,
        edge: &EdgeID,
        from: Time,
        to: Time,
    ) -> Result<Vec<OccupancyEntry>> {
        match self.state {
            State::Idle => Err(ParkingError::OccupancyUnavailable { iteration }.into()),
            State::Recording {
                iteration: current, ..
            } => Err(ParkingError::OccupancyUnavailable { iteration: current }.into()),
            State::Analyzed {
                iteration: analyzed,
                ref timeline,
            } => {
                if iteration != analyzed {
                    return Err(ParkingError::IterationMismatch {
                        requested: iteration,
                        analyzed,
                    }
                    .into());
                }
                Ok(timeline.occupancy(edge, from, to))
            }
        }
    }
}
