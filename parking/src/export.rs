use std::path::Path;

use anyhow::Result;
use geom::{Distance, Time};
use serde::Serialize;

use crate::{EdgeID, Network, OccupancyTimeline};

/// The busiest stretch of the day on one edge.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PeakOccupancy {
    pub edge: EdgeID,
    pub from_time: Time,
    /// Empty if the peak lasts until the end of the simulation.
    pub to_time: Option<Time>,
    pub length: Distance,
    pub max_occupancy: i64,
    pub initial_occupancy: i64,
}

/// One row per edge with any parking activity, ordered by edge. If the peak level is reached
/// several times, the earliest one is reported.
pub fn peak_occupancy(network: &Network, timeline: &OccupancyTimeline) -> Result<Vec<PeakOccupancy>> {
    let mut rows = Vec::new();
    for (edge, entries) in timeline.iter() {
        let mut peak = &entries[0];
        for entry in entries {
            if entry.level > peak.level {
                peak = entry;
            }
        }
        rows.push(PeakOccupancy {
            edge: edge.clone(),
            from_time: peak.from,
            to_time: peak.to,
            length: network.get(edge)?.length,
            max_occupancy: peak.level,
            initial_occupancy: entries[0].level,
        });
    }
    Ok(rows)
}

pub fn peak_occupancy_csv(network: &Network, timeline: &OccupancyTimeline) -> Result<String> {
    let mut out = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut out);
        for row in peak_occupancy(network, timeline)? {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    let out = String::from_utf8(out)?;
    Ok(out)
}

pub fn write_peak_occupancy_csv<P: AsRef<Path>>(
    path: P,
    network: &Network,
    timeline: &OccupancyTimeline,
) -> Result<()> {
    let csv = peak_occupancy_csv(network, timeline)?;
    fs_err::write(path.as_ref(), csv)?;
    info!("Wrote {}", path.as_ref().display());
    Ok(())
}
