use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::Result;
use geom::{Distance, Duration, Time};

use crate::error::config_error;
use crate::{
    entries_in_window, EdgeID, Network, OccupancySource, ParkingConfig, ParkingError,
    PricingPolicy,
};

/// Hourly parking costs for every edge and time bin, frozen for one iteration. Cheap to share;
/// `CostHistory` replaces the whole table instead of changing it.
#[derive(Clone, Debug, PartialEq)]
pub struct CostTable {
    edge_index: Arc<HashMap<EdgeID, usize>>,
    bin_width: Duration,
    num_bins: usize,
    // Indexed by the edge's position in the network, then by bin
    costs: Vec<Vec<f64>>,
}

impl CostTable {
    /// The hourly cost of parking on `edge` starting at `time`.
    pub fn cost(&self, edge: &EdgeID, time: Time) -> Result<f64> {
        let idx = self.index(edge)?;
        let bin = time.bucket(self.bin_width);
        if bin >= self.num_bins {
            return Err(ParkingError::TimeOutOfRange {
                time,
                end_of_day: self.end_of_day(),
            }
            .into());
        }
        Ok(self.costs[idx][bin])
    }

    /// All bins for one edge.
    pub fn costs(&self, edge: &EdgeID) -> Result<&[f64]> {
        let idx = self.index(edge)?;
        Ok(&self.costs[idx])
    }

    /// Every edge's costs, in the same shape as `ParkingConfig::initial_costs`.
    pub fn to_initial_costs(&self) -> BTreeMap<EdgeID, Vec<f64>> {
        self.edge_index
            .iter()
            .map(|(edge, idx)| (edge.clone(), self.costs[*idx].clone()))
            .collect()
    }

    pub fn bin_width(&self) -> Duration {
        self.bin_width
    }

    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    pub fn end_of_day(&self) -> Time {
        Time::START_OF_DAY + self.bin_width * (self.num_bins as f64)
    }

    fn index(&self, edge: &EdgeID) -> Result<usize> {
        match self.edge_index.get(edge) {
            Some(idx) => Ok(*idx),
            None => Err(ParkingError::UnknownEdge(edge.clone()).into()),
        }
    }
}

/// Owns the current cost table and rebuilds it from observed occupancy after every iteration.
pub struct CostHistory {
    edges: Vec<EdgeID>,
    available_spots: Vec<f64>,
    policy: Box<dyn PricingPolicy>,
    costs: Arc<CostTable>,
}

impl CostHistory {
    pub fn new(
        network: &Network,
        config: &ParkingConfig,
        policy: Box<dyn PricingPolicy>,
    ) -> Result<CostHistory> {
        config.validate()?;
        let num_bins = config.num_bins();

        let edges: Vec<EdgeID> = network.edges().iter().map(|e| e.id.clone()).collect();
        let edge_index: HashMap<EdgeID, usize> = edges
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), idx))
            .collect();
        // The sample only fills a fraction of the real curb, so each simulated vehicle stands in
        // for several real ones.
        let spot_length = config.spot_length * config.sample_rate;
        let available_spots: Vec<f64> = network
            .edges()
            .iter()
            .map(|e| e.length / spot_length)
            .collect();

        let mut costs = vec![vec![config.default_hourly_cost; num_bins]; edges.len()];
        for (edge, initial) in &config.initial_costs {
            let idx = match edge_index.get(edge) {
                Some(idx) => *idx,
                None => config_error!("initial costs given for {}, which isn't in the network", edge),
            };
            if initial.len() != num_bins {
                config_error!(
                    "{} has {} initial costs, but there are {} bins",
                    edge,
                    initial.len(),
                    num_bins
                );
            }
            costs[idx] = initial.clone();
        }

        let total_length = network
            .edges()
            .iter()
            .fold(Distance::ZERO, |sum, e| sum + e.length);
        info!(
            "Parking costs for {} edges ({} of curb) over {} bins of {}, {} with initial costs",
            edges.len(),
            total_length,
            num_bins,
            config.bin_width,
            config.initial_costs.len()
        );

        Ok(CostHistory {
            edges,
            available_spots,
            policy,
            costs: Arc::new(CostTable {
                edge_index: Arc::new(edge_index),
                bin_width: config.bin_width,
                num_bins,
                costs,
            }),
        })
    }

    pub fn cost(&self, edge: &EdgeID, time: Time) -> Result<f64> {
        self.costs.cost(edge, time)
    }

    /// The table in effect right now. Holders keep seeing it even after the next update.
    pub fn snapshot(&self) -> Arc<CostTable> {
        self.costs.clone()
    }

    /// How many real vehicles fit on this edge.
    pub fn available_spots(&self, edge: &EdgeID) -> Result<f64> {
        let idx = self.costs.index(edge)?;
        Ok(self.available_spots[idx])
    }

    /// The time-weighted average number of parked vehicles in every bin, divided by what the edge
    /// holds. Edges without any spots get NaN. Indexed like the cost table.
    pub fn relative_occupancy(
        &self,
        iteration: usize,
        source: &dyn OccupancySource,
    ) -> Result<Vec<Vec<f64>>> {
        let table = &self.costs;
        let mut result = Vec::with_capacity(self.edges.len());
        for (idx, edge) in self.edges.iter().enumerate() {
            let day = source.occupancy(iteration, edge, Time::START_OF_DAY, table.end_of_day())?;
            let mut per_bin = Vec::with_capacity(table.num_bins);
            for bin in 0..table.num_bins {
                let from = Time::START_OF_DAY + table.bin_width * (bin as f64);
                let to = from + table.bin_width;
                let mut weighted = 0.0;
                for entry in entries_in_window(from, to, &day) {
                    if let Some(overlap) = entry.duration() {
                        weighted += (overlap / table.bin_width) * (entry.level as f64);
                    }
                }
                if self.available_spots[idx] > 0.0 {
                    per_bin.push(weighted / self.available_spots[idx]);
                } else {
                    per_bin.push(f64::NAN);
                }
            }
            result.push(per_bin);
        }
        Ok(result)
    }

    /// Prices the next iteration using the occupancy observed in this one. The current snapshot
    /// isn't touched; a new one replaces it once every cell is computed.
    pub fn on_iteration_end(
        &mut self,
        iteration: usize,
        source: &dyn OccupancySource,
    ) -> Result<()> {
        let relative = self.relative_occupancy(iteration, source)?;

        let mut costs = self.costs.costs.clone();
        let mut changed = 0;
        let mut no_spots = 0;
        for (edge_costs, edge_relative) in costs.iter_mut().zip(relative.iter()) {
            for (cost, rel) in edge_costs.iter_mut().zip(edge_relative.iter()) {
                if rel.is_nan() {
                    no_spots += 1;
                    continue;
                }
                let new_cost = self.policy.new_cost(*rel, *cost);
                if new_cost != *cost {
                    changed += 1;
                }
                *cost = new_cost;
            }
        }
        for (idx, edge) in self.edges.iter().enumerate() {
            debug!("{} costs after iteration {}: {:?}", edge, iteration, costs[idx]);
        }

        info!(
            "Iteration {} changed {} parking costs; {} cells have no spots",
            iteration, changed, no_spots
        );
        self.costs = Arc::new(CostTable {
            edge_index: self.costs.edge_index.clone(),
            bin_width: self.costs.bin_width,
            num_bins: self.costs.num_bins,
            costs,
        });
        Ok(())
    }
}
