use anyhow::Result;

use crate::{
    CostHistory, Event, MoneyEvent, Network, ParkingAnalyzer, ParkingChargeHandler,
    ParkingConfig, PricingPolicy, TrafficFilter,
};

/// Wires everything together for a simulation that runs the same day over and over. The
/// simulation calls `start_iteration`, feeds every event through `handle_event`, then calls
/// `end_iteration`.
pub struct ParkingController {
    network: Network,
    config: ParkingConfig,
    cost_history: CostHistory,
    analyzer: ParkingAnalyzer,
    handlers: Vec<ParkingChargeHandler>,
    current_iteration: Option<usize>,
}

impl ParkingController {
    /// Every parking mode must be one of the `main_modes` the simulation moves on the network.
    pub fn new(
        network: Network,
        config: ParkingConfig,
        main_modes: &[String],
        policy: Box<dyn PricingPolicy>,
    ) -> Result<ParkingController> {
        config.validate()?;
        config.check_main_modes(main_modes)?;

        let cost_history = CostHistory::new(&network, &config, policy)?;
        let filter = TrafficFilter::for_network(&config.parking_modes, &network);
        let handlers = config
            .parking_modes
            .iter()
            .map(|mode| {
                ParkingChargeHandler::new(
                    mode,
                    filter.clone(),
                    config.untracked_filter(),
                    cost_history.snapshot(),
                )
            })
            .collect();
        let analyzer = ParkingAnalyzer::new(filter, config.max_warnings);

        Ok(ParkingController {
            network,
            config,
            cost_history,
            analyzer,
            handlers,
            current_iteration: None,
        })
    }

    pub fn start_iteration(&mut self, iteration: usize) {
        if let Some(prev) = self.current_iteration {
            warn!(
                "Starting iteration {} without ending iteration {}",
                iteration, prev
            );
        }
        self.current_iteration = Some(iteration);
        self.analyzer.begin_iteration(iteration);
        let costs = self.cost_history.snapshot();
        for handler in &mut self.handlers {
            handler.reset(costs.clone());
        }
    }

    /// Returns the charges caused by this event, if any.
    pub fn handle_event(&mut self, ev: &Event) -> Result<Vec<MoneyEvent>> {
        self.analyzer.handle_event(ev);
        let mut charges = Vec::new();
        for handler in &mut self.handlers {
            if let Some(charge) = handler.handle_event(ev)? {
                charges.push(charge);
            }
        }
        Ok(charges)
    }

    /// Analyzes the finished day and reprices for the next one.
    pub fn end_iteration(&mut self, iteration: usize) -> Result<()> {
        match self.current_iteration.take() {
            Some(current) if current == iteration => {}
            Some(current) => bail!(
                "Can't end iteration {} while iteration {} is running",
                iteration,
                current
            ),
            None => bail!("Can't end iteration {}; it never started", iteration),
        }

        for handler in &mut self.handlers {
            handler.finish();
        }
        let diagnostics = self.analyzer.finish_iteration()?.diagnostics().clone();
        if diagnostics.negative_entries > 0 {
            warn!(
                "Iteration {} had negative parking occupancy on {} edges",
                iteration, diagnostics.edges_with_negative_occupancy
            );
        }
        self.cost_history.on_iteration_end(iteration, &self.analyzer)
    }

    /// Runs one whole iteration over an already-recorded day.
    pub fn replay_day(&mut self, iteration: usize, log: &[Event]) -> Result<Vec<MoneyEvent>> {
        self.start_iteration(iteration);
        let mut charges = Vec::new();
        for ev in log {
            charges.extend(self.handle_event(ev)?);
        }
        self.end_iteration(iteration)?;
        Ok(charges)
    }

    pub fn cost_history(&self) -> &CostHistory {
        &self.cost_history
    }

    pub fn analyzer(&self) -> &ParkingAnalyzer {
        &self.analyzer
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn config(&self) -> &ParkingConfig {
        &self.config
    }
}
