//! Offline tools for a recorded day of events: report where parking peaked, or run the cost
//! feedback loop over the same day repeatedly.

#[macro_use]
extern crate log;

use anyhow::Result;
use structopt::StructOpt;

use parking::{
    write_peak_occupancy_csv, Event, InverseLinear, Network, ParkingAnalyzer, ParkingConfig,
    ParkingController, TrafficFilter,
};

#[derive(StructOpt)]
#[structopt(
    name = "parking_occupancy",
    about = "Analyzes parking occupancy from a recorded event log"
)]
enum Command {
    /// Writes the peak occupancy of every edge as CSV
    Peak {
        /// A JSON list of events from one simulated day
        #[structopt(long)]
        events: String,
        /// A JSON list of edges
        #[structopt(long)]
        network: String,
        /// A JSON parking config. Defaults are used if omitted.
        #[structopt(long)]
        config: Option<String>,
        /// The path to write the CSV
        #[structopt(long)]
        output: String,
    },
    /// Replays the same day several times, repricing after each, and writes the final costs in the
    /// format of `initial_costs`
    Replay {
        #[structopt(long)]
        events: String,
        #[structopt(long)]
        network: String,
        #[structopt(long)]
        config: Option<String>,
        #[structopt(long, default_value = "1")]
        iterations: usize,
        /// The path to write the JSON costs
        #[structopt(long)]
        output: String,
    },
}

fn main() -> Result<()> {
    abstutil::logger::setup();

    match Command::from_args() {
        Command::Peak {
            events,
            network,
            config,
            output,
        } => {
            let (log, network, config) = load(events, network, config)?;
            let filter = TrafficFilter::for_network(&config.parking_modes, &network);
            let timeline = ParkingAnalyzer::analyze(&log, &filter, config.max_warnings)?;
            info!("{:?}", timeline.diagnostics());
            write_peak_occupancy_csv(output, &network, &timeline)
        }
        Command::Replay {
            events,
            network,
            config,
            iterations,
            output,
        } => {
            let (log, network, config) = load(events, network, config)?;
            // Offline, every parking mode is assumed to be simulated
            let main_modes = config.parking_modes.clone();
            let mut controller =
                ParkingController::new(network, config, &main_modes, Box::new(InverseLinear))?;
            for iteration in 0..iterations {
                let charges = controller.replay_day(iteration, &log)?;
                let total: f64 = charges.iter().map(|c| c.amount).sum();
                info!(
                    "Iteration {}: {} parking charges totaling {:.2}",
                    iteration,
                    charges.len(),
                    total
                );
            }
            abstutil::write_json(
                output,
                &controller.cost_history().snapshot().to_initial_costs(),
            )
        }
    }
}

fn load(
    events: String,
    network: String,
    config: Option<String>,
) -> Result<(Vec<Event>, Network, ParkingConfig)> {
    let log: Vec<Event> = abstutil::read_json(events)?;
    let network = Network::load(network)?;
    let config = match config {
        Some(path) => ParkingConfig::load(path)?,
        None => ParkingConfig::default(),
    };
    info!("Read {} events over {} edges", log.len(), network.len());
    Ok((log, network, config))
}
