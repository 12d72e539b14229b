//! Rebalancing auction simulator.
//!
//! This binary runs a rebalancing set through a full auction on a simulated clock
//! and logs prices, bids and the outcome.

mod config;
mod error;
mod sim;

use clap::Parser;
use std::process::exit;
use tracing::error;

use config::{CliConfig, EnvConfig};
use sim::AuctionSimulation;

#[tokio::main]
async fn main() {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Failed to load .env file: {}", e);
    }

    // Parse environment configuration
    let env_config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to parse environment configuration: {}", e);
            exit(1);
        }
    };

    // Parse CLI arguments
    let cli_config = CliConfig::parse();

    let sim_config = match cli_config.to_sim_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            exit(1);
        }
    };

    // Set up logging
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "info");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let deployment = match env_config.deployment() {
        Ok(deployment) => deployment,
        Err(e) => {
            eprintln!("Invalid deployment configuration: {}", e);
            exit(1);
        }
    };

    let manager = match env_config.manager(&deployment) {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("Invalid manager address: {}", e);
            exit(1);
        }
    };

    let mut simulation = match AuctionSimulation::try_new(deployment, manager, sim_config) {
        Ok(simulation) => simulation,
        Err(e) => {
            eprintln!("Failed to set up the simulation: {}", e);
            exit(1);
        }
    };

    if let Err(e) = simulation.run().await {
        error!(%e, "Auction simulation failed");
        exit(1);
    }
}
