//! Error types for the auction simulator.

use rebalance_sdk::error::RebalanceError;

use crate::config::ConfigError;

/// Main error type for the auction simulator.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Environment configuration error: {0}")]
    EnvConfig(#[from] envy::Error),

    #[error("Rebalancing engine error: {0}")]
    Engine(#[from] RebalanceError),

    #[error("Event subscription closed")]
    EventsClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
