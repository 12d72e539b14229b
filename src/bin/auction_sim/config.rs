//! Configuration for the auction simulator.
//!
//! Configuration comes from two sources:
//! - Environment variables (via .env file or shell): deployment addresses and factory limits
//! - CLI arguments: auction parameters and the bidding schedule

use alloy::primitives::{Address, U256};
use clap::Parser;
use fastnum::{UD64, UD128, decimal::Context};
use rebalance_sdk::{
    Deployment, FactoryLimits,
    client::parse_address,
    curve::{CurveKind, PRICE_DIVISOR, PriceParameters},
    error::RebalanceError,
    num::Converter,
};

/// Environment configuration (deployment addresses, factory limits).
#[derive(Debug, Default, serde::Deserialize)]
pub struct EnvConfig {
    /// Deployment owner, registers price curves
    pub owner_address: Option<String>,

    /// Manager of the simulated rebalancing set
    pub manager_address: Option<String>,

    /// Minimum seconds between rebalances (default: local deployment)
    pub min_rebalance_interval: Option<u64>,

    /// Minimum proposal period in seconds (default: local deployment)
    pub min_proposal_period: Option<u64>,

    /// Minimum seconds to pivot (default: local deployment)
    pub min_time_to_pivot: Option<u64>,

    /// Maximum seconds to pivot (default: local deployment)
    pub max_time_to_pivot: Option<u64>,
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Local deployment with the configured owner and limits applied.
    pub fn deployment(&self) -> Result<Deployment, RebalanceError> {
        let local = Deployment::local();
        let owner = match &self.owner_address {
            Some(owner) => parse_address("owner", owner)?,
            None => local.owner(),
        };
        let defaults = local.limits();
        let limits = FactoryLimits {
            min_rebalance_interval: self
                .min_rebalance_interval
                .unwrap_or(defaults.min_rebalance_interval),
            min_proposal_period: self
                .min_proposal_period
                .unwrap_or(defaults.min_proposal_period),
            min_time_to_pivot: self.min_time_to_pivot.unwrap_or(defaults.min_time_to_pivot),
            max_time_to_pivot: self.max_time_to_pivot.unwrap_or(defaults.max_time_to_pivot),
        };
        Ok(Deployment::custom(
            owner,
            local.vault(),
            local.transfer_proxy(),
            local.factory(),
            limits,
        ))
    }

    /// Parse the manager address, defaults to the deployment owner.
    pub fn manager(&self, deployment: &Deployment) -> Result<Address, RebalanceError> {
        match &self.manager_address {
            Some(manager) => parse_address("manager", manager),
            None => Ok(deployment.owner()),
        }
    }
}

/// CLI arguments of the simulated auction.
#[derive(Debug, Parser)]
#[command(name = "auction-sim")]
#[command(about = "Simulates a rebalancing set auction and logs its progress")]
pub struct CliConfig {
    /// Auction price at the start (e.g., 0.5)
    #[arg(long, default_value = "0.5")]
    pub start_price: String,

    /// Auction price at the pivot (e.g., 1.5)
    #[arg(long, default_value = "1.5")]
    pub pivot_price: String,

    /// Seconds from the auction start to the pivot
    #[arg(long, default_value_t = 86400)]
    pub time_to_pivot: u64,

    /// Price curve behaviour past the pivot
    #[arg(long, value_enum, default_value_t = CurveKind::Linear)]
    pub curve: CurveKind,

    /// Rebalancing set supply issued before the auction, in ether
    #[arg(long, default_value = "20")]
    pub supply: String,

    /// Current sets requested per bid, in ether
    #[arg(long, default_value = "10")]
    pub bid_quantity: String,

    /// Lowest price the bidder accepts (e.g., 1.0)
    #[arg(long, default_value = "1")]
    pub bid_price: String,

    /// Seconds between auction checks
    #[arg(long, default_value_t = 3600)]
    pub step: u64,
}

/// Auction parameters derived from the CLI.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub price: PriceParameters,
    pub curve: CurveKind,
    pub supply: U256,
    pub bid_quantity: U256,
    pub bid_price: U256,
    pub step: u64,
}

impl CliConfig {
    /// Convert CLI config to the simulation parameters.
    pub fn to_sim_config(&self) -> Result<SimConfig, ConfigError> {
        let start_price = parse_price("start_price", &self.start_price)?;
        let pivot_price = parse_price("pivot_price", &self.pivot_price)?;
        if start_price > pivot_price {
            return Err(ConfigError::InvalidPriceRelation);
        }
        if self.step == 0 {
            return Err(ConfigError::ZeroStep);
        }

        Ok(SimConfig {
            price: PriceParameters {
                start_price,
                pivot_price,
                time_to_pivot: self.time_to_pivot,
            },
            curve: self.curve,
            supply: parse_amount("supply", &self.supply)?,
            bid_quantity: parse_amount("bid_quantity", &self.bid_quantity)?,
            bid_price: parse_price("bid_price", &self.bid_price)?,
            step: self.step,
        })
    }
}

/// Price numerator over the curve price divisor.
fn parse_price(field: &'static str, value: &str) -> Result<U256, ConfigError> {
    let price = UD64::from_str(value, Context::default())
        .map_err(|_| ConfigError::InvalidPrice(field))?;
    let decimals = PRICE_DIVISOR.ilog10() as u8;
    Ok(Converter::new(decimals).to_unsigned(price))
}

fn parse_amount(field: &'static str, value: &str) -> Result<U256, ConfigError> {
    let amount = UD128::from_str(value, Context::default())
        .map_err(|_| ConfigError::InvalidAmount(field))?;
    if amount == UD128::ZERO {
        return Err(ConfigError::InvalidAmount(field));
    }
    Ok(Converter::ether().to_unsigned(amount))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid price value for {0}")]
    InvalidPrice(&'static str),

    #[error("Invalid amount value for {0}")]
    InvalidAmount(&'static str),

    #[error("start_price must not exceed pivot_price")]
    InvalidPriceRelation,

    #[error("step cannot be zero")]
    ZeroStep,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli() -> CliConfig {
        CliConfig {
            start_price: "0.5".to_string(),
            pivot_price: "1.5".to_string(),
            time_to_pivot: 86400,
            curve: CurveKind::Flat,
            supply: "20".to_string(),
            bid_quantity: "10".to_string(),
            bid_price: "1".to_string(),
            step: 3600,
        }
    }

    #[test]
    fn test_cli_config_to_sim_config() {
        let config = cli().to_sim_config().unwrap();
        assert_eq!(config.price.start_price, U256::from(500));
        assert_eq!(config.price.pivot_price, U256::from(1500));
        assert_eq!(config.bid_price, U256::from(1000));
        assert_eq!(config.supply, U256::from(20_000_000_000_000_000_000u128));
        assert_eq!(config.curve, CurveKind::Flat);
    }

    #[test]
    fn test_invalid_price_relation() {
        let cli = CliConfig {
            start_price: "2".to_string(),
            ..cli()
        };
        assert!(matches!(
            cli.to_sim_config(),
            Err(ConfigError::InvalidPriceRelation)
        ));
    }

    #[test]
    fn test_invalid_amount() {
        let cli = CliConfig {
            supply: "lots".to_string(),
            ..cli()
        };
        assert!(matches!(
            cli.to_sim_config(),
            Err(ConfigError::InvalidAmount("supply"))
        ));
    }

    #[test]
    fn test_env_config_defaults_to_local_deployment() {
        let env = EnvConfig::default();
        let deployment = env.deployment().unwrap();
        assert_eq!(deployment.owner(), Deployment::local().owner());
        assert_eq!(env.manager(&deployment).unwrap(), deployment.owner());
    }
}
