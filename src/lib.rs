//! Rebalancing Set SDK.
//!
//! # Overview
//!
//! Deterministic in-memory engine of the rebalancing set token protocol: a tokenized
//! basket of assets whose composition is periodically replaced with another basket
//! through a Dutch auction.
//!
//! Use [`state::Engine`] to create baskets and rebalancing sets and drive them through
//! the `Default -> Proposal -> Rebalance -> {Default | Drawdown}` cycle, then query
//! derived views via the [`state::Engine`] projection methods.
//!
//! [`shared::SharedEngine`] wraps the engine for concurrent readers, and
//! [`client::RebalancingSetClient`] exposes the operations with string addresses
//! validated before dispatch.
//!
//! See `./tests` for examples.
//!
//! # Limitations/follow-ups
//!
//! * Token balances are tracked by the engine's own ledger, no chain state is read.
//!
//! * Only linear and flat auction price curves are implemented.
//!
//! # Testing
//!
//! [`testing`] module provides a local testing environment with a manual clock,
//! funded holders and a rebalancing set ready to be proposed.

pub mod abi;
pub mod client;
pub mod clock;
pub mod curve;
pub mod error;
pub mod num;
pub mod shared;
pub mod state;
pub mod testing;
pub mod types;

use alloy::primitives::{Address, address};

#[derive(Clone, Debug)]
/// Protocol deployment the engine is operating as.
pub struct Deployment {
    owner: Address,
    vault: Address,
    transfer_proxy: Address,
    factory: Address,
    limits: FactoryLimits,
}

/// Bounds the factory applies to new rebalancing sets and proposals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FactoryLimits {
    /// Minimum seconds between two rebalances.
    pub min_rebalance_interval: u64,

    /// Minimum seconds between a proposal and the auction start.
    pub min_proposal_period: u64,

    /// Minimum auction duration up to the pivot.
    pub min_time_to_pivot: u64,

    /// Maximum auction duration up to the pivot.
    pub max_time_to_pivot: u64,
}

impl Default for FactoryLimits {
    fn default() -> Self {
        Self {
            min_rebalance_interval: 24 * 60 * 60,
            min_proposal_period: 24 * 60 * 60,
            min_time_to_pivot: 6 * 60 * 60,
            max_time_to_pivot: 3 * 24 * 60 * 60,
        }
    }
}

impl Deployment {
    pub fn local() -> Self {
        Self {
            owner: address!("0x5409ed021d9299bf6814279a6a1411a7e866a631"),
            vault: address!("0x1dc4c1cefef38a777b15aa20260a54e584b16c48"),
            transfer_proxy: address!("0x1d7022f5b17d2f8b695918fb48fa1089c9f85401"),
            factory: address!("0x0b1ba0af832d7c05fd64161e0db78e85978e8082"),
            limits: FactoryLimits {
                min_rebalance_interval: 60,
                min_proposal_period: 60,
                min_time_to_pivot: 60,
                max_time_to_pivot: 7 * 24 * 60 * 60,
            },
        }
    }

    pub fn custom(
        owner: Address,
        vault: Address,
        transfer_proxy: Address,
        factory: Address,
        limits: FactoryLimits,
    ) -> Self {
        Self {
            owner,
            vault,
            transfer_proxy,
            factory,
            limits,
        }
    }

    /// Address allowed to register price curves.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Custody contract holding collateral on behalf of sets and bidders.
    pub fn vault(&self) -> Address {
        self.vault
    }

    /// Spender token holders approve to move inflows and issuance collateral.
    pub fn transfer_proxy(&self) -> Address {
        self.transfer_proxy
    }

    /// Address new sets are derived from.
    pub fn factory(&self) -> Address {
        self.factory
    }

    pub fn limits(&self) -> FactoryLimits {
        self.limits
    }
}
