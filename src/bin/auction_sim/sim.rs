//! Auction simulation.
//!
//! Sets up a rebalancing set on a fresh engine, runs it through a full rebalance on
//! a manual clock and bids whenever the auction price reaches the configured level.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use rebalance_sdk::{
    Deployment,
    client::{RebalancingSetClient, parse_address},
    clock::{Clock, ManualClock},
    shared::SharedEngine,
    state::{Engine, LoggedEvent, RebalanceEvent, RebalancingSetParams},
    types::RebalanceState,
};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::{
    config::SimConfig,
    error::{Error, Result},
};

const START_TIMESTAMP: u64 = 1_700_000_000;
const BASKET_UNIT: u64 = 10_000_000_000_000_000;
const REBALANCING_UNIT: u64 = 100_000_000_000_000_000;

/// Simulated rebalance of a two-token basket into another two-token basket.
#[derive(Debug)]
pub struct AuctionSimulation {
    clock: ManualClock,
    engine: SharedEngine,
    events: broadcast::Receiver<LoggedEvent>,
    manager: RebalancingSetClient,
    bidder: RebalancingSetClient,
    holder: RebalancingSetClient,
    set: String,
    next_set: String,
    curve: String,
    config: SimConfig,
}

impl AuctionSimulation {
    /// Create the deployment state: curve, baskets, rebalancing set and its supply.
    pub fn try_new(deployment: Deployment, manager: Address, config: SimConfig) -> Result<Self> {
        let clock = ManualClock::new(START_TIMESTAMP);
        let owner = deployment.owner();
        let limits = deployment.limits();
        let mut engine = Engine::new(deployment, Arc::new(clock.clone()));

        let tokens = [1u8, 2, 3].map(Address::with_last_byte);
        let curve = Address::with_last_byte(0xcc);
        let holder = Address::with_last_byte(0x11);
        let bidder = Address::with_last_byte(0x12);
        engine.register_price_curve(owner, curve, config.curve)?;

        let unit = U256::from(BASKET_UNIT);
        let current_set =
            engine.create_basket(vec![tokens[0], tokens[1]], vec![unit, unit], unit)?;
        let next_set = engine.create_basket(vec![tokens[1], tokens[2]], vec![unit, unit], unit)?;
        let set = engine.create_rebalancing_set(RebalancingSetParams {
            manager,
            initial_set: current_set,
            unit_shares: U256::from(REBALANCING_UNIT),
            natural_unit: U256::from(REBALANCING_UNIT),
            rebalance_interval: limits.min_rebalance_interval,
            proposal_period: limits.min_proposal_period,
        })?;

        // Unit shares equal the natural unit, so supply is backed one to one
        for token in [tokens[0], tokens[1]] {
            engine.mint(token, holder, config.supply)?;
            engine.approve(holder, token, config.supply)?;
        }
        engine.issue_basket(holder, current_set, config.supply)?;
        engine.approve(holder, current_set, config.supply)?;
        engine.issue(holder, set, config.supply)?;

        for token in [tokens[1], tokens[2]] {
            engine.mint(token, bidder, config.supply.saturating_mul(U256::from(10)))?;
            engine.approve(bidder, token, U256::MAX)?;
        }

        info!(
            %set,
            %current_set,
            %next_set,
            supply = %config.supply,
            curve = ?config.curve,
            "Simulation deployment ready"
        );

        let engine = SharedEngine::new(engine);
        let events = engine.subscribe();
        let client =
            |address: Address| RebalancingSetClient::new(engine.clone(), &address.to_string());
        Ok(Self {
            manager: client(manager)?,
            bidder: client(bidder)?,
            holder: client(holder)?,
            clock,
            events,
            set: set.to_string(),
            next_set: next_set.to_string(),
            curve: curve.to_string(),
            config,
            engine,
        })
    }

    /// Run the rebalance to completion.
    pub async fn run(&mut self) -> Result<RebalanceState> {
        let details = self
            .engine
            .read()
            .await
            .rebalancing_set_details(parse_address("set", &self.set)?)?;
        self.clock.advance(details.rebalance_interval);
        self.manager
            .propose(&self.set, &self.next_set, &self.curve, self.config.price)
            .await?;
        self.drain_events()?;

        self.clock.advance(details.proposal_period);
        self.manager.start_rebalance(&self.set).await?;
        self.drain_events()?;

        loop {
            let details = self.manager.rebalance_details(&self.set).await?;
            let auction = &details.auction;
            info!(
                price = %details.current_price,
                elapsed = details.elapsed,
                remaining = %auction.remaining_current_sets,
                "Auction status"
            );

            if auction.remaining_current_sets < auction.minimum_bid {
                self.manager.settle_rebalance(&self.set).await?;
                self.drain_events()?;
                break;
            }

            if details.current_price.numerator >= self.config.bid_price {
                let preview = self
                    .bidder
                    .bid_price(&self.set, auction.minimum_bid)
                    .await?;
                debug!(?preview, "Bid preview per minimum bid");

                let quantity = self.config.bid_quantity
                    - self.config.bid_quantity % auction.minimum_bid;
                let flows = self
                    .bidder
                    .bid(&self.set, quantity.max(auction.minimum_bid), true, true)
                    .await?;
                info!(
                    quantity = %flows.execution_quantity,
                    tokens = ?flows.tokens,
                    inflow = ?flows.inflow,
                    outflow = ?flows.outflow,
                    "Bid placed"
                );
                self.drain_events()?;
                continue;
            }

            if self.clock.now() >= auction.pivot_timestamp {
                warn!("Pivot reached below the bid price, ending auction");
                self.manager.end_failed_auction(&self.set).await?;
                self.drain_events()?;
                break;
            }

            self.clock.advance(self.config.step);
        }

        let state = self.holder.rebalance_state(&self.set).await?;
        if state == RebalanceState::Drawdown {
            self.holder.redeem_from_failed_rebalance(&self.set).await?;
            self.drain_events()?;
        }

        let history = self.holder.bid_history(&self.set).await?;
        info!(bids = history.len(), %state, "Simulation finished");
        Ok(state)
    }

    /// Logs events published since the last call.
    fn drain_events(&mut self) -> Result<()> {
        loop {
            match self.events.try_recv() {
                Ok(entry) => log_event(&entry),
                Err(TryRecvError::Empty) => return Ok(()),
                Err(TryRecvError::Lagged(skipped)) => warn!(skipped, "Event subscription lagged"),
                Err(TryRecvError::Closed) => return Err(Error::EventsClosed),
            }
        }
    }
}

fn log_event(entry: &LoggedEvent) {
    let sequence = entry.instant().sequence();
    match entry.event() {
        RebalanceEvent::Proposed(e) => {
            info!(sequence, next_set = %e.nextSet, ends = %e.proposalPeriodEndTime, "Rebalance proposed")
        }
        RebalanceEvent::Started(e) => {
            info!(sequence, old_set = %e.oldSet, new_set = %e.newSet, "Rebalance started")
        }
        RebalanceEvent::Settled(e) => info!(
            sequence,
            new_set = %e.newSet,
            issued = %e.issueQuantity,
            unit_shares = %e.unitShares,
            "Rebalance settled"
        ),
        RebalanceEvent::AuctionFailed(e) => warn!(
            sequence,
            remaining = %e.remainingCurrentSets,
            drawdown = e.drawdown,
            "Auction failed"
        ),
        other => debug!(sequence, log_index = entry.log_index(), event = ?other, "Event"),
    }
}
