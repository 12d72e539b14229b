use super::*;
use crate::{
    curve::{AuctionPriceCurve, PriceParameters, PriceRatio},
    types::{RebalanceState, TokenFlows},
};

/// Snapshot of a rebalancing set's configuration and lifecycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RebalancingSetDetails {
    pub address: Address,
    pub manager: Address,
    pub state: RebalanceState,
    pub current_set: Address,
    pub unit_shares: U256,
    pub natural_unit: U256,
    pub supply: U256,
    pub last_rebalance_timestamp: types::Timestamp,
    pub rebalance_interval: u64,
    pub proposal_period: u64,
}

/// Pending or running proposal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalDetails {
    pub state: RebalanceState,
    pub next_set: Address,
    pub price_curve: Address,
    pub proposal_start_time: types::Timestamp,
    pub price: PriceParameters,
}

/// Running auction, priced at the time of the query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RebalanceDetails {
    pub auction: AuctionState,
    pub current_price: PriceRatio,
    pub elapsed: u64,
}

/// Executed bid as recorded in the event log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BidRecord {
    pub instant: types::StateInstant,
    pub log_index: u64,
    pub bidder: Address,
    pub flows: TokenFlows,
}

impl Engine {
    pub fn rebalancing_set(&self, set: Address) -> Result<&RebalancingSet> {
        self.world().set(set)
    }

    pub fn basket(&self, basket: Address) -> Result<&Basket> {
        self.world().basket(basket)
    }

    /// All rebalancing sets, ordered by address.
    pub fn rebalancing_sets(&self) -> impl Iterator<Item = &RebalancingSet> {
        self.world()
            .sets
            .values()
            .sorted_by_key(|set| set.address())
    }

    pub fn rebalance_state(&self, set: Address) -> Result<RebalanceState> {
        Ok(self.rebalancing_set(set)?.state())
    }

    /// States of the given sets in the requested order, failing on the first
    /// unknown set.
    pub fn rebalance_states(&self, sets: &[Address]) -> Result<Vec<RebalanceState>> {
        sets.iter().map(|set| self.rebalance_state(*set)).collect()
    }

    pub fn rebalancing_set_details(&self, set: Address) -> Result<RebalancingSetDetails> {
        let rs = self.rebalancing_set(set)?;
        Ok(RebalancingSetDetails {
            address: rs.address(),
            manager: rs.manager(),
            state: rs.state(),
            current_set: rs.current_set(),
            unit_shares: rs.unit_shares(),
            natural_unit: rs.natural_unit(),
            supply: rs.supply(),
            last_rebalance_timestamp: rs.last_rebalance_timestamp(),
            rebalance_interval: rs.rebalance_interval(),
            proposal_period: rs.proposal_period(),
        })
    }

    /// Proposal of a set in Proposal or Rebalance state.
    pub fn proposal_details(&self, set: Address) -> Result<ProposalDetails> {
        let rs = self.rebalancing_set(set)?;
        let proposal = rs.proposal().ok_or(PreconditionError::WrongState {
            set,
            required: &[RebalanceState::Proposal, RebalanceState::Rebalance],
            actual: rs.state(),
        })?;
        Ok(ProposalDetails {
            state: rs.state(),
            next_set: proposal.next_set,
            price_curve: proposal.price_curve,
            proposal_start_time: proposal.proposal_start_time,
            price: proposal.price,
        })
    }

    /// Auction snapshot of a set in Rebalance state.
    pub fn rebalance_details(&self, set: Address) -> Result<RebalanceDetails> {
        let rs = self.rebalancing_set(set)?;
        let (Some(auction), Some(proposal)) = (rs.auction(), rs.proposal()) else {
            return Err(PreconditionError::WrongState {
                set,
                required: &[RebalanceState::Rebalance],
                actual: rs.state(),
            }
            .into());
        };
        let elapsed = self
            .now()
            .saturating_sub(auction.auction_start_timestamp);
        let curve = self.world().curve(proposal.price_curve)?;
        Ok(RebalanceDetails {
            auction: auction.clone(),
            current_price: curve.price_at(elapsed, &proposal.price),
            elapsed,
        })
    }

    /// Flows a bid for exactly `quantity` would execute with right now. Nothing is
    /// committed, so repeated calls without intervening bids return the same flows.
    pub fn bid_price(&self, set: Address, quantity: U256) -> Result<TokenFlows> {
        let rs = self.rebalancing_set(set)?;
        quote_bid(self.world(), rs, quantity, false, self.now())
    }

    /// Executed bids of a set in log order.
    pub fn bid_history(&self, set: Address) -> Vec<BidRecord> {
        self.events(set)
            .filter_map(|entry| match entry.event() {
                RebalanceEvent::BidPlaced(bid) => Some(BidRecord {
                    instant: entry.instant(),
                    log_index: entry.log_index(),
                    bidder: bid.bidder,
                    flows: TokenFlows {
                        execution_quantity: bid.executionQuantity,
                        tokens: bid.combinedTokenAddresses.clone(),
                        inflow: bid.inflowTokenUnits.clone(),
                        outflow: bid.outflowTokenUnits.clone(),
                    },
                }),
                _ => None,
            })
            .collect()
    }

    /// Log entries emitted by `set`.
    pub fn events(&self, set: Address) -> impl Iterator<Item = &LoggedEvent> {
        self.log().iter().filter(move |entry| entry.emitter() == set)
    }
}
