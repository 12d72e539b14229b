use alloy::primitives::{Log, LogData};
use alloy_sol_types::SolEvent;

use crate::{
    abi::{basket, rebalancing},
    types,
};

/// Engine log entry.
pub type LoggedEvent = types::EventContext<RebalanceEvent>;

/// Events committed by a single engine operation.
pub type OperationEvents = types::BlockEvents<LoggedEvent>;

/// Events emitted by engine operations.
///
/// Payloads are the protocol's ABI event types, so log entries can be exported
/// as EVM logs with [`LoggedEvent::to_log`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RebalanceEvent {
    /// Basket created.
    BasketCreated(basket::SetTokenCreated),

    /// Rebalancing set created by the factory.
    RebalancingSetCreated(rebalancing::RebalancingSetCreated),

    /// Manager replaced.
    ManagerUpdated(rebalancing::NewManagerAdded),

    /// Rebalance proposed, set entered Proposal state.
    Proposed(rebalancing::RebalanceProposed),

    /// Auction started, set entered Rebalance state.
    Started(rebalancing::RebalanceStarted),

    /// Bid executed.
    BidPlaced(rebalancing::BidPlaced),

    /// Auction settled, set returned to Default state with the next set.
    Settled(rebalancing::RebalanceSettled),

    /// Auction ended without completing.
    AuctionFailed(rebalancing::AuctionFailed),

    /// Holder withdrew their share of a failed rebalance.
    DrawdownRedeemed(rebalancing::RedeemedFromFailedRebalance),

    /// Rebalancing set issued.
    Issued(rebalancing::Issued),

    /// Rebalancing set redeemed.
    Redeemed(rebalancing::Redeemed),
}

impl RebalanceEvent {
    /// ABI encoded topics and data of the event.
    pub fn encode_log_data(&self) -> LogData {
        match self {
            RebalanceEvent::BasketCreated(e) => e.encode_log_data(),
            RebalanceEvent::RebalancingSetCreated(e) => e.encode_log_data(),
            RebalanceEvent::ManagerUpdated(e) => e.encode_log_data(),
            RebalanceEvent::Proposed(e) => e.encode_log_data(),
            RebalanceEvent::Started(e) => e.encode_log_data(),
            RebalanceEvent::BidPlaced(e) => e.encode_log_data(),
            RebalanceEvent::Settled(e) => e.encode_log_data(),
            RebalanceEvent::AuctionFailed(e) => e.encode_log_data(),
            RebalanceEvent::DrawdownRedeemed(e) => e.encode_log_data(),
            RebalanceEvent::Issued(e) => e.encode_log_data(),
            RebalanceEvent::Redeemed(e) => e.encode_log_data(),
        }
    }
}

impl LoggedEvent {
    /// EVM log of the event emitted by the set the event belongs to.
    pub fn to_log(&self) -> Log {
        Log {
            address: self.emitter(),
            data: self.event().encode_log_data(),
        }
    }
}
