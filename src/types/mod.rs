mod event;
mod flows;

pub use event::*;
pub use flows::TokenFlows;

/// Sequence number of a committed engine operation.
pub type Sequence = u64;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Instant in engine history the state/event is up to date with.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Eq, Ord, Hash, Default)]
pub struct StateInstant {
    sequence: Sequence,
    timestamp: Timestamp,
}

impl StateInstant {
    pub fn new(sequence: Sequence, timestamp: Timestamp) -> Self {
        Self {
            sequence,
            timestamp,
        }
    }

    /// Number of operations committed up to and including this instant.
    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// Lifecycle state of a rebalancing set.
///
/// * [`RebalanceState::Default`]: holders can issue and redeem, manager can propose.
/// * [`RebalanceState::Proposal`]: next set announced, holders can still redeem
///   during the proposal period.
/// * [`RebalanceState::Rebalance`]: current set redeemed into components, auction is
///   accepting bids.
/// * [`RebalanceState::Drawdown`]: auction failed after partial fills, holders withdraw
///   their pro-rata share of custody.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum RebalanceState {
    #[default]
    Default,
    Proposal,
    Rebalance,
    Drawdown,
}

impl RebalanceState {
    pub fn is_default(&self) -> bool {
        matches!(self, RebalanceState::Default)
    }

    pub fn is_rebalance(&self) -> bool {
        matches!(self, RebalanceState::Rebalance)
    }
}

impl std::fmt::Display for RebalanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RebalanceState::Default => "Default",
            RebalanceState::Proposal => "Proposal",
            RebalanceState::Rebalance => "Rebalance",
            RebalanceState::Drawdown => "Drawdown",
        };
        f.write_str(name)
    }
}

impl From<RebalanceState> for u8 {
    fn from(value: RebalanceState) -> Self {
        match value {
            RebalanceState::Default => 0,
            RebalanceState::Proposal => 1,
            RebalanceState::Rebalance => 2,
            RebalanceState::Drawdown => 3,
        }
    }
}
