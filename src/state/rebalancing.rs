use super::*;
use crate::curve::PriceParameters;

/// Rebalancing set token.
///
/// Holds custody of its current basket on behalf of holders and tracks the
/// rebalance cycle. Mutated only through [`super::Engine`] operations.
#[derive(Clone, derive_more::Debug)]
pub struct RebalancingSet {
    instant: types::StateInstant,
    address: Address,
    manager: Address,
    current_set: Address,
    #[debug("{unit_shares}")]
    unit_shares: U256,
    #[debug("{natural_unit}")]
    natural_unit: U256,
    #[debug("{supply}")]
    supply: U256,
    last_rebalance_timestamp: types::Timestamp,
    rebalance_interval: u64,
    proposal_period: u64,
    state: types::RebalanceState,
    proposal: Option<Proposal>,
    auction: Option<AuctionState>,
    drawdown: Option<DrawdownState>,
}

/// Rebalance announced by the manager, alive in Proposal and Rebalance states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proposal {
    pub next_set: Address,
    pub proposal_start_time: types::Timestamp,
    pub price_curve: Address,
    pub price: PriceParameters,
}

/// Running auction, alive in Rebalance state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuctionState {
    /// Union of current and next components, current components first.
    pub combined_token_array: Vec<Address>,

    /// Current set components per minimum bid, zero for next-only tokens.
    pub combined_current_units: Vec<U256>,

    /// Next set components per minimum bid, zero for current-only tokens.
    pub combined_next_units: Vec<U256>,

    pub minimum_bid: U256,
    pub starting_current_sets: U256,
    pub remaining_current_sets: U256,
    pub auction_start_timestamp: types::Timestamp,
    pub pivot_timestamp: types::Timestamp,
}

/// Custody split captured when an auction failed after partial fills.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawdownState {
    pub tokens: Vec<Address>,
    pub balances: Vec<U256>,
    pub supply: U256,
    pub failed_at: types::Timestamp,
}

/// Parameters of a new rebalancing set.
#[derive(Clone, Debug)]
pub struct RebalancingSetParams {
    pub manager: Address,
    pub initial_set: Address,
    pub unit_shares: U256,
    pub natural_unit: U256,
    pub rebalance_interval: u64,
    pub proposal_period: u64,
}

impl RebalancingSet {
    pub(crate) fn new(
        instant: types::StateInstant,
        address: Address,
        params: &RebalancingSetParams,
    ) -> Self {
        Self {
            instant,
            address,
            manager: params.manager,
            current_set: params.initial_set,
            unit_shares: params.unit_shares,
            natural_unit: params.natural_unit,
            supply: U256::ZERO,
            last_rebalance_timestamp: instant.timestamp(),
            rebalance_interval: params.rebalance_interval,
            proposal_period: params.proposal_period,
            state: types::RebalanceState::Default,
            proposal: None,
            auction: None,
            drawdown: None,
        }
    }

    /// Instant the set state is consistent with or was last updated at.
    pub fn instant(&self) -> types::StateInstant {
        self.instant
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Address allowed to propose and start rebalances.
    pub fn manager(&self) -> Address {
        self.manager
    }

    /// Basket currently backing the set. During an auction this is still the basket
    /// being sold.
    pub fn current_set(&self) -> Address {
        self.current_set
    }

    /// Proposed basket, if any.
    pub fn next_set(&self) -> Option<Address> {
        self.proposal.as_ref().map(|p| p.next_set)
    }

    /// Current set quantity backing one natural unit of the rebalancing set.
    pub fn unit_shares(&self) -> U256 {
        self.unit_shares
    }

    pub fn natural_unit(&self) -> U256 {
        self.natural_unit
    }

    pub fn supply(&self) -> U256 {
        self.supply
    }

    pub fn last_rebalance_timestamp(&self) -> types::Timestamp {
        self.last_rebalance_timestamp
    }

    pub fn rebalance_interval(&self) -> u64 {
        self.rebalance_interval
    }

    pub fn proposal_period(&self) -> u64 {
        self.proposal_period
    }

    /// Earliest time a new proposal is accepted.
    pub fn next_proposal_at(&self) -> types::Timestamp {
        self.last_rebalance_timestamp
            .saturating_add(self.rebalance_interval)
    }

    pub fn state(&self) -> types::RebalanceState {
        self.state
    }

    pub fn proposal(&self) -> Option<&Proposal> {
        self.proposal.as_ref()
    }

    pub fn auction(&self) -> Option<&AuctionState> {
        self.auction.as_ref()
    }

    pub fn drawdown(&self) -> Option<&DrawdownState> {
        self.drawdown.as_ref()
    }

    /// Current set quantity the vault has to hold for the outstanding supply.
    pub fn required_custody(&self) -> Result<U256> {
        num::mul_div(
            self.supply,
            self.unit_shares,
            self.natural_unit,
            "required custody",
        )
    }

    pub(crate) fn update_manager(&mut self, instant: types::StateInstant, manager: Address) {
        self.manager = manager;
        self.instant = instant;
    }

    pub(crate) fn update_supply(&mut self, instant: types::StateInstant, supply: U256) {
        self.supply = supply;
        self.instant = instant;
    }

    pub(crate) fn enter_proposal(&mut self, instant: types::StateInstant, proposal: Proposal) {
        self.proposal = Some(proposal);
        self.state = types::RebalanceState::Proposal;
        self.instant = instant;
    }

    pub(crate) fn enter_rebalance(&mut self, instant: types::StateInstant, auction: AuctionState) {
        self.auction = Some(auction);
        self.state = types::RebalanceState::Rebalance;
        self.instant = instant;
    }

    pub(crate) fn auction_mut(&mut self) -> Option<&mut AuctionState> {
        self.auction.as_mut()
    }

    /// Completes the rebalance: the next set becomes the current set.
    pub(crate) fn settle(&mut self, instant: types::StateInstant, next_set: Address, unit_shares: U256) {
        self.current_set = next_set;
        self.unit_shares = unit_shares;
        self.last_rebalance_timestamp = instant.timestamp();
        self.enter_default(instant);
    }

    /// Aborts the rebalance keeping the current set composition.
    pub(crate) fn restore(&mut self, instant: types::StateInstant) {
        self.last_rebalance_timestamp = instant.timestamp();
        self.enter_default(instant);
    }

    pub(crate) fn enter_drawdown(&mut self, instant: types::StateInstant, drawdown: DrawdownState) {
        self.proposal = None;
        self.auction = None;
        self.drawdown = Some(drawdown);
        self.state = types::RebalanceState::Drawdown;
        self.instant = instant;
    }

    fn enter_default(&mut self, instant: types::StateInstant) {
        self.proposal = None;
        self.auction = None;
        self.state = types::RebalanceState::Default;
        self.instant = instant;
    }
}
