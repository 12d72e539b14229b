//! Client boundary of the engine.
//!
//! [`RebalancingSetClient`] accepts addresses as strings the way they arrive from
//! external callers and validates them before the engine lock is taken, so malformed
//! input never reaches an operation.

use alloy::primitives::{Address, U256};

use crate::{
    curve::PriceParameters,
    error::{Result, ValidationError},
    shared::SharedEngine,
    state::{BidRecord, ProposalDetails, RebalanceDetails},
    types::{RebalanceState, TokenFlows},
};

/// Parses a `0x`-prefixed 40 hex digit address. Mixed-case input must carry a valid
/// EIP-55 checksum.
pub fn parse_address(field: &'static str, value: &str) -> Result<Address> {
    let invalid = |reason| ValidationError::InvalidAddress {
        field,
        value: value.to_string(),
        reason,
    };
    let Some(digits) = value.strip_prefix("0x") else {
        return Err(invalid("missing 0x prefix").into());
    };
    if digits.len() != 40 {
        return Err(invalid("expected 40 hex digits").into());
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("non-hex character").into());
    }
    let mixed_case = digits.chars().any(|c| c.is_ascii_lowercase())
        && digits.chars().any(|c| c.is_ascii_uppercase());
    if mixed_case {
        return Address::parse_checksummed(value, None)
            .map_err(|_| invalid("invalid checksum").into());
    }
    value
        .parse()
        .map_err(|_| invalid("invalid hex").into())
}

/// Operations of a single caller against a shared engine.
#[derive(Clone, Debug)]
pub struct RebalancingSetClient {
    engine: SharedEngine,
    caller: Address,
}

impl RebalancingSetClient {
    pub fn new(engine: SharedEngine, caller: &str) -> Result<Self> {
        Ok(Self {
            engine,
            caller: parse_address("caller", caller)?,
        })
    }

    pub fn caller(&self) -> Address {
        self.caller
    }

    pub fn engine(&self) -> &SharedEngine {
        &self.engine
    }

    pub async fn propose(
        &self,
        set: &str,
        next_set: &str,
        price_curve: &str,
        price: PriceParameters,
    ) -> Result<()> {
        let set = parse_address("set", set)?;
        let next_set = parse_address("next set", next_set)?;
        let price_curve = parse_address("price curve", price_curve)?;
        let caller = self.caller;
        self.engine
            .execute(|engine| engine.propose(caller, set, next_set, price_curve, price))
            .await
            .map(|(value, _)| value)
    }

    pub async fn start_rebalance(&self, set: &str) -> Result<()> {
        let set = parse_address("set", set)?;
        let caller = self.caller;
        self.engine
            .execute(|engine| engine.start_rebalance(caller, set))
            .await
            .map(|(value, _)| value)
    }

    /// Places a bid, returning the executed flows without idle tokens.
    pub async fn bid(
        &self,
        set: &str,
        quantity: U256,
        allow_partial_fill: bool,
        should_withdraw: bool,
    ) -> Result<TokenFlows> {
        let set = parse_address("set", set)?;
        let caller = self.caller;
        self.engine
            .execute(|engine| {
                engine.bid(caller, set, quantity, allow_partial_fill, should_withdraw)
            })
            .await
            .map(|(flows, _)| flows.reported())
    }

    pub async fn settle_rebalance(&self, set: &str) -> Result<()> {
        let set = parse_address("set", set)?;
        let caller = self.caller;
        self.engine
            .execute(|engine| engine.settle_rebalance(caller, set))
            .await
            .map(|(value, _)| value)
    }

    pub async fn end_failed_auction(&self, set: &str) -> Result<()> {
        let set = parse_address("set", set)?;
        let caller = self.caller;
        self.engine
            .execute(|engine| engine.end_failed_auction(caller, set))
            .await
            .map(|(value, _)| value)
    }

    pub async fn redeem_from_failed_rebalance(&self, set: &str) -> Result<()> {
        let set = parse_address("set", set)?;
        let caller = self.caller;
        self.engine
            .execute(|engine| engine.redeem_from_failed_rebalance(caller, set))
            .await
            .map(|(value, _)| value)
    }

    pub async fn update_manager(&self, set: &str, new_manager: &str) -> Result<()> {
        let set = parse_address("set", set)?;
        let new_manager = parse_address("new manager", new_manager)?;
        let caller = self.caller;
        self.engine
            .execute(|engine| engine.update_manager(caller, set, new_manager))
            .await
            .map(|(value, _)| value)
    }

    pub async fn rebalance_state(&self, set: &str) -> Result<RebalanceState> {
        let set = parse_address("set", set)?;
        self.engine.read().await.rebalance_state(set)
    }

    pub async fn proposal_details(&self, set: &str) -> Result<ProposalDetails> {
        let set = parse_address("set", set)?;
        self.engine.read().await.proposal_details(set)
    }

    pub async fn rebalance_details(&self, set: &str) -> Result<RebalanceDetails> {
        let set = parse_address("set", set)?;
        self.engine.read().await.rebalance_details(set)
    }

    /// Previews a bid without idle tokens.
    pub async fn bid_price(&self, set: &str, quantity: U256) -> Result<TokenFlows> {
        let set = parse_address("set", set)?;
        Ok(self.engine.read().await.bid_price(set, quantity)?.reported())
    }

    pub async fn bid_history(&self, set: &str) -> Result<Vec<BidRecord>> {
        let set = parse_address("set", set)?;
        Ok(self.engine.read().await.bid_history(set))
    }
}
