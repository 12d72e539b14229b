//! Local testing environment and test utilities.
//!
//! [`TestEnv`] builds an engine on a [`ManualClock`] with three plain tokens, two
//! baskets over them, a registered linear price curve and a rebalancing set issued to
//! two holders, ready to be proposed once the rebalance interval elapses.
//!
//! Amounts are 18-decimal token units, see [`ether`].

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use fastnum::{UD128, udec128};

use crate::{
    Deployment,
    clock::{Clock, ManualClock},
    curve::{CurveKind, PriceParameters},
    error::Result,
    num,
    state::{Engine, RebalancingSetParams},
};

/// Unix timestamp the test clock starts at.
pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

pub const REBALANCE_INTERVAL: u64 = 24 * 60 * 60;
pub const PROPOSAL_PERIOD: u64 = 60 * 60;
pub const TIME_TO_PIVOT: u64 = 24 * 60 * 60;

/// Converts an 18-decimal amount to raw token units.
pub fn ether(value: UD128) -> U256 {
    num::Converter::ether().to_unsigned(value)
}

#[derive(Debug)]
pub struct TestEnv {
    pub clock: ManualClock,
    pub engine: Engine,

    pub manager: Address,
    pub alice: Address,
    pub bob: Address,
    pub bidder: Address,

    /// Component of the current set only.
    pub token_a: Address,
    /// Component of both sets.
    pub token_b: Address,
    /// Component of the next set only.
    pub token_c: Address,

    /// Basket of `token_a` and `token_b`, backing the rebalancing set initially.
    pub current_set: Address,
    /// Basket of `token_b` and `token_c`.
    pub next_set: Address,
    pub curve: Address,
    pub set: Address,
}

impl TestEnv {
    /// Environment with the rebalancing set issued: 15 to alice, 5 to bob.
    pub fn new() -> Self {
        Self::try_new().expect("TestEnv: setup")
    }

    fn try_new() -> Result<Self> {
        let clock = ManualClock::new(GENESIS_TIMESTAMP);
        let deployment = Deployment::local();
        let owner = deployment.owner();
        let mut engine = Engine::new(deployment, Arc::new(clock.clone()));

        let token_a = Address::with_last_byte(0xa1);
        let token_b = Address::with_last_byte(0xb1);
        let token_c = Address::with_last_byte(0xc1);
        let curve = Address::with_last_byte(0xcc);
        engine.register_price_curve(owner, curve, CurveKind::Linear)?;

        let basket_unit = ether(udec128!(0.01));
        let current_set = engine.create_basket(
            vec![token_a, token_b],
            vec![basket_unit, basket_unit],
            basket_unit,
        )?;
        let next_set = engine.create_basket(
            vec![token_b, token_c],
            vec![basket_unit, basket_unit],
            basket_unit,
        )?;

        let manager = Address::with_last_byte(0x10);
        let set = engine.create_rebalancing_set(RebalancingSetParams {
            manager,
            initial_set: current_set,
            unit_shares: ether(udec128!(0.1)),
            natural_unit: ether(udec128!(0.1)),
            rebalance_interval: REBALANCE_INTERVAL,
            proposal_period: PROPOSAL_PERIOD,
        })?;

        let mut env = Self {
            clock,
            engine,
            manager,
            alice: Address::with_last_byte(0x11),
            bob: Address::with_last_byte(0x12),
            bidder: Address::with_last_byte(0x13),
            token_a,
            token_b,
            token_c,
            current_set,
            next_set,
            curve,
            set,
        };
        env.try_issue(env.alice, ether(udec128!(15)))?;
        env.try_issue(env.bob, ether(udec128!(5)))?;
        Ok(env)
    }

    /// Linear auction from 0.5 to 1.5, reaching par halfway to the pivot.
    pub fn price() -> PriceParameters {
        PriceParameters {
            start_price: U256::from(500),
            pivot_price: U256::from(1500),
            time_to_pivot: TIME_TO_PIVOT,
        }
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    pub fn advance(&self, seconds: u64) -> u64 {
        self.clock.advance(seconds)
    }

    /// Mints `amount` of `token` to `holder` and approves the transfer proxy for it.
    pub fn fund(&mut self, holder: Address, token: Address, amount: U256) {
        self.engine.mint(token, holder, amount).expect("TestEnv: mint");
        let allowance = self.engine.ledger().allowance(token, holder);
        self.engine
            .approve(holder, token, allowance + amount)
            .expect("TestEnv: approve");
    }

    /// Issues `quantity` of the rebalancing set to `holder` from freshly minted
    /// components.
    pub fn issue(&mut self, holder: Address, quantity: U256) {
        self.try_issue(holder, quantity).expect("TestEnv: issue");
    }

    fn try_issue(&mut self, holder: Address, quantity: U256) -> Result<()> {
        let rs = self.engine.rebalancing_set(self.set)?;
        let backing = num::mul_div(quantity, rs.unit_shares(), rs.natural_unit(), "backing")?;
        let basket = self.engine.basket(rs.current_set())?.clone();
        for (component, amount) in basket.component_amounts(backing)? {
            self.engine.mint(component, holder, amount)?;
            self.engine.approve(holder, component, amount)?;
        }
        self.engine.issue_basket(holder, basket.address(), backing)?;
        self.engine.approve(holder, basket.address(), backing)?;
        self.engine.issue(holder, self.set, quantity)
    }

    /// Waits out the rebalance interval and proposes moving into the next set.
    pub fn propose(&mut self) {
        let ready_at = self
            .engine
            .rebalancing_set(self.set)
            .expect("TestEnv: set")
            .next_proposal_at();
        if self.now() < ready_at {
            self.clock.set(ready_at);
        }
        self.engine
            .propose(self.manager, self.set, self.next_set, self.curve, Self::price())
            .expect("TestEnv: propose");
    }

    /// Proposes, waits out the proposal period and starts the auction.
    pub fn start_auction(&mut self) {
        self.propose();
        self.advance(PROPOSAL_PERIOD);
        self.engine
            .start_rebalance(self.manager, self.set)
            .expect("TestEnv: start rebalance");
    }

    /// Vault balance of the rebalancing set's current set held for the set.
    pub fn current_set_custody(&self) -> U256 {
        let rs = self.engine.rebalancing_set(self.set).expect("TestEnv: set");
        self.engine.ledger().custody_of(rs.current_set(), self.set)
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
