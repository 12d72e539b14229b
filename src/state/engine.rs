use std::sync::Arc;

use tracing::{debug, info, warn};

use super::*;
use crate::{
    Deployment,
    abi::{basket as basket_abi, rebalancing as rebalancing_abi},
    clock::Clock,
    curve::{AuctionPriceCurve, CurveKind, PriceParameters},
    types::RebalanceState,
};

const DEFAULT: &[RebalanceState] = &[RebalanceState::Default];
const PROPOSABLE: &[RebalanceState] = &[RebalanceState::Default, RebalanceState::Proposal];
const PROPOSAL: &[RebalanceState] = &[RebalanceState::Proposal];
const REBALANCE: &[RebalanceState] = &[RebalanceState::Rebalance];
const DRAWDOWN: &[RebalanceState] = &[RebalanceState::Drawdown];

/// Rebalancing set protocol engine.
///
/// Every public mutating method is one operation: it reads the clock once, runs
/// against a working copy of the world and commits it together with the emitted
/// events only if the operation succeeds.
#[derive(Clone, Debug)]
pub struct Engine {
    deployment: Deployment,
    clock: Arc<dyn Clock>,
    instant: types::StateInstant,
    world: World,
    log: Vec<LoggedEvent>,
}

/// Everything an operation can mutate.
#[derive(Clone, Debug, Default)]
pub(crate) struct World {
    pub(crate) ledger: Ledger,
    pub(crate) baskets: HashMap<Address, Basket>,
    pub(crate) sets: HashMap<Address, RebalancingSet>,
    pub(crate) curves: HashMap<Address, CurveKind>,
    nonce: u64,
}

/// Working copy of the world for a single operation.
struct Txn<'d> {
    deployment: &'d Deployment,
    instant: types::StateInstant,
    world: World,
    events: Vec<(Address, RebalanceEvent)>,
}

impl Engine {
    pub fn new(deployment: Deployment, clock: Arc<dyn Clock>) -> Self {
        let instant = types::StateInstant::new(0, clock.now());
        Self {
            deployment,
            clock,
            instant,
            world: World::default(),
            log: vec![],
        }
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    /// Instant of the last committed operation.
    pub fn instant(&self) -> types::StateInstant {
        self.instant
    }

    /// Current reading of the engine clock.
    pub fn now(&self) -> types::Timestamp {
        self.clock.now()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.world.ledger
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    /// Whole event log in commit order.
    pub fn log(&self) -> &[LoggedEvent] {
        &self.log
    }

    /// Registers a price curve proposals can refer to. Deployment owner only.
    pub fn register_price_curve(
        &mut self,
        caller: Address,
        curve: Address,
        kind: CurveKind,
    ) -> Result<()> {
        self.transact("register_price_curve", |tx| {
            if caller != tx.deployment.owner() {
                return Err(PreconditionError::NotOwner {
                    caller,
                    owner: tx.deployment.owner(),
                }
                .into());
            }
            if curve.is_zero() {
                return Err(ValidationError::ZeroAddress { field: "price curve" }.into());
            }
            tx.world.curves.insert(curve, kind);
            info!(%curve, ?kind, "price curve registered");
            Ok(())
        })
    }

    /// Mints plain tokens to `to`. Set tokens are only created through issuance.
    pub fn mint(&mut self, token: Address, to: Address, amount: U256) -> Result<()> {
        self.transact("mint", |tx| {
            if token.is_zero() || to.is_zero() {
                return Err(ValidationError::ZeroAddress { field: "mint" }.into());
            }
            if tx.world.baskets.contains_key(&token) || tx.world.sets.contains_key(&token) {
                return Err(
                    ValidationError::InvalidBasket("set tokens are only minted by issuance").into(),
                );
            }
            tx.world.ledger.mint(token, to, amount)
        })
    }

    /// Sets the allowance of the transfer proxy over the caller's `token`.
    pub fn approve(&mut self, caller: Address, token: Address, amount: U256) -> Result<()> {
        self.transact("approve", |tx| {
            if token.is_zero() || caller.is_zero() {
                return Err(ValidationError::ZeroAddress { field: "approve" }.into());
            }
            tx.world.ledger.approve(token, caller, amount);
            Ok(())
        })
    }

    /// Moves the caller's vault balance of `token` into their wallet.
    pub fn withdraw(&mut self, caller: Address, token: Address, amount: U256) -> Result<()> {
        self.transact("withdraw", |tx| tx.world.ledger.withdraw(token, caller, amount))
    }

    /// Creates a plain basket and returns its address.
    pub fn create_basket(
        &mut self,
        components: Vec<Address>,
        units: Vec<U256>,
        natural_unit: U256,
    ) -> Result<Address> {
        self.transact("create_basket", |tx| {
            let address = tx.next_address();
            let basket = Basket::new(address, components, units, natural_unit)?;
            tx.emit(
                address,
                RebalanceEvent::BasketCreated(basket_abi::SetTokenCreated {
                    setToken: address,
                    components: basket.components().to_vec(),
                    units: basket.units().to_vec(),
                    naturalUnit: basket.natural_unit(),
                }),
            );
            tx.world.baskets.insert(address, basket);
            Ok(address)
        })
    }

    /// Issues `quantity` of a basket from the caller's approved components.
    pub fn issue_basket(&mut self, caller: Address, basket: Address, quantity: U256) -> Result<()> {
        self.transact("issue_basket", |tx| {
            let basket = tx.basket(basket)?.clone();
            let proxy = tx.deployment.transfer_proxy();
            for (component, amount) in basket.component_amounts(quantity)? {
                tx.world
                    .ledger
                    .deposit(component, caller, basket.address(), proxy, amount)?;
            }
            tx.world.ledger.mint(basket.address(), caller, quantity)
        })
    }

    /// Redeems `quantity` of a basket from the caller's wallet back into components.
    pub fn redeem_basket(&mut self, caller: Address, basket: Address, quantity: U256) -> Result<()> {
        self.transact("redeem_basket", |tx| {
            let basket = tx.basket(basket)?.clone();
            let amounts = basket.component_amounts(quantity)?;
            tx.world.ledger.burn(basket.address(), caller, quantity)?;
            for (component, amount) in amounts {
                tx.world
                    .ledger
                    .withdraw_to(component, basket.address(), caller, amount)?;
            }
            Ok(())
        })
    }

    /// Creates a rebalancing set backed by `params.initial_set` and returns its address.
    pub fn create_rebalancing_set(&mut self, params: RebalancingSetParams) -> Result<Address> {
        self.transact("create_rebalancing_set", |tx| {
            let limits = tx.deployment.limits();
            if params.manager.is_zero() {
                return Err(ValidationError::ZeroAddress { field: "manager" }.into());
            }
            let initial = tx.basket(params.initial_set)?;
            if params.natural_unit.is_zero() {
                return Err(ValidationError::ZeroQuantity {
                    field: "natural unit",
                }
                .into());
            }
            if params.unit_shares.is_zero() {
                return Err(ValidationError::ZeroQuantity {
                    field: "unit shares",
                }
                .into());
            }
            if !num::is_multiple(params.unit_shares, initial.natural_unit()) {
                return Err(ValidationError::NotMultiple {
                    field: "unit shares",
                    quantity: params.unit_shares,
                    unit: initial.natural_unit(),
                }
                .into());
            }
            if params.rebalance_interval < limits.min_rebalance_interval {
                return Err(ValidationError::InvalidSetParameters(
                    "rebalance interval below factory minimum",
                )
                .into());
            }
            if params.proposal_period < limits.min_proposal_period {
                return Err(ValidationError::InvalidSetParameters(
                    "proposal period below factory minimum",
                )
                .into());
            }

            let address = tx.next_address();
            let set = RebalancingSet::new(tx.instant, address, &params);
            tx.emit(
                address,
                RebalanceEvent::RebalancingSetCreated(rebalancing_abi::RebalancingSetCreated {
                    rebalancingSet: address,
                    manager: params.manager,
                    initialSet: params.initial_set,
                    unitShares: params.unit_shares,
                    naturalUnit: params.natural_unit,
                }),
            );
            info!(set = %address, manager = %params.manager, "rebalancing set created");
            tx.world.sets.insert(address, set);
            Ok(address)
        })
    }

    /// Issues `quantity` of the rebalancing set, taking the backing current set from
    /// the caller's approved wallet balance.
    pub fn issue(&mut self, caller: Address, set: Address, quantity: U256) -> Result<()> {
        self.transact("issue", |tx| {
            let mut rs = tx.set(set, DEFAULT)?;
            check_set_quantity(&rs, quantity)?;
            let backing = num::mul_div(
                quantity,
                rs.unit_shares(),
                rs.natural_unit(),
                "issue backing",
            )?;
            let proxy = tx.deployment.transfer_proxy();
            tx.world
                .ledger
                .deposit(rs.current_set(), caller, set, proxy, backing)?;
            tx.world.ledger.mint(set, caller, quantity)?;
            let supply = num::checked_add(rs.supply(), quantity, "supply")?;
            rs.update_supply(tx.instant, supply);
            tx.emit(
                set,
                RebalanceEvent::Issued(rebalancing_abi::Issued {
                    issuer: caller,
                    quantity,
                }),
            );
            tx.put(rs);
            Ok(())
        })
    }

    /// Redeems `quantity` of the rebalancing set into the caller's wallet. Allowed
    /// during the proposal period so holders can exit before the auction.
    pub fn redeem(&mut self, caller: Address, set: Address, quantity: U256) -> Result<()> {
        self.transact("redeem", |tx| {
            let mut rs = tx.set(set, PROPOSABLE)?;
            check_set_quantity(&rs, quantity)?;
            let backing = num::mul_div(
                quantity,
                rs.unit_shares(),
                rs.natural_unit(),
                "redeem backing",
            )?;
            tx.world.ledger.burn(set, caller, quantity)?;
            tx.world
                .ledger
                .withdraw_to(rs.current_set(), set, caller, backing)?;
            rs.update_supply(tx.instant, rs.supply().saturating_sub(quantity));
            tx.emit(
                set,
                RebalanceEvent::Redeemed(rebalancing_abi::Redeemed {
                    redeemer: caller,
                    quantity,
                }),
            );
            tx.put(rs);
            Ok(())
        })
    }

    /// Proposes replacing the current set with `next_set` through an auction priced by
    /// the registered `price_curve`.
    pub fn propose(
        &mut self,
        caller: Address,
        set: Address,
        next_set: Address,
        price_curve: Address,
        price: PriceParameters,
    ) -> Result<()> {
        self.transact("propose", |tx| {
            let mut rs = tx.set(set, PROPOSABLE)?;
            check_manager(&rs, caller)?;
            let now = tx.instant.timestamp();
            if now < rs.next_proposal_at() {
                return Err(PreconditionError::RebalanceIntervalNotElapsed {
                    now,
                    ready_at: rs.next_proposal_at(),
                }
                .into());
            }
            let next = tx.basket(next_set)?;
            if next_set == rs.current_set() {
                return Err(PreconditionError::SameSet { next: next_set }.into());
            }
            let current = tx.basket(rs.current_set())?;
            if !current.natural_units_compatible(next) {
                return Err(PreconditionError::NaturalUnitMismatch {
                    current: current.natural_unit(),
                    next: next.natural_unit(),
                }
                .into());
            }
            let curve = tx.curve(price_curve)?;
            curve.validate_parameters(&price)?;
            let limits = tx.deployment.limits();
            if price.time_to_pivot < limits.min_time_to_pivot
                || price.time_to_pivot > limits.max_time_to_pivot
            {
                return Err(ValidationError::InvalidPriceParameters(
                    "time to pivot outside factory limits",
                )
                .into());
            }

            let proposal_period_end = now.saturating_add(rs.proposal_period());
            rs.enter_proposal(
                tx.instant,
                Proposal {
                    next_set,
                    proposal_start_time: now,
                    price_curve,
                    price,
                },
            );
            tx.emit(
                set,
                RebalanceEvent::Proposed(rebalancing_abi::RebalanceProposed {
                    nextSet: next_set,
                    auctionLibrary: price_curve,
                    proposalPeriodEndTime: U256::from(proposal_period_end),
                }),
            );
            info!(%set, %next_set, %price_curve, proposal_period_end, "rebalance proposed");
            tx.put(rs);
            Ok(())
        })
    }

    /// Starts the auction: redeems the current set held in custody into components
    /// and opens bidding.
    pub fn start_rebalance(&mut self, caller: Address, set: Address) -> Result<()> {
        self.transact("start_rebalance", |tx| {
            let mut rs = tx.set(set, PROPOSAL)?;
            check_manager(&rs, caller)?;
            let proposal = rs
                .proposal()
                .cloned()
                .ok_or(PreconditionError::WrongState {
                    set,
                    required: PROPOSAL,
                    actual: rs.state(),
                })?;
            let now = tx.instant.timestamp();
            let ready_at = proposal
                .proposal_start_time
                .saturating_add(rs.proposal_period());
            if now < ready_at {
                return Err(PreconditionError::ProposalPeriodNotElapsed { now, ready_at }.into());
            }
            if rs.supply().is_zero() {
                return Err(PreconditionError::NothingToRebalance(set).into());
            }

            let current = tx.basket(rs.current_set())?.clone();
            let next = tx.basket(proposal.next_set)?.clone();
            let curve = tx.curve(proposal.price_curve)?;
            let minimum_bid = minimum_bid(&current, &next, curve.price_divisor())?;
            let combined = combined_units(&current, &next, minimum_bid)?;

            // Current set custody becomes components held by the set
            let starting = rs.required_custody()?;
            tx.world
                .ledger
                .burn_custody(current.address(), set, starting)?;
            for (component, amount) in current.component_amounts(starting)? {
                tx.world
                    .ledger
                    .transfer_custody(component, current.address(), set, amount)?;
            }

            rs.enter_rebalance(
                tx.instant,
                AuctionState {
                    combined_token_array: combined.tokens,
                    combined_current_units: combined.current_units,
                    combined_next_units: combined.next_units,
                    minimum_bid,
                    starting_current_sets: starting,
                    remaining_current_sets: starting,
                    auction_start_timestamp: now,
                    pivot_timestamp: now.saturating_add(proposal.price.time_to_pivot),
                },
            );
            tx.emit(
                set,
                RebalanceEvent::Started(rebalancing_abi::RebalanceStarted {
                    oldSet: current.address(),
                    newSet: next.address(),
                }),
            );
            info!(%set, %starting, %minimum_bid, "rebalance auction started");
            tx.put(rs);
            Ok(())
        })
    }

    /// Bids for `quantity` current sets at the current auction price.
    ///
    /// The bidder supplies the inflows from approved wallet balances and receives the
    /// outflows in their wallet when `should_withdraw` is set, or in the vault
    /// otherwise. Returns the executed flows.
    pub fn bid(
        &mut self,
        caller: Address,
        set: Address,
        quantity: U256,
        allow_partial_fill: bool,
        should_withdraw: bool,
    ) -> Result<types::TokenFlows> {
        self.transact("bid", |tx| {
            let mut rs = tx.set(set, REBALANCE)?;
            let flows = quote_bid(
                &tx.world,
                &rs,
                quantity,
                allow_partial_fill,
                tx.instant.timestamp(),
            )?;

            let proxy = tx.deployment.transfer_proxy();
            for (token, amount) in flows.tokens.iter().zip(&flows.inflow) {
                tx.world
                    .ledger
                    .deposit(*token, caller, set, proxy, *amount)?;
            }
            for (token, amount) in flows.tokens.iter().zip(&flows.outflow) {
                if should_withdraw {
                    tx.world.ledger.withdraw_to(*token, set, caller, *amount)?;
                } else {
                    tx.world
                        .ledger
                        .transfer_custody(*token, set, caller, *amount)?;
                }
            }

            let auction = rs.auction_mut().ok_or(PreconditionError::WrongState {
                set,
                required: REBALANCE,
                actual: RebalanceState::Rebalance,
            })?;
            auction.remaining_current_sets -= flows.execution_quantity;
            let remaining = auction.remaining_current_sets;

            tx.emit(
                set,
                RebalanceEvent::BidPlaced(rebalancing_abi::BidPlaced {
                    rebalancingSetToken: set,
                    bidder: caller,
                    executionQuantity: flows.execution_quantity,
                    combinedTokenAddresses: flows.tokens.clone(),
                    inflowTokenUnits: flows.inflow.clone(),
                    outflowTokenUnits: flows.outflow.clone(),
                }),
            );
            debug!(
                %set,
                bidder = %caller,
                quantity = %flows.execution_quantity,
                %remaining,
                ?flows,
                "bid placed"
            );
            tx.put(rs);
            Ok(flows)
        })
    }

    /// Completes an exhausted auction: issues the next set from custody and
    /// recomputes unit shares.
    pub fn settle_rebalance(&mut self, _caller: Address, set: Address) -> Result<()> {
        self.transact("settle_rebalance", |tx| {
            let mut rs = tx.set(set, REBALANCE)?;
            let auction = tx.auction(&rs)?;
            if auction.remaining_current_sets >= auction.minimum_bid {
                return Err(RebalanceError::SettlementIncomplete {
                    minimum_bid: auction.minimum_bid,
                    remaining: auction.remaining_current_sets,
                });
            }
            let next_address = rs.next_set().ok_or(PreconditionError::WrongState {
                set,
                required: REBALANCE,
                actual: rs.state(),
            })?;
            let next = tx.basket(next_address)?.clone();

            let ledger = &tx.world.ledger;
            let settled = settlement(
                &next,
                |token| ledger.custody_of(token, set),
                rs.supply(),
                rs.natural_unit(),
            )?;
            for (component, amount) in next.component_amounts(settled.issue_quantity)? {
                tx.world
                    .ledger
                    .transfer_custody(component, set, next.address(), amount)?;
            }
            tx.world
                .ledger
                .mint_custody(next.address(), set, settled.issue_quantity)?;

            rs.settle(tx.instant, next.address(), settled.unit_shares);
            tx.emit(
                set,
                RebalanceEvent::Settled(rebalancing_abi::RebalanceSettled {
                    newSet: next.address(),
                    issueQuantity: settled.issue_quantity,
                    unitShares: settled.unit_shares,
                }),
            );
            info!(
                %set,
                new_set = %next.address(),
                issued = %settled.issue_quantity,
                unit_shares = %settled.unit_shares,
                "rebalance settled"
            );
            tx.put(rs);
            Ok(())
        })
    }

    /// Ends an auction that passed its pivot. Without any bid the current set is
    /// restored, after partial fills the set enters Drawdown. Auctions with less than
    /// a minimum bid remaining can only be settled.
    pub fn end_failed_auction(&mut self, _caller: Address, set: Address) -> Result<()> {
        self.transact("end_failed_auction", |tx| {
            let mut rs = tx.set(set, REBALANCE)?;
            let auction = tx.auction(&rs)?.clone();
            let now = tx.instant.timestamp();
            if now < auction.pivot_timestamp {
                return Err(PreconditionError::PivotNotReached {
                    now,
                    pivot: auction.pivot_timestamp,
                }
                .into());
            }
            // Less than a minimum bid left means the auction is done, settle instead
            if auction.remaining_current_sets < auction.minimum_bid {
                return Err(PreconditionError::AuctionExhausted {
                    remaining: auction.remaining_current_sets,
                    minimum_bid: auction.minimum_bid,
                }
                .into());
            }

            let drawdown = auction.remaining_current_sets < auction.starting_current_sets;
            if drawdown {
                let ledger = &tx.world.ledger;
                let balances = auction
                    .combined_token_array
                    .iter()
                    .map(|token| ledger.custody_of(*token, set))
                    .collect();
                rs.enter_drawdown(
                    tx.instant,
                    DrawdownState {
                        tokens: auction.combined_token_array.clone(),
                        balances,
                        supply: rs.supply(),
                        failed_at: now,
                    },
                );
                warn!(%set, remaining = %auction.remaining_current_sets, "auction failed, entering drawdown");
            } else {
                // No bids: components go back into the current set
                let current = tx.basket(rs.current_set())?.clone();
                for (component, amount) in
                    current.component_amounts(auction.starting_current_sets)?
                {
                    tx.world
                        .ledger
                        .transfer_custody(component, set, current.address(), amount)?;
                }
                tx.world.ledger.mint_custody(
                    current.address(),
                    set,
                    auction.starting_current_sets,
                )?;
                rs.restore(tx.instant);
                warn!(%set, "auction failed without bids, current set restored");
            }

            tx.emit(
                set,
                RebalanceEvent::AuctionFailed(rebalancing_abi::AuctionFailed {
                    remainingCurrentSets: auction.remaining_current_sets,
                    drawdown,
                }),
            );
            tx.put(rs);
            Ok(())
        })
    }

    /// Burns the caller's whole balance of a set in Drawdown and pays out their
    /// pro-rata share of every token in custody.
    pub fn redeem_from_failed_rebalance(&mut self, caller: Address, set: Address) -> Result<()> {
        self.transact("redeem_from_failed_rebalance", |tx| {
            let mut rs = tx.set(set, DRAWDOWN)?;
            let balance = tx.world.ledger.balance_of(set, caller);
            if balance.is_zero() {
                return Err(PreconditionError::NoBalance {
                    set,
                    holder: caller,
                }
                .into());
            }
            let drawdown = rs.drawdown().ok_or(PreconditionError::WrongState {
                set,
                required: DRAWDOWN,
                actual: rs.state(),
            })?;
            let shares = drawdown_shares(balance, drawdown)?;

            tx.world.ledger.burn(set, caller, balance)?;
            for (token, amount) in shares {
                tx.world.ledger.withdraw_to(token, set, caller, amount)?;
            }
            rs.update_supply(tx.instant, rs.supply().saturating_sub(balance));
            tx.emit(
                set,
                RebalanceEvent::DrawdownRedeemed(rebalancing_abi::RedeemedFromFailedRebalance {
                    holder: caller,
                    quantity: balance,
                }),
            );
            info!(%set, holder = %caller, quantity = %balance, "redeemed from failed rebalance");
            tx.put(rs);
            Ok(())
        })
    }

    /// Hands the manager role over to `new_manager`.
    pub fn update_manager(
        &mut self,
        caller: Address,
        set: Address,
        new_manager: Address,
    ) -> Result<()> {
        self.transact("update_manager", |tx| {
            let mut rs = tx.any_set(set)?;
            check_manager(&rs, caller)?;
            if new_manager.is_zero() {
                return Err(ValidationError::ZeroAddress { field: "manager" }.into());
            }
            rs.update_manager(tx.instant, new_manager);
            tx.emit(
                set,
                RebalanceEvent::ManagerUpdated(rebalancing_abi::NewManagerAdded {
                    newManager: new_manager,
                    oldManager: caller,
                }),
            );
            info!(%set, old_manager = %caller, %new_manager, "manager updated");
            tx.put(rs);
            Ok(())
        })
    }

    /// Log entries committed after the first `from` entries.
    pub fn events_since(&self, from: usize) -> &[LoggedEvent] {
        self.log.get(from..).unwrap_or_default()
    }

    fn transact<T>(
        &mut self,
        operation: &'static str,
        f: impl FnOnce(&mut Txn<'_>) -> Result<T>,
    ) -> Result<T> {
        let instant = types::StateInstant::new(self.instant.sequence() + 1, self.clock.now());
        let mut tx = Txn {
            deployment: &self.deployment,
            instant,
            world: self.world.clone(),
            events: vec![],
        };
        match f(&mut tx) {
            Ok(value) => {
                let Txn { world, events, .. } = tx;
                let base = self.log.len() as u64;
                self.log.extend(
                    events
                        .into_iter()
                        .enumerate()
                        .map(|(i, (emitter, event))| {
                            LoggedEvent::new(instant, base + i as u64, emitter, event)
                        }),
                );
                self.world = world;
                self.instant = instant;
                debug!(operation, sequence = instant.sequence(), "operation committed");
                Ok(value)
            }
            Err(err) => {
                debug!(operation, %err, "operation rejected");
                Err(err)
            }
        }
    }
}

impl World {
    pub(crate) fn set(&self, set: Address) -> Result<&RebalancingSet> {
        self.sets
            .get(&set)
            .ok_or(PreconditionError::UnknownRebalancingSet(set).into())
    }

    pub(crate) fn basket(&self, basket: Address) -> Result<&Basket> {
        self.baskets
            .get(&basket)
            .ok_or(PreconditionError::UnknownBasket(basket).into())
    }

    pub(crate) fn curve(&self, curve: Address) -> Result<CurveKind> {
        self.curves
            .get(&curve)
            .copied()
            .ok_or(PreconditionError::UnregisteredCurve(curve).into())
    }
}

impl Txn<'_> {
    fn next_address(&mut self) -> Address {
        let address = self.deployment.factory().create(self.world.nonce);
        self.world.nonce += 1;
        address
    }

    fn emit(&mut self, emitter: Address, event: RebalanceEvent) {
        self.events.push((emitter, event));
    }

    fn basket(&self, basket: Address) -> Result<&Basket> {
        self.world.basket(basket)
    }

    fn curve(&self, curve: Address) -> Result<CurveKind> {
        self.world.curve(curve)
    }

    /// Working copy of a set required to be in one of the given states.
    fn set(&self, set: Address, required: &'static [RebalanceState]) -> Result<RebalancingSet> {
        let rs = self.any_set(set)?;
        if !required.contains(&rs.state()) {
            return Err(PreconditionError::WrongState {
                set,
                required,
                actual: rs.state(),
            }
            .into());
        }
        Ok(rs)
    }

    fn any_set(&self, set: Address) -> Result<RebalancingSet> {
        self.world.set(set).cloned()
    }

    fn auction<'a>(&self, rs: &'a RebalancingSet) -> Result<&'a AuctionState> {
        rs.auction().ok_or(
            PreconditionError::WrongState {
                set: rs.address(),
                required: REBALANCE,
                actual: rs.state(),
            }
            .into(),
        )
    }

    fn put(&mut self, rs: RebalancingSet) {
        self.world.sets.insert(rs.address(), rs);
    }
}

/// Flows of a bid on `rs` at time `now`, without touching any state.
pub(crate) fn quote_bid(
    world: &World,
    rs: &RebalancingSet,
    quantity: U256,
    allow_partial_fill: bool,
    now: types::Timestamp,
) -> Result<types::TokenFlows> {
    let (Some(auction), Some(proposal)) = (rs.auction(), rs.proposal()) else {
        return Err(PreconditionError::WrongState {
            set: rs.address(),
            required: REBALANCE,
            actual: rs.state(),
        }
        .into());
    };
    let execution = execution_quantity(quantity, allow_partial_fill, auction)?;
    let curve = world.curve(proposal.price_curve)?;
    let price = curve.price_at(
        now.saturating_sub(auction.auction_start_timestamp),
        &proposal.price,
    );
    compute_bid_flows(
        execution,
        auction.minimum_bid,
        &CombinedUnits {
            tokens: auction.combined_token_array.clone(),
            current_units: auction.combined_current_units.clone(),
            next_units: auction.combined_next_units.clone(),
        },
        price,
    )
}

fn check_manager(rs: &RebalancingSet, caller: Address) -> Result<()> {
    if caller != rs.manager() {
        return Err(PreconditionError::NotManager {
            caller,
            manager: rs.manager(),
        }
        .into());
    }
    Ok(())
}

fn check_set_quantity(rs: &RebalancingSet, quantity: U256) -> Result<()> {
    if quantity.is_zero() {
        return Err(ValidationError::ZeroQuantity { field: "quantity" }.into());
    }
    if !num::is_multiple(quantity, rs.natural_unit()) {
        return Err(ValidationError::NotMultiple {
            field: "quantity",
            quantity,
            unit: rs.natural_unit(),
        }
        .into());
    }
    Ok(())
}
