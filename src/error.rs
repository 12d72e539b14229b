use alloy::primitives::{Address, U256};

use crate::types::{RebalanceState, Timestamp};

/// Error returned by engine operations.
///
/// Every variant is returned synchronously by the failing operation, which leaves
/// engine state untouched.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RebalanceError {
    #[error("precondition failed: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("insufficient resource: {0}")]
    InsufficientResource(#[from] InsufficientResourceError),

    #[error(
        "settlement incomplete: {remaining} current sets remaining, minimum bid {minimum_bid}"
    )]
    SettlementIncomplete { minimum_bid: U256, remaining: U256 },

    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),
}

/// Operation is not allowed in the current state of the set or for the caller.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionError {
    #[error("set {set} is in {actual} state, required one of {required:?}")]
    WrongState {
        set: Address,
        required: &'static [RebalanceState],
        actual: RebalanceState,
    },

    #[error("caller {caller} is not the manager {manager}")]
    NotManager { caller: Address, manager: Address },

    #[error("caller {caller} is not the deployment owner {owner}")]
    NotOwner { caller: Address, owner: Address },

    #[error("rebalance interval not elapsed: now {now}, ready at {ready_at}")]
    RebalanceIntervalNotElapsed { now: Timestamp, ready_at: Timestamp },

    #[error("proposal period not elapsed: now {now}, ready at {ready_at}")]
    ProposalPeriodNotElapsed { now: Timestamp, ready_at: Timestamp },

    #[error("auction pivot not reached: now {now}, pivot at {pivot}")]
    PivotNotReached { now: Timestamp, pivot: Timestamp },

    #[error("unknown rebalancing set {0}")]
    UnknownRebalancingSet(Address),

    #[error("unknown basket {0}")]
    UnknownBasket(Address),

    #[error("price curve {0} is not registered")]
    UnregisteredCurve(Address),

    #[error("next set {next} is the current set")]
    SameSet { next: Address },

    #[error(
        "natural units are not multiples of each other: current {current}, next {next}"
    )]
    NaturalUnitMismatch { current: U256, next: U256 },

    #[error("bid quantity {quantity} exceeds remaining current sets {remaining}")]
    ExceedsRemaining { quantity: U256, remaining: U256 },

    #[error("remaining current sets {remaining} below minimum bid {minimum_bid}")]
    AuctionExhausted { remaining: U256, minimum_bid: U256 },

    #[error("set {0} has no supply to rebalance")]
    NothingToRebalance(Address),

    #[error("holder {holder} has no balance of {set}")]
    NoBalance { set: Address, holder: Address },

    #[error("settlement would produce zero unit shares")]
    ZeroUnitShares,
}

/// Input is malformed, rejected before any state is touched.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid address for {field}: {value:?} ({reason})")]
    InvalidAddress {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("{field} must not be the zero address")]
    ZeroAddress { field: &'static str },

    #[error("{field} must be positive")]
    ZeroQuantity { field: &'static str },

    #[error("{field} {quantity} is not a multiple of {unit}")]
    NotMultiple {
        field: &'static str,
        quantity: U256,
        unit: U256,
    },

    #[error("invalid price parameters: {0}")]
    InvalidPriceParameters(&'static str),

    #[error("invalid basket: {0}")]
    InvalidBasket(&'static str),

    #[error("invalid rebalancing set parameters: {0}")]
    InvalidSetParameters(&'static str),
}

/// Caller or custody lacks the tokens an operation has to move.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InsufficientResourceError {
    #[error("insufficient balance of {token} held by {owner}: required {required}, available {available}")]
    Balance {
        token: Address,
        owner: Address,
        required: U256,
        available: U256,
    },

    #[error("insufficient allowance of {token} from {owner} to {spender}: required {required}, available {available}")]
    Allowance {
        token: Address,
        owner: Address,
        spender: Address,
        required: U256,
        available: U256,
    },

    #[error("insufficient custody of {token} for {owner}: required {required}, available {available}")]
    Custody {
        token: Address,
        owner: Address,
        required: U256,
        available: U256,
    },
}

pub type Result<T> = std::result::Result<T, RebalanceError>;

impl RebalanceError {
    /// Indicates the error can be fixed by the caller correcting the input.
    pub fn is_validation(&self) -> bool {
        matches!(self, RebalanceError::Validation(_))
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, RebalanceError::Precondition(_))
    }
}
