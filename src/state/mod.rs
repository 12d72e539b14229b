//! Rebalancing set state tracking.
//!
//! [`Engine`] is at the root of the state and owns the token [`Ledger`], known
//! [`Basket`]s, [`RebalancingSet`]s, registered price curves and the append-only
//! event log. All mutations go through engine operations, each applied as a single
//! atomic transition: either every ledger movement and state change of the operation
//! is committed, or none is.
//!
//! Read-only views over the same state (set details, auction snapshots, bid
//! previews, bid history) are provided by the projection methods of [`Engine`].

mod auction;
mod basket;
mod engine;
mod event;
mod ledger;
mod projection;
mod rebalancing;

use crate::{
    error::{PreconditionError, RebalanceError, Result, ValidationError},
    num, types,
};
use alloy::primitives::{Address, U256};
use itertools::Itertools;
use std::collections::HashMap;

// Public re-exports
pub use auction::*;
pub use basket::*;
pub use engine::*;
pub use event::*;
pub use ledger::*;
pub use projection::*;
pub use rebalancing::*;
