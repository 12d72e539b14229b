//! Auction accounting.
//!
//! Pure functions converting baskets, prices and bid quantities into token flows,
//! plus the settlement and drawdown distribution math. Nothing here touches the
//! ledger, so bid previews and real bids share the exact same numbers.

use super::*;
use crate::curve::PriceRatio;

/// Combined view of both baskets normalized per minimum bid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CombinedUnits {
    pub tokens: Vec<Address>,
    pub current_units: Vec<U256>,
    pub next_units: Vec<U256>,
}

/// Smallest bid increment: the larger natural unit scaled by the price divisor, so
/// every bid moves whole natural units of both baskets at any price.
pub fn minimum_bid(current: &Basket, next: &Basket, price_divisor: U256) -> Result<U256> {
    num::checked_mul(
        current.natural_unit().max(next.natural_unit()),
        price_divisor,
        "minimum bid",
    )
}

/// Union of both baskets' components with units per `minimum_bid`, zero-filled for
/// tokens missing from one side.
pub fn combined_units(current: &Basket, next: &Basket, minimum_bid: U256) -> Result<CombinedUnits> {
    let tokens = current
        .components()
        .iter()
        .chain(next.components())
        .copied()
        .unique()
        .collect::<Vec<_>>();
    let per_bid = |basket: &Basket| {
        tokens
            .iter()
            .map(|t| {
                num::mul_div(
                    minimum_bid,
                    basket.unit_of(*t),
                    basket.natural_unit(),
                    "combined units",
                )
            })
            .collect::<Result<Vec<_>>>()
    };
    Ok(CombinedUnits {
        current_units: per_bid(current)?,
        next_units: per_bid(next)?,
        tokens,
    })
}

/// Token flows of a bid for `quantity` current sets at `price`.
///
/// The bidder supplies next set components worth the bid at the given price and
/// receives the current set components; flows of tokens present in both baskets
/// are netted so each token moves in a single direction.
pub fn compute_bid_flows(
    quantity: U256,
    minimum_bid: U256,
    combined: &CombinedUnits,
    price: PriceRatio,
) -> Result<types::TokenFlows> {
    if price.numerator.is_zero() {
        return Err(ValidationError::InvalidPriceParameters("zero bid price").into());
    }
    let multiplier = quantity
        .checked_div(minimum_bid)
        .ok_or(RebalanceError::Overflow("bid multiplier"))?;

    let mut inflow = Vec::with_capacity(combined.tokens.len());
    let mut outflow = Vec::with_capacity(combined.tokens.len());
    for (current, next) in combined.current_units.iter().zip(&combined.next_units) {
        let supplied = num::checked_mul(*next, price.denominator, "bid inflow")?;
        let received = num::checked_mul(*current, price.numerator, "bid outflow")?;
        if supplied > received {
            inflow.push(num::mul_div(
                multiplier,
                supplied - received,
                price.numerator,
                "bid inflow",
            )?);
            outflow.push(U256::ZERO);
        } else {
            inflow.push(U256::ZERO);
            outflow.push(num::mul_div(
                multiplier,
                received - supplied,
                price.numerator,
                "bid outflow",
            )?);
        }
    }

    Ok(types::TokenFlows {
        execution_quantity: quantity,
        tokens: combined.tokens.clone(),
        inflow,
        outflow,
    })
}

/// Quantity the bid executes at, or why it can not execute.
///
/// Without partial fills the quantity has to fit into the remaining sets; with
/// partial fills it is clamped to the largest multiple of the minimum bid that does.
pub fn execution_quantity(
    quantity: U256,
    allow_partial_fill: bool,
    auction: &AuctionState,
) -> Result<U256> {
    if quantity.is_zero() {
        return Err(ValidationError::ZeroQuantity { field: "bid quantity" }.into());
    }
    if !num::is_multiple(quantity, auction.minimum_bid) {
        return Err(ValidationError::NotMultiple {
            field: "bid quantity",
            quantity,
            unit: auction.minimum_bid,
        }
        .into());
    }
    if auction.remaining_current_sets < auction.minimum_bid {
        return Err(PreconditionError::AuctionExhausted {
            remaining: auction.remaining_current_sets,
            minimum_bid: auction.minimum_bid,
        }
        .into());
    }
    if quantity <= auction.remaining_current_sets {
        return Ok(quantity);
    }
    if !allow_partial_fill {
        return Err(PreconditionError::ExceedsRemaining {
            quantity,
            remaining: auction.remaining_current_sets,
        }
        .into());
    }
    Ok(num::round_down(
        auction.remaining_current_sets,
        auction.minimum_bid,
    ))
}

/// Next set issuance at settlement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settlement {
    /// Next set quantity issued into custody.
    pub issue_quantity: U256,

    /// New unit shares, a multiple of the next set natural unit.
    pub unit_shares: U256,
}

/// Splits the next set issuable from custody evenly over the outstanding natural
/// units of the rebalancing set, so that `supply * unit_shares / natural_unit`
/// equals the issued quantity exactly.
pub fn settlement(
    next: &Basket,
    custody_of: impl Fn(Address) -> U256,
    supply: U256,
    natural_unit: U256,
) -> Result<Settlement> {
    let issuable = next.max_issuable(custody_of);
    let naturals = supply
        .checked_div(natural_unit)
        .filter(|n| !n.is_zero())
        .ok_or(PreconditionError::ZeroUnitShares)?;
    let unit_shares = num::round_down(issuable / naturals, next.natural_unit());
    if unit_shares.is_zero() {
        return Err(PreconditionError::ZeroUnitShares.into());
    }
    Ok(Settlement {
        issue_quantity: num::checked_mul(naturals, unit_shares, "issue quantity")?,
        unit_shares,
    })
}

/// Holder's pro-rata share of every token captured at drawdown.
pub fn drawdown_shares(balance: U256, drawdown: &DrawdownState) -> Result<Vec<(Address, U256)>> {
    drawdown
        .tokens
        .iter()
        .zip(&drawdown.balances)
        .map(|(token, custody)| {
            Ok((
                *token,
                num::mul_div(balance, *custody, drawdown.supply, "drawdown share")?,
            ))
        })
        .collect()
}
