//! Auction price curves.
//!
//! A curve maps the time elapsed since the auction start to a [`PriceRatio`]:
//! the amount of current set value a bidder is credited per unit of next set
//! value supplied. The ratio grows over time, making bids cheaper for bidders
//! the longer the auction runs.

use alloy::primitives::U256;

use crate::error::ValidationError;

/// Denominator of every price produced by the built-in curves.
pub const PRICE_DIVISOR: u64 = 1000;

/// Fixed-point price as `numerator / denominator`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PriceRatio {
    pub numerator: U256,
    pub denominator: U256,
}

impl PriceRatio {
    pub fn new(numerator: U256, denominator: U256) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
}

impl std::fmt::Display for PriceRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Price parameters fixed by a proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceParameters {
    /// Price numerator at the auction start.
    pub start_price: U256,

    /// Price numerator at the pivot.
    pub pivot_price: U256,

    /// Seconds from the auction start to the pivot.
    pub time_to_pivot: u64,
}

pub trait AuctionPriceCurve {
    /// Denominator the curve expresses prices in.
    fn price_divisor(&self) -> U256;

    /// Checks the parameters can be used with this curve.
    fn validate_parameters(&self, params: &PriceParameters) -> Result<(), ValidationError>;

    /// Price after `elapsed` seconds of auction.
    fn price_at(&self, elapsed: u64, params: &PriceParameters) -> PriceRatio;
}

/// Available curve implementations, registered at addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CurveKind {
    /// Keeps rising at the start-to-pivot rate past the pivot.
    Linear,

    /// Holds the pivot price past the pivot.
    Flat,
}

impl CurveKind {
    fn interpolate(elapsed: u64, params: &PriceParameters) -> U256 {
        if params.time_to_pivot == 0 {
            return params.pivot_price;
        }
        let range = params.pivot_price.saturating_sub(params.start_price);
        let step = range.saturating_mul(U256::from(elapsed)) / U256::from(params.time_to_pivot);
        params.start_price.saturating_add(step)
    }
}

impl AuctionPriceCurve for CurveKind {
    fn price_divisor(&self) -> U256 {
        U256::from(PRICE_DIVISOR)
    }

    fn validate_parameters(&self, params: &PriceParameters) -> Result<(), ValidationError> {
        if params.time_to_pivot == 0 {
            return Err(ValidationError::InvalidPriceParameters(
                "time to pivot must be positive",
            ));
        }
        if params.start_price.is_zero() {
            return Err(ValidationError::InvalidPriceParameters(
                "start price must be positive",
            ));
        }
        if params.start_price > params.pivot_price {
            return Err(ValidationError::InvalidPriceParameters(
                "start price must not exceed pivot price",
            ));
        }
        Ok(())
    }

    fn price_at(&self, elapsed: u64, params: &PriceParameters) -> PriceRatio {
        let numerator = match self {
            CurveKind::Linear => Self::interpolate(elapsed, params),
            CurveKind::Flat if elapsed > params.time_to_pivot => params.pivot_price,
            CurveKind::Flat => Self::interpolate(elapsed, params),
        };
        PriceRatio::new(numerator, self.price_divisor())
    }
}
