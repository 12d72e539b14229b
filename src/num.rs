use alloy::primitives::U256;
use fastnum::{
    bint,
    decimal::{Context, RoundingMode, UnsignedDecimal},
};

use crate::error::RebalanceError;

/// Fixed-point to decimal converter.
#[derive(Clone, Copy, Debug, Default)]
pub struct Converter {
    decimals: i32,
}

impl Converter {
    pub fn new(decimals: u8) -> Self {
        Self {
            decimals: decimals as i32,
        }
    }

    /// Converter of 18-decimal token amounts.
    pub fn ether() -> Self {
        Self::new(18)
    }

    pub fn from_unsigned<const N: usize>(&self, value: U256) -> UnsignedDecimal<N> {
        let unscaled = bint::UInt::<N>::from_le_slice(value.as_le_slice())
            .expect("Converter: U256 -> UInt::<N>");
        UnsignedDecimal::<N>::from_parts(
            unscaled,
            -self.decimals,
            Context::default().with_rounding_mode(RoundingMode::Floor),
        )
    }

    pub fn to_unsigned<const N: usize>(&self, value: UnsignedDecimal<N>) -> U256 {
        let rescaled = value.rescale(self.decimals as i16);
        U256::from_le_slice(rescaled.digits().to_radix_le(256).as_slice())
    }
}

/// `a * b / d` rounded down, failing on overflow or zero divisor.
pub fn mul_div(a: U256, b: U256, d: U256, what: &'static str) -> Result<U256, RebalanceError> {
    a.checked_mul(b)
        .and_then(|p| p.checked_div(d))
        .ok_or(RebalanceError::Overflow(what))
}

pub fn checked_mul(a: U256, b: U256, what: &'static str) -> Result<U256, RebalanceError> {
    a.checked_mul(b).ok_or(RebalanceError::Overflow(what))
}

pub fn checked_add(a: U256, b: U256, what: &'static str) -> Result<U256, RebalanceError> {
    a.checked_add(b).ok_or(RebalanceError::Overflow(what))
}

/// Indicates `value` is an exact multiple of a non-zero `unit`.
pub fn is_multiple(value: U256, unit: U256) -> bool {
    !unit.is_zero() && (value % unit).is_zero()
}

/// Largest multiple of a non-zero `unit` not exceeding `value`.
pub fn round_down(value: U256, unit: U256) -> U256 {
    if unit.is_zero() {
        return U256::ZERO;
    }
    value - value % unit
}

#[cfg(test)]
mod tests {
    use fastnum::udec128;

    use super::*;

    #[test]
    fn test_numeric_converter_from_unsigned() {
        assert_eq!(
            Converter::new(0).from_unsigned(U256::from(1234567890)),
            udec128!(1234567890)
        );
        assert_eq!(
            Converter::new(6).from_unsigned(U256::from(1234567890)),
            udec128!(1234.56789)
        );
        assert_eq!(
            Converter::ether().from_unsigned(U256::from(10_000_000_000_000_000u64)),
            udec128!(0.01)
        );
    }

    #[test]
    fn test_numeric_converter_to_unsigned() {
        assert_eq!(
            Converter::new(6).to_unsigned(udec128!(1234.56789)),
            U256::from(1234567890)
        );
        assert_eq!(
            Converter::ether().to_unsigned(udec128!(0.015)),
            U256::from(15_000_000_000_000_000u64)
        );
        assert_eq!(
            Converter::ether().to_unsigned(udec128!(20)),
            U256::from(20_000_000_000_000_000_000u128)
        );
    }

    #[test]
    fn test_multiples() {
        assert!(is_multiple(U256::from(30), U256::from(10)));
        assert!(!is_multiple(U256::from(35), U256::from(10)));
        assert!(!is_multiple(U256::from(30), U256::ZERO));
        assert_eq!(round_down(U256::from(35), U256::from(10)), U256::from(30));
        assert_eq!(round_down(U256::from(5), U256::from(10)), U256::ZERO);
    }

    #[test]
    fn test_mul_div() {
        assert_eq!(
            mul_div(U256::from(7), U256::from(3), U256::from(2), "test").unwrap(),
            U256::from(10)
        );
        assert_eq!(
            mul_div(U256::MAX, U256::from(2), U256::from(2), "test"),
            Err(RebalanceError::Overflow("test"))
        );
        assert_eq!(
            mul_div(U256::from(1), U256::from(1), U256::ZERO, "test"),
            Err(RebalanceError::Overflow("test"))
        );
    }
}
