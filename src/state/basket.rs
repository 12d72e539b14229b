use super::*;
use crate::error::ValidationError;

/// Plain set token: a fixed basket of component tokens.
///
/// `units[i]` of `components[i]` back every `natural_unit` of the basket, so any
/// issued or redeemed quantity has to be a multiple of the natural unit.
#[derive(Clone, derive_more::Debug, PartialEq, Eq)]
pub struct Basket {
    address: Address,
    components: Vec<Address>,
    units: Vec<U256>,
    #[debug("{natural_unit}")]
    natural_unit: U256,
}

impl Basket {
    pub(crate) fn new(
        address: Address,
        components: Vec<Address>,
        units: Vec<U256>,
        natural_unit: U256,
    ) -> Result<Self> {
        if components.is_empty() {
            return Err(ValidationError::InvalidBasket("no components").into());
        }
        if components.len() != units.len() {
            return Err(ValidationError::InvalidBasket("components and units differ in length").into());
        }
        if components.iter().any(|c| c.is_zero()) {
            return Err(ValidationError::ZeroAddress { field: "component" }.into());
        }
        if components.iter().duplicates().next().is_some() {
            return Err(ValidationError::InvalidBasket("duplicate component").into());
        }
        if units.iter().any(|u| u.is_zero()) {
            return Err(ValidationError::ZeroQuantity { field: "component unit" }.into());
        }
        if natural_unit.is_zero() {
            return Err(ValidationError::ZeroQuantity {
                field: "natural unit",
            }
            .into());
        }
        Ok(Self {
            address,
            components,
            units,
            natural_unit,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn components(&self) -> &[Address] {
        &self.components
    }

    /// Component amounts backing one natural unit of the basket.
    pub fn units(&self) -> &[U256] {
        &self.units
    }

    pub fn natural_unit(&self) -> U256 {
        self.natural_unit
    }

    /// Unit of the given component, zero if the token is not a component.
    pub fn unit_of(&self, token: Address) -> U256 {
        self.components
            .iter()
            .position(|c| *c == token)
            .map(|i| self.units[i])
            .unwrap_or_default()
    }

    /// Component amounts required to issue (or released by redeeming) `quantity`.
    pub fn component_amounts(&self, quantity: U256) -> Result<Vec<(Address, U256)>> {
        self.check_quantity(quantity)?;
        let naturals = quantity / self.natural_unit;
        self.components
            .iter()
            .zip(&self.units)
            .map(|(c, u)| Ok((*c, num::checked_mul(naturals, *u, "component amount")?)))
            .collect()
    }

    /// Largest quantity issuable from the given component balances.
    pub fn max_issuable(&self, balance_of: impl Fn(Address) -> U256) -> U256 {
        self.components
            .iter()
            .zip(&self.units)
            .map(|(c, u)| balance_of(*c) / *u)
            .min()
            .unwrap_or_default()
            .saturating_mul(self.natural_unit)
    }

    /// Indicates the natural units of both baskets divide one another.
    pub fn natural_units_compatible(&self, other: &Basket) -> bool {
        let (a, b) = (self.natural_unit, other.natural_unit);
        num::is_multiple(a, b) || num::is_multiple(b, a)
    }

    fn check_quantity(&self, quantity: U256) -> Result<()> {
        if quantity.is_zero() {
            return Err(ValidationError::ZeroQuantity { field: "quantity" }.into());
        }
        if !num::is_multiple(quantity, self.natural_unit) {
            return Err(ValidationError::NotMultiple {
                field: "quantity",
                quantity,
                unit: self.natural_unit,
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RebalanceError;

    const SET: Address = Address::new([0x10; 20]);
    const A: Address = Address::new([0x0a; 20]);
    const B: Address = Address::new([0x0b; 20]);

    fn basket() -> Basket {
        Basket::new(
            SET,
            vec![A, B],
            vec![U256::from(5), U256::from(2)],
            U256::from(10),
        )
        .unwrap()
    }

    #[test]
    fn test_component_amounts() {
        assert_eq!(
            basket().component_amounts(U256::from(30)).unwrap(),
            vec![(A, U256::from(15)), (B, U256::from(6))]
        );
        assert_eq!(
            basket().component_amounts(U256::from(35)),
            Err(RebalanceError::Validation(ValidationError::NotMultiple {
                field: "quantity",
                quantity: U256::from(35),
                unit: U256::from(10),
            }))
        );
    }

    #[test]
    fn test_max_issuable() {
        let balances = |t: Address| {
            if t == A {
                U256::from(27)
            } else {
                U256::from(100)
            }
        };
        // 27 / 5 = 5 natural units limited by A
        assert_eq!(basket().max_issuable(balances), U256::from(50));
        assert_eq!(basket().max_issuable(|_| U256::ZERO), U256::ZERO);
    }

    #[test]
    fn test_rejects_invalid_definitions() {
        assert!(Basket::new(SET, vec![], vec![], U256::from(1)).is_err());
        assert!(Basket::new(SET, vec![A, A], vec![U256::from(1); 2], U256::from(1)).is_err());
        assert!(Basket::new(SET, vec![A], vec![U256::ZERO], U256::from(1)).is_err());
        assert!(Basket::new(SET, vec![A], vec![U256::from(1)], U256::ZERO).is_err());
        assert!(Basket::new(SET, vec![A, B], vec![U256::from(1)], U256::from(1)).is_err());
    }

    #[test]
    fn test_natural_units_compatible() {
        let other = |nu: u64| Basket::new(B, vec![A], vec![U256::from(1)], U256::from(nu)).unwrap();
        assert!(basket().natural_units_compatible(&other(30)));
        assert!(basket().natural_units_compatible(&other(5)));
        assert!(!basket().natural_units_compatible(&other(15)));
    }
}
