use alloy::primitives::{Address, U256};

/// Token transfers implied by a bid, indexed by the auction's combined token array.
///
/// `inflow` is what the bidder supplies to custody, `outflow` is what the bidder
/// receives. Tokens with neither flow are kept to preserve indexing; use
/// [`Self::reported`] for an external view without them.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct TokenFlows {
    pub execution_quantity: U256,
    pub tokens: Vec<Address>,
    pub inflow: Vec<U256>,
    pub outflow: Vec<U256>,
}

impl TokenFlows {
    /// Copy of the flows without tokens that neither flow in nor out.
    pub fn reported(&self) -> Self {
        let (tokens, (inflow, outflow)): (Vec<_>, (Vec<_>, Vec<_>)) = self
            .tokens
            .iter()
            .zip(self.inflow.iter().zip(self.outflow.iter()))
            .filter(|(_, (i, o))| !i.is_zero() || !o.is_zero())
            .map(|(t, (i, o))| (*t, (*i, *o)))
            .unzip();
        Self {
            execution_quantity: self.execution_quantity,
            tokens,
            inflow,
            outflow,
        }
    }

    /// Inflow required for the given token, zero when the token is not part of the auction.
    pub fn inflow_of(&self, token: Address) -> U256 {
        self.position(token)
            .map(|i| self.inflow[i])
            .unwrap_or_default()
    }

    /// Outflow paid for the given token, zero when the token is not part of the auction.
    pub fn outflow_of(&self, token: Address) -> U256 {
        self.position(token)
            .map(|i| self.outflow[i])
            .unwrap_or_default()
    }

    fn position(&self, token: Address) -> Option<usize> {
        self.tokens.iter().position(|t| *t == token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reported_drops_idle_tokens() {
        let (a, b, c) = (
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            Address::repeat_byte(3),
        );
        let flows = TokenFlows {
            execution_quantity: U256::from(10),
            tokens: vec![a, b, c],
            inflow: vec![U256::ZERO, U256::from(5), U256::ZERO],
            outflow: vec![U256::from(7), U256::ZERO, U256::ZERO],
        };

        let reported = flows.reported();
        assert_eq!(reported.tokens, vec![a, b]);
        assert_eq!(reported.inflow, vec![U256::ZERO, U256::from(5)]);
        assert_eq!(reported.outflow, vec![U256::from(7), U256::ZERO]);
        assert_eq!(reported.execution_quantity, U256::from(10));

        assert_eq!(flows.inflow_of(b), U256::from(5));
        assert_eq!(flows.outflow_of(a), U256::from(7));
        assert_eq!(flows.inflow_of(Address::ZERO), U256::ZERO);
    }
}
