use super::*;
use crate::error::InsufficientResourceError;

/// Token balances tracked by the engine.
///
/// Every token (components, baskets and rebalancing sets alike) is identified by its
/// address. Balances are held either in wallets or in the vault, where custody is
/// attributed to an owner (a set holding collateral, or a bidder who did not
/// withdraw). Supply accounts for both.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    wallets: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address), U256>,
    vault: HashMap<(Address, Address), U256>,
    supplies: HashMap<Address, U256>,
}

impl Ledger {
    /// Wallet balance of `token` held by `owner`.
    pub fn balance_of(&self, token: Address, owner: Address) -> U256 {
        self.wallets.get(&(token, owner)).copied().unwrap_or_default()
    }

    /// Allowance granted by `owner` to the transfer proxy for `token`.
    pub fn allowance(&self, token: Address, owner: Address) -> U256 {
        self.allowances
            .get(&(token, owner))
            .copied()
            .unwrap_or_default()
    }

    /// Vault balance of `token` attributed to `owner`.
    pub fn custody_of(&self, token: Address, owner: Address) -> U256 {
        self.vault.get(&(token, owner)).copied().unwrap_or_default()
    }

    pub fn total_supply(&self, token: Address) -> U256 {
        self.supplies.get(&token).copied().unwrap_or_default()
    }

    pub(crate) fn mint(&mut self, token: Address, to: Address, amount: U256) -> Result<()> {
        self.grow_supply(token, amount)?;
        let balance = self.wallets.entry((token, to)).or_default();
        *balance = num::checked_add(*balance, amount, "wallet balance")?;
        Ok(())
    }

    pub(crate) fn burn(&mut self, token: Address, from: Address, amount: U256) -> Result<()> {
        self.debit_wallet(token, from, amount)?;
        self.shrink_supply(token, amount);
        Ok(())
    }

    pub(crate) fn approve(&mut self, token: Address, owner: Address, amount: U256) {
        self.allowances.insert((token, owner), amount);
    }

    /// Moves `amount` of `token` from the `from` wallet into the vault under `to`,
    /// spending the allowance granted to `spender`. [`U256::MAX`] allowances are
    /// never decreased.
    pub(crate) fn deposit(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        spender: Address,
        amount: U256,
    ) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let allowance = self.allowance(token, from);
        if allowance < amount {
            return Err(InsufficientResourceError::Allowance {
                token,
                owner: from,
                spender,
                required: amount,
                available: allowance,
            }
            .into());
        }
        self.debit_wallet(token, from, amount)?;
        if allowance != U256::MAX {
            self.allowances.insert((token, from), allowance - amount);
        }
        self.credit_custody(token, to, amount)
    }

    /// Moves custody of `amount` of `token` between vault owners.
    pub(crate) fn transfer_custody(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        self.debit_custody(token, from, amount)?;
        self.credit_custody(token, to, amount)
    }

    /// Moves `amount` of `token` out of the vault into the owner's wallet.
    pub(crate) fn withdraw(&mut self, token: Address, owner: Address, amount: U256) -> Result<()> {
        self.withdraw_to(token, owner, owner, amount)
    }

    /// Moves `amount` of `token` out of `from` custody into the `to` wallet.
    pub(crate) fn withdraw_to(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        self.debit_custody(token, from, amount)?;
        let balance = self.wallets.entry((token, to)).or_default();
        *balance = num::checked_add(*balance, amount, "wallet balance")?;
        Ok(())
    }

    /// Mints `amount` of `token` straight into custody of `to`.
    pub(crate) fn mint_custody(&mut self, token: Address, to: Address, amount: U256) -> Result<()> {
        self.grow_supply(token, amount)?;
        self.credit_custody(token, to, amount)
    }

    /// Burns `amount` of `token` from custody of `from`.
    pub(crate) fn burn_custody(
        &mut self,
        token: Address,
        from: Address,
        amount: U256,
    ) -> Result<()> {
        self.debit_custody(token, from, amount)?;
        self.shrink_supply(token, amount);
        Ok(())
    }

    fn debit_wallet(&mut self, token: Address, owner: Address, amount: U256) -> Result<()> {
        let available = self.balance_of(token, owner);
        if available < amount {
            return Err(InsufficientResourceError::Balance {
                token,
                owner,
                required: amount,
                available,
            }
            .into());
        }
        self.wallets.insert((token, owner), available - amount);
        Ok(())
    }

    fn debit_custody(&mut self, token: Address, owner: Address, amount: U256) -> Result<()> {
        let available = self.custody_of(token, owner);
        if available < amount {
            return Err(InsufficientResourceError::Custody {
                token,
                owner,
                required: amount,
                available,
            }
            .into());
        }
        self.vault.insert((token, owner), available - amount);
        Ok(())
    }

    fn credit_custody(&mut self, token: Address, owner: Address, amount: U256) -> Result<()> {
        let balance = self.vault.entry((token, owner)).or_default();
        *balance = num::checked_add(*balance, amount, "custody balance")?;
        Ok(())
    }

    fn grow_supply(&mut self, token: Address, amount: U256) -> Result<()> {
        let supply = self.supplies.entry(token).or_default();
        *supply = num::checked_add(*supply, amount, "token supply")?;
        Ok(())
    }

    fn shrink_supply(&mut self, token: Address, amount: U256) {
        let supply = self.supplies.entry(token).or_default();
        *supply = supply.saturating_sub(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RebalanceError;

    const TOKEN: Address = Address::new([0xaa; 20]);
    const ALICE: Address = Address::new([0x01; 20]);
    const SET: Address = Address::new([0x02; 20]);
    const PROXY: Address = Address::new([0x03; 20]);

    #[test]
    fn test_deposit_requires_allowance_and_balance() {
        let mut ledger = Ledger::default();
        ledger.mint(TOKEN, ALICE, U256::from(100)).unwrap();

        assert_eq!(
            ledger.deposit(TOKEN, ALICE, SET, PROXY, U256::from(10)),
            Err(RebalanceError::InsufficientResource(
                InsufficientResourceError::Allowance {
                    token: TOKEN,
                    owner: ALICE,
                    spender: PROXY,
                    required: U256::from(10),
                    available: U256::ZERO,
                }
            ))
        );

        ledger.approve(TOKEN, ALICE, U256::from(500));
        assert_eq!(
            ledger.deposit(TOKEN, ALICE, SET, PROXY, U256::from(200)),
            Err(RebalanceError::InsufficientResource(
                InsufficientResourceError::Balance {
                    token: TOKEN,
                    owner: ALICE,
                    required: U256::from(200),
                    available: U256::from(100),
                }
            ))
        );

        ledger
            .deposit(TOKEN, ALICE, SET, PROXY, U256::from(60))
            .unwrap();
        assert_eq!(ledger.balance_of(TOKEN, ALICE), U256::from(40));
        assert_eq!(ledger.custody_of(TOKEN, SET), U256::from(60));
        assert_eq!(ledger.allowance(TOKEN, ALICE), U256::from(440));
        assert_eq!(ledger.total_supply(TOKEN), U256::from(100));
    }

    #[test]
    fn test_unlimited_allowance_is_kept() {
        let mut ledger = Ledger::default();
        ledger.mint(TOKEN, ALICE, U256::from(100)).unwrap();
        ledger.approve(TOKEN, ALICE, U256::MAX);
        ledger
            .deposit(TOKEN, ALICE, SET, PROXY, U256::from(60))
            .unwrap();
        assert_eq!(ledger.allowance(TOKEN, ALICE), U256::MAX);
    }

    #[test]
    fn test_custody_moves_and_withdrawals() {
        let mut ledger = Ledger::default();
        ledger.mint_custody(TOKEN, SET, U256::from(50)).unwrap();
        ledger
            .transfer_custody(TOKEN, SET, ALICE, U256::from(20))
            .unwrap();
        ledger.withdraw(TOKEN, ALICE, U256::from(15)).unwrap();

        assert_eq!(ledger.custody_of(TOKEN, SET), U256::from(30));
        assert_eq!(ledger.custody_of(TOKEN, ALICE), U256::from(5));
        assert_eq!(ledger.balance_of(TOKEN, ALICE), U256::from(15));
        assert!(matches!(
            ledger.withdraw(TOKEN, ALICE, U256::from(6)),
            Err(RebalanceError::InsufficientResource(
                InsufficientResourceError::Custody { .. }
            ))
        ));

        ledger.burn_custody(TOKEN, SET, U256::from(30)).unwrap();
        ledger.burn(TOKEN, ALICE, U256::from(15)).unwrap();
        assert_eq!(ledger.total_supply(TOKEN), U256::from(5));
    }
}
