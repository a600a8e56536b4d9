//! Bond book: per-address collateral with available/locked accounting.
//!
//! Balances change only through deposit, withdraw, lock/release around a
//! challenge, or slash/forfeit during challenge resolution. Every mutation
//! is all-or-nothing: on error the book is unchanged.

use std::collections::HashMap;

use rollup_types::{Address, Amount, BondEntry, Result, RollupError};

use crate::bond_conservation::BondConservation;

/// Collateral held by every address on one chain's ledger.
#[derive(Debug, Default)]
pub struct BondBook {
    entries: HashMap<Address, BondEntry>,
    conservation: BondConservation,
}

impl BondBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` to `who`'s available bond.
    pub fn deposit(&mut self, who: Address, amount: Amount) {
        self.entries.entry(who).or_default().available += amount;
        self.conservation.record_deposit(amount);
    }

    /// Debit `amount` from `who`'s available bond.
    ///
    /// # Errors
    /// Returns `InsufficientAvailableBond` if available < amount.
    pub fn withdraw(&mut self, who: &Address, amount: Amount) -> Result<()> {
        let entry = self.entry_with_available(who, amount)?;
        entry.available -= amount;
        self.conservation.record_withdrawal(amount);
        Ok(())
    }

    /// Move `amount` from available to locked (posting a challenge bond).
    ///
    /// # Errors
    /// Returns `InsufficientBond` if available < amount.
    pub fn lock(&mut self, who: &Address, amount: Amount) -> Result<()> {
        let available = self.balance(who).available;
        if available < amount {
            return Err(RollupError::InsufficientBond {
                needed: amount,
                available,
            });
        }
        let entry = self.entries.entry(*who).or_default();
        entry.available -= amount;
        entry.locked += amount;
        Ok(())
    }

    /// Move `amount` from locked back to available.
    ///
    /// # Errors
    /// Returns `Internal` if locked < amount (accounting bug).
    pub fn release(&mut self, who: &Address, amount: Amount) -> Result<()> {
        let entry = self.entry_with_locked(who, amount)?;
        entry.locked -= amount;
        entry.available += amount;
        Ok(())
    }

    /// Take `amount` of `from`'s locked bond and credit it to `to`'s available bond.
    ///
    /// # Errors
    /// Returns `Internal` if `from` has less than `amount` locked.
    pub fn forfeit_locked(&mut self, from: &Address, to: Address, amount: Amount) -> Result<()> {
        let entry = self.entry_with_locked(from, amount)?;
        entry.locked -= amount;
        self.entries.entry(to).or_default().available += amount;
        Ok(())
    }

    /// Zero `from`'s whole bond (available and locked) and credit it to `to`.
    /// Returns the amount moved.
    pub fn slash_all(&mut self, from: &Address, to: Address) -> Amount {
        let slashed = self
            .entries
            .get_mut(from)
            .map(std::mem::take)
            .unwrap_or_default()
            .total();
        if slashed > 0 {
            self.entries.entry(to).or_default().available += slashed;
        }
        slashed
    }

    #[must_use]
    pub fn balance(&self, who: &Address) -> BondEntry {
        self.entries.get(who).copied().unwrap_or_default()
    }

    /// Sum of every address's collateral.
    #[must_use]
    pub fn total_bonded(&self) -> Amount {
        self.entries.values().map(BondEntry::total).sum()
    }

    /// Check the conservation invariant over the whole book.
    pub fn verify_conservation(&self) -> Result<()> {
        self.conservation.verify(self.total_bonded())
    }

    #[must_use]
    pub fn conservation(&self) -> &BondConservation {
        &self.conservation
    }

    fn entry_with_available(&mut self, who: &Address, amount: Amount) -> Result<&mut BondEntry> {
        let available = self.balance(who).available;
        if available < amount {
            return Err(RollupError::InsufficientAvailableBond {
                needed: amount,
                available,
            });
        }
        Ok(self.entries.entry(*who).or_default())
    }

    fn entry_with_locked(&mut self, who: &Address, amount: Amount) -> Result<&mut BondEntry> {
        let locked = self.balance(who).locked;
        if locked < amount {
            return Err(RollupError::Internal(format!(
                "{who} has {locked} locked, cannot move {amount}"
            )));
        }
        Ok(self.entries.entry(*who).or_default())
    }
}
