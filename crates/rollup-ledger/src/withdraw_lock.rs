//! Sequencer withdraw lock.
//!
//! While any of the sequencer's commitments is unfinalized, the bond backing
//! it must stay slashable: the sequencer may withdraw only the surplus above
//! `bond_amount`. Once every commitment is finalized the whole available
//! balance is withdrawable again. Other addresses are never affected.

use rollup_types::{Address, Amount, Result, RollupError};

/// Tracks how many of the sequencer's commitments are still unfinalized.
#[derive(Debug)]
pub struct SequencerWithdrawLock {
    sequencer: Address,
    required_bond: Amount,
    pending_commitments: usize,
}

impl SequencerWithdrawLock {
    #[must_use]
    pub fn new(sequencer: Address, required_bond: Amount) -> Self {
        Self {
            sequencer,
            required_bond,
            pending_commitments: 0,
        }
    }

    pub fn record_commit(&mut self) {
        self.pending_commitments += 1;
    }

    pub fn record_finalized(&mut self) {
        self.pending_commitments = self.pending_commitments.saturating_sub(1);
    }

    /// Whether the sequencer's bond is currently pinned.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.pending_commitments > 0
    }

    #[must_use]
    pub fn pending_commitments(&self) -> usize {
        self.pending_commitments
    }

    /// Amount of `who`'s available bond that must stay in place.
    #[must_use]
    pub fn locked_floor(&self, who: &Address) -> Amount {
        if *who == self.sequencer && self.is_locked() {
            self.required_bond
        } else {
            0
        }
    }

    /// Guard a withdrawal of `amount` from an available balance of `available`.
    ///
    /// # Errors
    /// Returns [`RollupError::BondLocked`] if the withdrawal would take the
    /// sequencer below the required bond while commitments are pending.
    pub fn check_withdraw(&self, who: &Address, available: Amount, amount: Amount) -> Result<()> {
        let floor = self.locked_floor(who);
        if floor > 0 && available.saturating_sub(amount) < floor {
            return Err(RollupError::BondLocked {
                reason: format!(
                    "{} unfinalized commitments pin {floor} of {who}'s bond \
                     (available {available}, requested {amount})",
                    self.pending_commitments
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq() -> Address {
        Address::repeat_byte(0x5e)
    }

    #[test]
    fn no_pending_commitments_allows_full_withdraw() {
        let lock = SequencerWithdrawLock::new(seq(), 100);
        assert!(!lock.is_locked());
        assert!(lock.check_withdraw(&seq(), 150, 150).is_ok());
    }

    #[test]
    fn pending_commitment_pins_bond() {
        let mut lock = SequencerWithdrawLock::new(seq(), 100);
        lock.record_commit();
        assert!(lock.is_locked());
        assert!(lock.check_withdraw(&seq(), 150, 50).is_ok());
        let err = lock.check_withdraw(&seq(), 150, 51).unwrap_err();
        assert!(matches!(err, RollupError::BondLocked { .. }));
    }

    #[test]
    fn other_addresses_unaffected() {
        let mut lock = SequencerWithdrawLock::new(seq(), 100);
        lock.record_commit();
        let other = Address::repeat_byte(0x01);
        assert_eq!(lock.locked_floor(&other), 0);
        assert!(lock.check_withdraw(&other, 100, 100).is_ok());
    }

    #[test]
    fn finalization_releases_lock() {
        let mut lock = SequencerWithdrawLock::new(seq(), 100);
        lock.record_commit();
        lock.record_commit();
        lock.record_finalized();
        assert!(lock.is_locked());
        lock.record_finalized();
        assert!(!lock.is_locked());
        assert!(lock.check_withdraw(&seq(), 100, 100).is_ok());
    }

    #[test]
    fn finalized_never_underflows() {
        let mut lock = SequencerWithdrawLock::new(seq(), 100);
        lock.record_finalized();
        assert_eq!(lock.pending_commitments(), 0);
    }
}
