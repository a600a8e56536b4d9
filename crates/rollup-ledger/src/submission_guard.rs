//! Duplicate-batch guard at the ledger boundary.
//!
//! Nothing stops two router instances from submitting the same batch, so the
//! ledger itself accepts a given `batch_index` at most once per sequencer.
//! Indices are strictly increasing, so remembering the highest accepted index
//! per sequencer is enough; memory stays constant no matter how long the
//! ledger runs.

use std::collections::HashMap;

use rollup_types::{Address, Result, RollupError};

/// Remembers the last accepted batch index of every sequencer.
#[derive(Debug, Default)]
pub struct SubmissionGuard {
    last_accepted: HashMap<Address, u64>,
}

impl SubmissionGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `batch_index` is new for `sequencer` without recording it.
    ///
    /// # Errors
    /// Returns [`RollupError::DuplicateBatch`] if the index is not greater
    /// than the last one accepted from this sequencer.
    pub fn check(&self, sequencer: &Address, batch_index: u64) -> Result<()> {
        match self.last_accepted.get(sequencer) {
            Some(&last) if batch_index <= last => Err(RollupError::DuplicateBatch {
                sequencer: *sequencer,
                batch_index,
                last_accepted: last,
            }),
            _ => Ok(()),
        }
    }

    /// Check and record in one step.
    pub fn accept(&mut self, sequencer: Address, batch_index: u64) -> Result<()> {
        self.check(&sequencer, batch_index)?;
        self.last_accepted.insert(sequencer, batch_index);
        Ok(())
    }

    /// Last accepted index for a sequencer, if any.
    #[must_use]
    pub fn last_accepted(&self, sequencer: &Address) -> Option<u64> {
        self.last_accepted.get(sequencer).copied()
    }

    #[must_use]
    pub fn is_accepted(&self, sequencer: &Address, batch_index: u64) -> bool {
        self.last_accepted(sequencer)
            .is_some_and(|last| batch_index <= last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq() -> Address {
        Address::repeat_byte(0x5e)
    }

    #[test]
    fn first_batch_ok() {
        let mut guard = SubmissionGuard::new();
        assert!(guard.accept(seq(), 0).is_ok());
        assert!(guard.is_accepted(&seq(), 0));
        assert_eq!(guard.last_accepted(&seq()), Some(0));
    }

    #[test]
    fn repeated_index_blocked() {
        let mut guard = SubmissionGuard::new();
        guard.accept(seq(), 7).unwrap();

        let err = guard.accept(seq(), 7).unwrap_err();
        assert!(
            matches!(err, RollupError::DuplicateBatch { batch_index: 7, last_accepted: 7, .. }),
            "Expected DuplicateBatch, got: {err:?}"
        );
    }

    #[test]
    fn older_index_blocked() {
        let mut guard = SubmissionGuard::new();
        guard.accept(seq(), 10).unwrap();
        assert!(guard.accept(seq(), 3).is_err());
        assert_eq!(guard.last_accepted(&seq()), Some(10));
    }

    #[test]
    fn gaps_are_allowed() {
        let mut guard = SubmissionGuard::new();
        guard.accept(seq(), 1).unwrap();
        guard.accept(seq(), 5).unwrap();
        assert!(guard.is_accepted(&seq(), 3));
        assert!(!guard.is_accepted(&seq(), 6));
    }

    #[test]
    fn sequencers_are_independent() {
        let mut guard = SubmissionGuard::new();
        let other = Address::repeat_byte(0x01);
        guard.accept(seq(), 4).unwrap();
        guard.accept(other, 4).unwrap();
        assert!(guard.accept(other, 4).is_err());
    }

    #[test]
    fn check_does_not_record() {
        let guard = SubmissionGuard::new();
        guard.check(&seq(), 1).unwrap();
        assert!(!guard.is_accepted(&seq(), 1));
        assert_eq!(guard.last_accepted(&seq()), None);
    }
}
