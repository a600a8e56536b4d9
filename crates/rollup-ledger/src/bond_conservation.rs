//! Bond conservation invariant checker.
//!
//! Mathematical invariant enforced after every bond mutation in tests and
//! available to operators at any time:
//! ```text
//! Σ(available + locked) == Σ(deposits) - Σ(withdrawals)
//! ```
//!
//! Slashing and forfeiture move collateral between addresses; they never
//! create or destroy it. If the invariant breaks, bond accounting is wrong.

use rollup_types::{Amount, Result, RollupError};

/// Tracks lifetime deposit and withdrawal totals of a bond book.
#[derive(Debug, Default)]
pub struct BondConservation {
    deposits: Amount,
    withdrawals: Amount,
}

impl BondConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_deposit(&mut self, amount: Amount) {
        self.deposits += amount;
    }

    pub fn record_withdrawal(&mut self, amount: Amount) {
        self.withdrawals += amount;
    }

    /// Expected total collateral: deposits - withdrawals.
    #[must_use]
    pub fn expected_total(&self) -> Amount {
        self.deposits.saturating_sub(self.withdrawals)
    }

    /// Verify that the collateral actually held matches the expected total.
    ///
    /// # Errors
    /// Returns [`RollupError::BondInvariantViolation`] if actual ≠ expected.
    pub fn verify(&self, actual_total: Amount) -> Result<()> {
        let expected = self.expected_total();
        if actual_total != expected {
            return Err(RollupError::BondInvariantViolation {
                reason: format!(
                    "held {actual_total} != expected {expected} \
                     (deposits={}, withdrawals={})",
                    self.deposits, self.withdrawals
                ),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn total_deposits(&self) -> Amount {
        self.deposits
    }

    #[must_use]
    pub fn total_withdrawals(&self) -> Amount {
        self.withdrawals
    }
}
