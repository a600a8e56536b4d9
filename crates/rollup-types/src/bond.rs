//! Bond balance types.
//!
//! Every address has an `available` bond (withdrawable, counts towards the
//! sequencer's commit requirement) and a `locked` bond (posted behind an
//! open challenge).

use serde::{Deserialize, Serialize};

use crate::Amount;

/// Bond balance of a single address.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BondEntry {
    /// Free collateral.
    pub available: Amount,
    /// Collateral posted behind open challenges.
    pub locked: Amount,
}

impl BondEntry {
    /// Total collateral (available + locked).
    #[must_use]
    pub fn total(&self) -> Amount {
        self.available + self.locked
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.available == 0 && self.locked == 0
    }
}
