//! Batch submissions handed to the settlement router by the sequencer.
//!
//! A batch is an ordered list of rollup transaction references plus the state
//! root reached after applying them. Its `batch_root` commits to exactly that
//! content, so any node can recompute and compare it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{StateRoot, TxHash, constants};

/// A batch ready to be settled on some chain.
///
/// `batch_index` is strictly increasing per sequencer and never reused; the
/// ledger rejects a repeated index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSubmission {
    /// Sequencer-assigned position of this batch.
    pub batch_index: u64,
    /// SHA-256 digest over the transactions and the resulting state root.
    pub batch_root: StateRoot,
    /// Transaction references in execution order.
    pub transactions: Vec<TxHash>,
    /// State root after applying every transaction.
    pub state_root: StateRoot,
    /// When the sequencer produced the batch.
    pub timestamp: DateTime<Utc>,
}

impl BatchSubmission {
    /// Build a batch, deriving `batch_root` from the transactions and state root.
    #[must_use]
    pub fn new(
        batch_index: u64,
        transactions: Vec<TxHash>,
        state_root: StateRoot,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let batch_root = Self::compute_batch_root(&transactions, &state_root);
        Self {
            batch_index,
            batch_root,
            transactions,
            state_root,
            timestamp,
        }
    }

    /// Compute the batch root.
    ///
    /// This hash commits to:
    /// - Number of transactions
    /// - Each transaction reference, in order
    /// - The post-batch state root
    #[must_use]
    pub fn compute_batch_root(transactions: &[TxHash], state_root: &StateRoot) -> StateRoot {
        let mut hasher = Sha256::new();
        hasher.update(constants::BATCH_ROOT_DOMAIN);
        hasher.update((transactions.len() as u64).to_le_bytes());
        for tx in transactions {
            hasher.update(tx.as_bytes());
        }
        hasher.update(state_root.as_bytes());

        let result = hasher.finalize();
        let mut root = [0u8; 32];
        root.copy_from_slice(&result);
        StateRoot(root)
    }

    /// Recompute the batch root and compare it with the stored one.
    #[must_use]
    pub fn verify_root(&self) -> bool {
        Self::compute_batch_root(&self.transactions, &self.state_root) == self.batch_root
    }

    /// Number of transactions in the batch.
    #[must_use]
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }
}

/// Fixture constructors for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl BatchSubmission {
    /// Deterministic batch with three transactions derived from `batch_index`.
    pub fn dummy(batch_index: u64) -> Self {
        let seed = batch_index.to_le_bytes()[0];
        let transactions = (0u8..3)
            .map(|i| TxHash([seed.wrapping_add(i); 32]))
            .collect();
        Self::new(
            batch_index,
            transactions,
            StateRoot([seed.wrapping_add(0x80); 32]),
            Utc::now(),
        )
    }

    /// Batch with `tx_count` random transaction references and a random state root.
    pub fn random(batch_index: u64, tx_count: usize) -> Self {
        use rand::RngCore;
        let mut rng = rand::thread_rng();
        let transactions = (0..tx_count)
            .map(|_| {
                let mut bytes = [0u8; 32];
                rng.fill_bytes(&mut bytes);
                TxHash(bytes)
            })
            .collect();
        let mut root = [0u8; 32];
        rng.fill_bytes(&mut root);
        Self::new(batch_index, transactions, StateRoot(root), Utc::now())
    }
}
