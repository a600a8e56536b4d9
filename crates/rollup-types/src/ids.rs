//! Identifiers used throughout the settlement core.
//!
//! Chain, commitment and challenge identifiers are small integers. Addresses
//! and 32-byte digests are fixed-size byte arrays rendered as hex.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer amount in the smallest unit of the settlement asset (bonds, gas cost).
pub type Amount = u128;

// ---------------------------------------------------------------------------
// ChainId
// ---------------------------------------------------------------------------

/// Identity of a settlement backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// Account identity on a settlement chain (sequencer, challenger, arbiter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Address whose every byte is `byte`. Handy for fixtures and simulations.
    #[must_use]
    pub fn repeat_byte(byte: u8) -> Self {
        Self([byte; 20])
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// StateRoot / TxHash
// ---------------------------------------------------------------------------

/// 32-byte commitment to a rollup state (or to a batch, for `batch_root`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize, Default)]
pub struct StateRoot(pub [u8; 32]);

impl StateRoot {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for StateRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Reference to a transaction: either a rollup transaction inside a batch or
/// the settlement transaction a chain produced for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// CommitmentId / ChallengeId
// ---------------------------------------------------------------------------

/// Position of a state commitment in a chain's ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CommitmentId(pub u64);

impl fmt::Display for CommitmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "commitment:{}", self.0)
    }
}

/// Position of a challenge in a chain's ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ChallengeId(pub u64);

impl fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "challenge:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_id_display() {
        assert_eq!(ChainId(42).to_string(), "chain:42");
    }

    #[test]
    fn address_display_is_full_hex() {
        let addr = Address::repeat_byte(0xab);
        let s = addr.to_string();
        assert!(s.starts_with("0xabab"));
        assert_eq!(s.len(), 2 + 40);
        assert_eq!(addr.short(), "abababab");
    }

    #[test]
    fn state_root_zero() {
        assert!(StateRoot::default().is_zero());
        assert!(!StateRoot([1u8; 32]).is_zero());
    }

    #[test]
    fn ids_order_numerically() {
        assert!(ChallengeId(2) < ChallengeId(10));
        assert!(ChainId(1) < ChainId(137));
    }

    #[test]
    fn serde_roundtrips() {
        let addr = Address::repeat_byte(7);
        let json = serde_json::to_string(&addr).unwrap();
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);

        let root = StateRoot([9u8; 32]);
        let json = serde_json::to_string(&root).unwrap();
        let back: StateRoot = serde_json::from_str(&json).unwrap();
        assert_eq!(root, back);
    }
}
