//! Block header and difficulty target
//!
//! The header commits to the merkle root, the assembly timestamp, and the
//! nonce found by the proof-of-work search. Its canonical encoding is
//! exactly 40 bytes: the root, then timestamp and nonce as big-endian u32.

use crate::crypto::sha256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Byte length of the canonical header encoding
pub const BLOCK_HEADER_SIZE: usize = 40;

/// Default difficulty target: 0x0000ffff followed by zeros
pub const DEFAULT_TARGET_HEX: &str =
    "0000ffff00000000000000000000000000000000000000000000000000000000";

/// Errors from parsing a difficulty target
#[derive(Error, Debug)]
pub enum TargetError {
    #[error("Target must be 64 hex characters, got {0}")]
    InvalidLength(usize),
    #[error("Target is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

// =============================================================================
// Difficulty Target
// =============================================================================

/// 256-bit threshold a header hash must be strictly below
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyTarget(pub [u8; 32]);

impl DifficultyTarget {
    /// Parse from a 64-character big-endian hex string
    pub fn from_hex(s: &str) -> Result<Self, TargetError> {
        if s.len() != 64 {
            return Err(TargetError::InvalidLength(s.len()));
        }
        let bytes = hex::decode(s)?;
        let mut target = [0u8; 32];
        target.copy_from_slice(&bytes);
        Ok(Self(target))
    }

    /// Check whether a digest, read as a big-endian unsigned integer, is
    /// strictly below this target
    pub fn is_met_by(&self, digest: &[u8; 32]) -> bool {
        *digest < self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for DifficultyTarget {
    fn default() -> Self {
        let mut target = [0u8; 32];
        target[2] = 0xff;
        target[3] = 0xff;
        Self(target)
    }
}

// =============================================================================
// Block Header
// =============================================================================

/// Block header: fixed once assembly completes, except the nonce, which
/// the proof-of-work search rewrites
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockHeader {
    /// Merkle root over the inclusion list's txids
    pub merkle_root: [u8; 32],
    /// Assembly timestamp (Unix seconds)
    pub timestamp: u32,
    /// Proof-of-work nonce
    pub nonce: u32,
}

impl BlockHeader {
    pub fn new(merkle_root: [u8; 32], timestamp: u32) -> Self {
        Self {
            merkle_root,
            timestamp,
            nonce: 0,
        }
    }

    /// Canonical 40-byte encoding
    pub fn serialize(&self) -> [u8; BLOCK_HEADER_SIZE] {
        let mut buf = [0u8; BLOCK_HEADER_SIZE];
        buf[..32].copy_from_slice(&self.merkle_root);
        buf[32..36].copy_from_slice(&self.timestamp.to_be_bytes());
        buf[36..40].copy_from_slice(&self.nonce.to_be_bytes());
        buf
    }

    /// Hash of the canonical encoding
    pub fn hash(&self) -> [u8; 32] {
        sha256(&self.serialize())
    }

    /// Hex of the canonical encoding (the result file's header line)
    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize())
    }

    /// Check the header's current nonce against a target
    pub fn meets_target(&self, target: &DifficultyTarget) -> bool {
        target.is_met_by(&self.hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_field_layout() {
        let header = BlockHeader {
            merkle_root: [0xab; 32],
            timestamp: 0x01020304,
            nonce: 0x0a0b0c0d,
        };
        let bytes = header.serialize();

        assert_eq!(bytes.len(), BLOCK_HEADER_SIZE);
        assert_eq!(&bytes[..32], &[0xab; 32]);
        assert_eq!(&bytes[32..36], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&bytes[36..40], &[0x0a, 0x0b, 0x0c, 0x0d]);
        assert_eq!(header.to_hex().len(), 80);
    }

    #[test]
    fn test_hash_changes_with_nonce() {
        let mut header = BlockHeader::new([7u8; 32], 1_700_000_000);
        let before = header.hash();
        header.nonce += 1;
        assert_ne!(before, header.hash());
    }

    #[test]
    fn test_target_comparison_is_strict() {
        let target = DifficultyTarget([0x10; 32]);

        let mut below = [0x10; 32];
        below[31] = 0x0f;
        assert!(target.is_met_by(&below));

        // Equal to the target does not win
        assert!(!target.is_met_by(&[0x10; 32]));

        let mut above = [0x10; 32];
        above[0] = 0x11;
        assert!(!target.is_met_by(&above));
    }

    #[test]
    fn test_target_from_hex() {
        let target = DifficultyTarget::from_hex(DEFAULT_TARGET_HEX).unwrap();
        assert_eq!(target, DifficultyTarget::default());
        assert_eq!(target.to_hex(), DEFAULT_TARGET_HEX);

        assert!(matches!(
            DifficultyTarget::from_hex("00ff"),
            Err(TargetError::InvalidLength(4))
        ));
        assert!(matches!(
            DifficultyTarget::from_hex(&"zz".repeat(32)),
            Err(TargetError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_default_target_leading_pattern() {
        let target = DifficultyTarget::default();
        assert_eq!(&target.0[..4], &[0x00, 0x00, 0xff, 0xff]);
        assert!(target.0[4..].iter().all(|&b| b == 0));
    }
}
