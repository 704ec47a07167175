//! Transaction records and their canonical encoding
//!
//! Transactions arrive as JSON records from the mempool directory and are
//! treated as immutable once decoded. Identity (the txid) is the SHA-256
//! digest of the canonical byte encoding, always computed through the
//! codec rather than stored in the record.

use crate::crypto::sha256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Highest transaction version this pipeline accepts
pub const TX_VERSION: u32 = 2;

/// Locktime threshold: values below are block heights, above are timestamps
/// (500 million, same as Bitcoin)
pub const LOCKTIME_THRESHOLD: u32 = 500_000_000;

/// Coinbase reward in smallest currency units
pub const BLOCK_REWARD: u64 = 5_000_000_000;

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised by the canonical transaction encoder
///
/// A malformed field fails the encode instead of producing garbage bytes;
/// the failure is scoped to the one transaction, never the run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodingError {
    #[error("Negative input value {value} at index {index}")]
    NegativeInputValue { index: usize, value: i64 },
    #[error("Negative output value {value} at index {index}")]
    NegativeOutputValue { index: usize, value: i64 },
}

// =============================================================================
// Transaction Input / Output
// =============================================================================

/// The output an input spends, carried inline with the input
///
/// The pipeline holds no chain state to resolve references against, so
/// each input must bring its own value-bearing prevout record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prevout {
    /// Value of the spent output in smallest units
    pub value: i64,
    /// Destination descriptor of the spent output (opaque)
    #[serde(default)]
    pub script_pubkey: String,
}

/// Transaction input
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TxInput {
    /// The output this input spends; `None` models a missing reference
    /// (and the synthetic coinbase input)
    #[serde(default)]
    pub prevout: Option<Prevout>,
}

/// Transaction output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TxOutput {
    /// Amount in smallest units
    pub value: i64,
    /// Recipient descriptor (opaque to the pipeline)
    #[serde(default)]
    pub script_pubkey: String,
}

// =============================================================================
// Transaction
// =============================================================================

/// A transaction record as loaded from the mempool
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Transaction version
    pub version: u32,
    /// Transaction inputs
    pub vin: Vec<TxInput>,
    /// Transaction outputs
    pub vout: Vec<TxOutput>,
    /// Locktime: block height or timestamp before which the transaction
    /// cannot be included
    #[serde(default)]
    pub locktime: u32,
}

impl Transaction {
    /// Create a coinbase transaction crediting `recipient` with `amount`
    ///
    /// The single input carries no prevout; serialization and txid follow
    /// the same codec as ordinary transactions.
    pub fn coinbase(recipient: &str, amount: u64) -> Self {
        Self {
            version: TX_VERSION,
            vin: vec![TxInput { prevout: None }],
            vout: vec![TxOutput {
                value: amount as i64,
                script_pubkey: recipient.to_string(),
            }],
            locktime: 0,
        }
    }

    /// Sum of all resolvable input values
    pub fn total_input(&self) -> i128 {
        self.vin
            .iter()
            .filter_map(|input| input.prevout.as_ref())
            .map(|prevout| prevout.value as i128)
            .sum()
    }

    /// Sum of all output values
    pub fn total_output(&self) -> i128 {
        self.vout.iter().map(|output| output.value as i128).sum()
    }

    /// Canonical byte encoding of the transaction
    ///
    /// Length-prefixed and order-preserving: version, each input in vin
    /// order, each output in vout order, then locktime, all integers
    /// big-endian. Two structurally different transactions never encode
    /// to the same bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, EncodingError> {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&self.version.to_be_bytes());

        buf.extend_from_slice(&(self.vin.len() as u32).to_be_bytes());
        for (index, input) in self.vin.iter().enumerate() {
            match &input.prevout {
                Some(prevout) => {
                    let value = u64::try_from(prevout.value).map_err(|_| {
                        EncodingError::NegativeInputValue {
                            index,
                            value: prevout.value,
                        }
                    })?;
                    buf.push(0x01);
                    buf.extend_from_slice(&value.to_be_bytes());
                    write_bytes(&mut buf, prevout.script_pubkey.as_bytes());
                }
                None => buf.push(0x00),
            }
        }

        buf.extend_from_slice(&(self.vout.len() as u32).to_be_bytes());
        for (index, output) in self.vout.iter().enumerate() {
            let value = u64::try_from(output.value).map_err(|_| {
                EncodingError::NegativeOutputValue {
                    index,
                    value: output.value,
                }
            })?;
            buf.extend_from_slice(&value.to_be_bytes());
            write_bytes(&mut buf, output.script_pubkey.as_bytes());
        }

        buf.extend_from_slice(&self.locktime.to_be_bytes());
        Ok(buf)
    }

    /// Transaction identifier: SHA-256 of the canonical encoding
    pub fn txid(&self) -> Result<[u8; 32], EncodingError> {
        Ok(sha256(&self.serialize()?))
    }

    /// Transaction identifier as a hex string
    pub fn txid_hex(&self) -> Result<String, EncodingError> {
        Ok(hex::encode(self.txid()?))
    }
}

fn write_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(bytes);
}

// =============================================================================
// Tests
// =============================================================================
