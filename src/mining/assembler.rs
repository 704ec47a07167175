//! Block assembly
//!
//! Builds the coinbase transaction, the ordered inclusion list, the merkle
//! commitment over its txids, and the search-ready header.

use super::coordinator::AcceptedTx;
use crate::core::{BlockHeader, EncodingError, Transaction, BLOCK_REWARD};
use crate::crypto::merkle_root;
use log::debug;
use std::collections::HashSet;
use thiserror::Error;

/// Construction invariant violations
///
/// These indicate a bug or corrupt data rather than a merely-invalid
/// transaction, so they abort the run.
#[derive(Error, Debug)]
pub enum IntegrityError {
    #[error("Duplicate txid {0} in inclusion list")]
    DuplicateTxid(String),
}

/// Errors raised during block assembly
#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("Coinbase encoding failed: {0}")]
    CoinbaseEncoding(#[from] EncodingError),
    #[error("Block integrity violated: {0}")]
    Integrity(#[from] IntegrityError),
}

/// A header plus the records the output stage needs, ready for the
/// proof-of-work search
#[derive(Debug, Clone)]
pub struct BlockTemplate {
    /// Header with nonce 0
    pub header: BlockHeader,
    /// Synthesized coinbase crediting the reward plus fees
    pub coinbase: Transaction,
    /// Identifier of the coinbase, first entry of the inclusion list
    pub coinbase_txid: [u8; 32],
    /// Included transactions in inclusion order (coinbase excluded)
    pub transactions: Vec<AcceptedTx>,
}

/// Builds a search-ready block template from validated transactions
pub struct BlockAssembler {
    coinbase_address: String,
}

impl BlockAssembler {
    pub fn new(coinbase_address: &str) -> Self {
        Self {
            coinbase_address: coinbase_address.to_string(),
        }
    }

    /// Assemble a template at the given timestamp
    ///
    /// The coinbase credits the block reward plus the fees captured for
    /// exactly the transactions in `accepted`; the inclusion list is
    /// [coinbase, accepted...] and the header commits to the merkle root
    /// over its txids.
    pub fn assemble(
        &self,
        accepted: &[AcceptedTx],
        timestamp: u32,
    ) -> Result<BlockTemplate, AssembleError> {
        let fees: u64 = accepted.iter().map(|a| a.fee).sum();
        let coinbase = Transaction::coinbase(&self.coinbase_address, BLOCK_REWARD + fees);
        let coinbase_txid = coinbase.txid()?;

        let mut txids = Vec::with_capacity(accepted.len() + 1);
        txids.push(coinbase_txid);
        txids.extend(accepted.iter().map(|a| a.txid));

        let mut seen = HashSet::with_capacity(txids.len());
        for txid in &txids {
            if !seen.insert(txid) {
                return Err(IntegrityError::DuplicateTxid(hex::encode(txid)).into());
            }
        }

        let root = merkle_root(&txids);
        debug!(
            "Assembled template: {} transactions, {} fee units, root {}",
            txids.len(),
            fees,
            hex::encode(root)
        );

        Ok(BlockTemplate {
            header: BlockHeader::new(root, timestamp),
            coinbase,
            coinbase_txid,
            transactions: accepted.to_vec(),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
