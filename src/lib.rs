//! Blocksmith: a block assembly and proof-of-work mining pipeline
//!
//! This crate assembles a candidate block from a pool of pending
//! transactions, featuring:
//! - Consensus-style transaction validation (structure, value
//!   conservation, fee bounds, locktime) fanned out across a worker pool
//! - Canonical transaction encoding and txid computation
//! - Merkle commitment over the ordered inclusion list
//! - Coinbase construction crediting the block reward plus fees
//! - Proof-of-work nonce search against a 256-bit difficulty target
//!
//! # Example
//!
//! ```rust
//! use blocksmith::core::DifficultyTarget;
//! use blocksmith::mining::{CancelFlag, Miner, MinerConfig};
//!
//! // An easy target so the example mines instantly
//! let config = MinerConfig {
//!     target: DifficultyTarget([0xff; 32]),
//!     ..MinerConfig::default()
//! };
//!
//! let miner = Miner::new(config);
//! let block = miner.mine(&[], &CancelFlag::new()).unwrap();
//! println!("Mined header {}", block.header.to_hex());
//! ```

pub mod core;
pub mod crypto;
pub mod mining;
pub mod storage;

// Re-export commonly used types
pub use crate::core::{
    BlockHeader, DifficultyTarget, FeePolicy, Transaction, TransactionValidator,
    ValidationContext, ValidationError, BLOCK_REWARD,
};
pub use crate::crypto::{merkle_root, sha256};
pub use crate::mining::{
    BlockAssembler, CancelFlag, MinedBlock, Miner, MinerConfig, MiningError, ValidationCoordinator,
};
pub use crate::storage::{load_transactions, write_result, StorageError};
