//! Mining pipeline: validation fan-out, block assembly, proof-of-work
//!
//! [`Miner`] drives the full sequence: the pending set is validated in
//! parallel, the surviving transactions are assembled into a template
//! (coinbase, inclusion list, merkle root, header), and the nonce search
//! runs until the header hash beats the difficulty target. Nonce
//! exhaustion refreshes the timestamp and retries; only cancellation
//! bounds the run.

pub mod assembler;
pub mod coordinator;
pub mod pow;

pub use assembler::{AssembleError, BlockAssembler, BlockTemplate, IntegrityError};
pub use coordinator::{
    AcceptedTx, CoordinatorError, RejectedTx, ValidationCoordinator, ValidationReport,
};
pub use pow::{MiningStats, SearchError};

use crate::core::{
    BlockHeader, DifficultyTarget, FeePolicy, NoScriptChecks, ScriptVerifier, Transaction,
    TransactionValidator, ValidationContext,
};
use chrono::Utc;
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

// =============================================================================
// Cancellation
// =============================================================================

/// Cooperative cancellation signal shared by the validation pool and the
/// proof-of-work search
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; observers stop at their next check
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for one mining run
#[derive(Debug, Clone)]
pub struct MinerConfig {
    /// Difficulty target the header hash must beat
    pub target: DifficultyTarget,
    /// Fee acceptance bounds
    pub fee_policy: FeePolicy,
    /// Reference height and time for locktime checks
    pub context: ValidationContext,
    /// Validation worker pool size (0 = one per available core)
    pub workers: usize,
    /// Address credited by the coinbase
    pub coinbase_address: String,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            target: DifficultyTarget::default(),
            fee_policy: FeePolicy::default(),
            context: ValidationContext::default(),
            workers: 0,
            coinbase_address: "miner".to_string(),
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Errors that abort a mining run
#[derive(Error, Debug)]
pub enum MiningError {
    #[error("Mining run cancelled")]
    Cancelled,
    #[error("Failed to build worker pool: {0}")]
    Pool(rayon::ThreadPoolBuildError),
    #[error(transparent)]
    Assembly(#[from] AssembleError),
}

impl From<CoordinatorError> for MiningError {
    fn from(err: CoordinatorError) -> Self {
        match err {
            CoordinatorError::Cancelled => MiningError::Cancelled,
            CoordinatorError::Pool(err) => MiningError::Pool(err),
        }
    }
}

// =============================================================================
// Miner
// =============================================================================

/// Result of a successful mining run
#[derive(Debug)]
pub struct MinedBlock {
    /// Header carrying the winning nonce
    pub header: BlockHeader,
    /// Synthesized coinbase transaction
    pub coinbase: Transaction,
    /// Identifier of the coinbase
    pub coinbase_txid: [u8; 32],
    /// Included transactions in inclusion order (coinbase excluded)
    pub transactions: Vec<AcceptedTx>,
    /// Search statistics
    pub stats: MiningStats,
}

/// Drives the full pipeline: validate, assemble, search
pub struct Miner<S: ScriptVerifier = NoScriptChecks> {
    config: MinerConfig,
    coordinator: ValidationCoordinator<S>,
    assembler: BlockAssembler,
}

impl Miner {
    pub fn new(config: MinerConfig) -> Self {
        Self::with_scripts(config, NoScriptChecks)
    }
}

impl<S: ScriptVerifier> Miner<S> {
    /// Use a custom script verifier in the validation stage
    pub fn with_scripts(config: MinerConfig, scripts: S) -> Self {
        let coordinator = ValidationCoordinator::new(
            TransactionValidator::with_scripts(config.fee_policy, scripts),
            config.context,
            config.workers,
        );
        let assembler = BlockAssembler::new(&config.coinbase_address);
        Self {
            config,
            coordinator,
            assembler,
        }
    }

    /// Mine a block from the given pending transactions
    ///
    /// On nonce exhaustion the header timestamp is refreshed and the
    /// search restarts over the same inclusion list.
    pub fn mine(
        &self,
        pending: &[Transaction],
        cancel: &CancelFlag,
    ) -> Result<MinedBlock, MiningError> {
        let report = self.coordinator.validate_all(pending, cancel)?;
        info!(
            "Mining over {} of {} pending transactions",
            report.accepted.len(),
            pending.len()
        );

        loop {
            let timestamp = Utc::now().timestamp() as u32;
            let template = self.assembler.assemble(&report.accepted, timestamp)?;

            match pow::search(&template.header, &self.config.target, cancel) {
                Ok((header, stats)) => {
                    return Ok(MinedBlock {
                        header,
                        coinbase: template.coinbase,
                        coinbase_txid: template.coinbase_txid,
                        transactions: template.transactions,
                        stats,
                    });
                }
                Err(SearchError::Exhausted) => {
                    warn!("Nonce space exhausted, refreshing timestamp and retrying");
                }
                Err(SearchError::Cancelled) => return Err(MiningError::Cancelled),
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Prevout, TxInput, TxOutput, BLOCK_REWARD};
    use std::thread;
    use std::time::Duration;

    fn make_tx(input: i64, output: i64) -> Transaction {
        Transaction {
            version: 1,
            vin: vec![TxInput {
                prevout: Some(Prevout {
                    value: input,
                    script_pubkey: "prev".to_string(),
                }),
            }],
            vout: vec![TxOutput {
                value: output,
                script_pubkey: "dest".to_string(),
            }],
            locktime: 0,
        }
    }

    fn easy_config() -> MinerConfig {
        MinerConfig {
            target: DifficultyTarget([0xff; 32]),
            ..MinerConfig::default()
        }
    }

    #[test]
    fn test_mine_end_to_end() {
        let pending = vec![
            make_tx(10_000, 9_000),
            make_tx(10_000, 10_000), // zero fee, rejected
            make_tx(20_000, 18_000),
        ];

        let miner = Miner::new(easy_config());
        let block = miner.mine(&pending, &CancelFlag::new()).unwrap();

        assert!(block.header.meets_target(&DifficultyTarget([0xff; 32])));
        assert_eq!(block.transactions.len(), 2);
        assert_eq!(
            block.coinbase.total_output(),
            (BLOCK_REWARD + 3_000) as i128
        );

        // Inclusion order matches input order of the accepted subset
        assert_eq!(block.transactions[0].txid, pending[0].txid().unwrap());
        assert_eq!(block.transactions[1].txid, pending[2].txid().unwrap());
    }

    #[test]
    fn test_mine_empty_mempool() {
        let miner = Miner::new(easy_config());
        let block = miner.mine(&[], &CancelFlag::new()).unwrap();

        assert!(block.transactions.is_empty());
        assert_eq!(block.header.merkle_root, block.coinbase_txid);
        assert_eq!(block.coinbase.total_output(), BLOCK_REWARD as i128);
    }

    #[test]
    fn test_mine_cancelled() {
        let config = MinerConfig {
            // Impossible target: nothing hashes strictly below zero
            target: DifficultyTarget([0u8; 32]),
            ..MinerConfig::default()
        };
        let miner = Miner::new(config);

        let cancel = CancelFlag::new();
        let canceller = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            canceller.cancel();
        });

        let result = miner.mine(&[make_tx(10_000, 9_000)], &cancel);
        handle.join().unwrap();
        assert!(matches!(result, Err(MiningError::Cancelled)));
    }
}
