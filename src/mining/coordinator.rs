//! Parallel validation fan-out
//!
//! Spreads transaction validation across a bounded rayon worker pool,
//! created and torn down per batch. Results are collected by original
//! index, so the accepted subset keeps the input order the merkle
//! commitment depends on. A failing transaction is recorded and skipped;
//! it never aborts the batch.

use super::CancelFlag;
use crate::core::{
    NoScriptChecks, ScriptVerifier, Transaction, TransactionValidator, ValidationContext,
    ValidationError,
};
use log::{info, warn};
use rayon::prelude::*;
use thiserror::Error;

/// Errors that abort a validation batch
#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("Validation batch cancelled")]
    Cancelled,
    #[error("Failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// A transaction that passed validation, with its txid and fee captured
/// at validation time
#[derive(Debug, Clone)]
pub struct AcceptedTx {
    pub tx: Transaction,
    pub txid: [u8; 32],
    pub fee: u64,
}

/// A transaction excluded from the block, with the reason
#[derive(Debug, Clone)]
pub struct RejectedTx {
    /// Position of the transaction in the input batch
    pub index: usize,
    pub reason: ValidationError,
}

/// Outcome of validating a batch
#[derive(Debug)]
pub struct ValidationReport {
    /// Transactions accepted for inclusion, input order preserved
    pub accepted: Vec<AcceptedTx>,
    /// Excluded transactions with reasons
    pub rejected: Vec<RejectedTx>,
}

/// Fans a transaction batch out across a worker pool
pub struct ValidationCoordinator<S: ScriptVerifier = NoScriptChecks> {
    validator: TransactionValidator<S>,
    context: ValidationContext,
    workers: usize,
}

impl<S: ScriptVerifier> ValidationCoordinator<S> {
    /// Create a coordinator; `workers` of 0 sizes the pool to one thread
    /// per available core
    pub fn new(
        validator: TransactionValidator<S>,
        context: ValidationContext,
        workers: usize,
    ) -> Self {
        Self {
            validator,
            context,
            workers,
        }
    }

    /// Validate a batch, preserving input order among the accepted subset
    ///
    /// Workers share no mutable state: transactions are read-only and
    /// every result slot is owned by exactly one task. Cancellation aborts
    /// the batch without a partial report.
    pub fn validate_all(
        &self,
        transactions: &[Transaction],
        cancel: &CancelFlag,
    ) -> Result<ValidationReport, CoordinatorError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;

        let outcomes: Vec<Option<Result<AcceptedTx, ValidationError>>> = pool.install(|| {
            transactions
                .par_iter()
                .map(|tx| {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    Some(self.check_one(tx))
                })
                .collect()
        });

        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                None => return Err(CoordinatorError::Cancelled),
                Some(Ok(tx)) => accepted.push(tx),
                Some(Err(reason)) => {
                    warn!("Rejecting transaction {}: {}", index, reason);
                    rejected.push(RejectedTx { index, reason });
                }
            }
        }

        info!(
            "Validated {} transactions: {} accepted, {} rejected",
            transactions.len(),
            accepted.len(),
            rejected.len()
        );

        Ok(ValidationReport { accepted, rejected })
    }

    fn check_one(&self, tx: &Transaction) -> Result<AcceptedTx, ValidationError> {
        let fee = self.validator.validate(tx, &self.context)?;
        let txid = tx.txid()?;
        Ok(AcceptedTx {
            tx: tx.clone(),
            txid,
            fee,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FeePolicy, Prevout, TxInput, TxOutput};

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

    fn coordinator(workers: usize) -> ValidationCoordinator {
        ValidationCoordinator::new(
            TransactionValidator::new(FeePolicy::default()),
            ValidationContext::default(),
            workers,
        )
    }

    fn mixed_batch() -> Vec<Transaction> {
        (0..20)
            .map(|i| {
                if i % 3 == 0 {
                    // Fee of zero, below the minimum
                    make_tx(10_000, 10_000)
                } else {
                    // Valid, with a fee that varies by position
                    make_tx(10_000 + i, 9_000)
                }
            })
            .collect()
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let batch = mixed_batch();
        let cancel = CancelFlag::new();

        let sequential = coordinator(1).validate_all(&batch, &cancel).unwrap();
        let parallel = coordinator(4).validate_all(&batch, &cancel).unwrap();

        let seq_ids: Vec<[u8; 32]> = sequential.accepted.iter().map(|a| a.txid).collect();
        let par_ids: Vec<[u8; 32]> = parallel.accepted.iter().map(|a| a.txid).collect();
        assert_eq!(seq_ids, par_ids);

        let seq_rejects: Vec<usize> = sequential.rejected.iter().map(|r| r.index).collect();
        let par_rejects: Vec<usize> = parallel.rejected.iter().map(|r| r.index).collect();
        assert_eq!(seq_rejects, par_rejects);
    }

    #[test]
    fn test_accepted_preserves_input_order() {
        let batch: Vec<Transaction> = (0..8).map(|i| make_tx(10_000 + i, 9_000)).collect();
        let report = coordinator(4)
            .validate_all(&batch, &CancelFlag::new())
            .unwrap();

        assert_eq!(report.accepted.len(), 8);
        for (accepted, original) in report.accepted.iter().zip(&batch) {
            assert_eq!(accepted.txid, original.txid().unwrap());
        }
    }

    #[test]
    fn test_failures_are_isolated() {
        let batch = vec![
            make_tx(10_000, 9_000),
            make_tx(1_000, 9_000), // overspend
            make_tx(10_000, 9_000),
        ];
        let report = coordinator(2)
            .validate_all(&batch, &CancelFlag::new())
            .unwrap();

        assert_eq!(report.accepted.len(), 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].index, 1);
        assert!(matches!(
            report.rejected[0].reason,
            ValidationError::OutputsExceedInputs { .. }
        ));
    }

    #[test]
    fn test_fee_captured_per_transaction() {
        let batch = vec![make_tx(10_000, 9_000), make_tx(20_000, 18_500)];
        let report = coordinator(2)
            .validate_all(&batch, &CancelFlag::new())
            .unwrap();

        let fees: Vec<u64> = report.accepted.iter().map(|a| a.fee).collect();
        assert_eq!(fees, vec![1_000, 1_500]);
    }

    #[test]
    fn test_cancelled_batch() {
        let cancel = CancelFlag::new();
        cancel.cancel();

        let batch = vec![make_tx(10_000, 9_000)];
        let result = coordinator(2).validate_all(&batch, &cancel);
        assert!(matches!(result, Err(CoordinatorError::Cancelled)));
    }

    #[test]
    fn test_empty_batch() {
        let report = coordinator(2)
            .validate_all(&[], &CancelFlag::new())
            .unwrap();
        assert!(report.accepted.is_empty());
        assert!(report.rejected.is_empty());
    }
}
