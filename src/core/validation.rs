//! Consensus-style transaction validation
//!
//! Pure rule checks applied to a single transaction. All chain context
//! (the reference height and time for locktime) is passed in explicitly,
//! so the rules are deterministic and testable in isolation. Rules run in
//! a fixed order and stop at the first failure.

use super::transaction::{EncodingError, Transaction, LOCKTIME_THRESHOLD, TX_VERSION};
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Default minimum accepted fee in smallest units
pub const DEFAULT_MIN_FEE: u64 = 1_000;

/// Default maximum accepted fee in smallest units
pub const DEFAULT_MAX_FEE: u64 = 1_000_000;

// =============================================================================
// Error Types
// =============================================================================

/// Reasons a transaction is excluded from the block
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Unsupported version {0}")]
    UnsupportedVersion(u32),
    #[error("Transaction has no inputs")]
    NoInputs,
    #[error("Transaction has no outputs")]
    NoOutputs,
    #[error("Negative output value {value} at index {index}")]
    NegativeOutput { index: usize, value: i64 },
    #[error("Input {0} is missing its prevout")]
    MissingPrevout(usize),
    #[error("Negative input value {value} at index {index}")]
    NegativeInput { index: usize, value: i64 },
    #[error("Outputs ({output}) exceed inputs ({input})")]
    OutputsExceedInputs { input: i128, output: i128 },
    #[error("Fee {fee} below minimum {min}")]
    FeeTooLow { fee: u64, min: u64 },
    #[error("Fee {fee} above maximum {max}")]
    FeeTooHigh { fee: u64, max: u64 },
    #[error("Locktime {locktime} not reached at height {height}, time {time}")]
    LocktimeNotReached { locktime: u32, height: u64, time: u64 },
    #[error("Script rejected: {0}")]
    ScriptRejected(String),
    #[error("Encoding failed: {0}")]
    Encoding(#[from] EncodingError),
}

// =============================================================================
// Configuration
// =============================================================================

/// Fee acceptance bounds, inclusive on both ends
///
/// A stand-in for a real fee-market policy: the floor rejects spam, the
/// ceiling rejects overpaying transactions that are almost certainly a
/// construction error.
#[derive(Debug, Clone, Copy)]
pub struct FeePolicy {
    pub min_fee: u64,
    pub max_fee: u64,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            min_fee: DEFAULT_MIN_FEE,
            max_fee: DEFAULT_MAX_FEE,
        }
    }
}

/// Chain reference point for locktime checks
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationContext {
    /// Current block height
    pub height: u64,
    /// Current Unix time in seconds
    pub time: u64,
}

// =============================================================================
// Script Hook
// =============================================================================

/// Hook for script and signature checks
///
/// The pipeline performs accounting and structural validation only; real
/// script execution plugs in here.
pub trait ScriptVerifier: Sync {
    fn verify(&self, tx: &Transaction) -> Result<(), ValidationError>;
}

/// Verifier that accepts every script
#[derive(Debug, Default, Clone, Copy)]
pub struct NoScriptChecks;

impl ScriptVerifier for NoScriptChecks {
    fn verify(&self, _tx: &Transaction) -> Result<(), ValidationError> {
        Ok(())
    }
}

// =============================================================================
// Validator
// =============================================================================

/// Applies the block-inclusion rule set to a single transaction
pub struct TransactionValidator<S = NoScriptChecks> {
    policy: FeePolicy,
    scripts: S,
}

impl TransactionValidator<NoScriptChecks> {
    pub fn new(policy: FeePolicy) -> Self {
        Self {
            policy,
            scripts: NoScriptChecks,
        }
    }
}

impl<S: ScriptVerifier> TransactionValidator<S> {
    /// Use a custom script verifier
    pub fn with_scripts(policy: FeePolicy, scripts: S) -> Self {
        Self { policy, scripts }
    }

    /// Validate a transaction for inclusion, returning its fee
    ///
    /// Rule order: structure, input validity, value conservation, fee
    /// bounds, locktime, then the script hook. The first failing rule
    /// returns immediately.
    pub fn validate(
        &self,
        tx: &Transaction,
        ctx: &ValidationContext,
    ) -> Result<u64, ValidationError> {
        check_structure(tx)?;
        check_inputs(tx)?;
        let fee = self.check_fee(tx)?;
        check_locktime(tx, ctx)?;
        self.scripts.verify(tx)?;
        Ok(fee)
    }

    /// Value conservation plus fee bounds
    fn check_fee(&self, tx: &Transaction) -> Result<u64, ValidationError> {
        let input = tx.total_input();
        let output = tx.total_output();
        if output > input {
            return Err(ValidationError::OutputsExceedInputs { input, output });
        }

        let fee = u64::try_from(input - output).unwrap_or(u64::MAX);
        if fee < self.policy.min_fee {
            return Err(ValidationError::FeeTooLow {
                fee,
                min: self.policy.min_fee,
            });
        }
        if fee > self.policy.max_fee {
            return Err(ValidationError::FeeTooHigh {
                fee,
                max: self.policy.max_fee,
            });
        }
        Ok(fee)
    }
}

fn check_structure(tx: &Transaction) -> Result<(), ValidationError> {
    if tx.version == 0 || tx.version > TX_VERSION {
        return Err(ValidationError::UnsupportedVersion(tx.version));
    }
    if tx.vin.is_empty() {
        return Err(ValidationError::NoInputs);
    }
    if tx.vout.is_empty() {
        return Err(ValidationError::NoOutputs);
    }
    for (index, output) in tx.vout.iter().enumerate() {
        if output.value < 0 {
            return Err(ValidationError::NegativeOutput {
                index,
                value: output.value,
            });
        }
    }
    Ok(())
}

fn check_inputs(tx: &Transaction) -> Result<(), ValidationError> {
    for (index, input) in tx.vin.iter().enumerate() {
        match &input.prevout {
            None => return Err(ValidationError::MissingPrevout(index)),
            Some(prevout) if prevout.value < 0 => {
                return Err(ValidationError::NegativeInput {
                    index,
                    value: prevout.value,
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Locktime 0 is always final; otherwise the field is a height or a
/// timestamp by the threshold rule and must not be in the future relative
/// to its reference.
fn check_locktime(tx: &Transaction, ctx: &ValidationContext) -> Result<(), ValidationError> {
    if tx.locktime == 0 {
        return Ok(());
    }

    let reference = if tx.locktime < LOCKTIME_THRESHOLD {
        ctx.height
    } else {
        ctx.time
    };

    if tx.locktime as u64 > reference {
        return Err(ValidationError::LocktimeNotReached {
            locktime: tx.locktime,
            height: ctx.height,
            time: ctx.time,
        });
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
