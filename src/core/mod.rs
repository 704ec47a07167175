//! Core pipeline components
//!
//! This module contains the fundamental building blocks:
//! - Transactions (inline-prevout model with locktime)
//! - Canonical transaction encoding and txid computation
//! - Consensus-style validation rules with a pluggable script hook
//! - Block headers and difficulty targets

pub mod block;
pub mod transaction;
pub mod validation;

pub use block::{
    BlockHeader, DifficultyTarget, TargetError, BLOCK_HEADER_SIZE, DEFAULT_TARGET_HEX,
};
pub use transaction::{
    EncodingError, Prevout, Transaction, TxInput, TxOutput, BLOCK_REWARD, LOCKTIME_THRESHOLD,
    TX_VERSION,
};
pub use validation::{
    FeePolicy, NoScriptChecks, ScriptVerifier, TransactionValidator, ValidationContext,
    ValidationError, DEFAULT_MAX_FEE, DEFAULT_MIN_FEE,
};
