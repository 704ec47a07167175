//! Storage collaborators for the mining pipeline
//!
//! This module provides:
//! - Mempool directory loader (JSON transaction records)
//! - Result file writer

pub mod mempool_dir;
pub mod output;

use crate::core::EncodingError;
use std::io;
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Encoding error: {0}")]
    EncodingError(#[from] EncodingError),
}

pub use mempool_dir::load_transactions;
pub use output::write_result;
