//! Mempool directory loader
//!
//! Reads pending transaction records from a directory of JSON files.
//! Files are visited in filename order so the resulting sequence, and
//! therefore the merkle commitment downstream, is reproducible across
//! runs.

use super::StorageError;
use crate::core::Transaction;
use log::{info, warn};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A mempool file holds either a single transaction record or a list
#[derive(Deserialize)]
#[serde(untagged)]
enum MempoolFile {
    One(Transaction),
    Many(Vec<Transaction>),
}

/// Load all pending transactions from a mempool directory
///
/// A file that fails to parse is logged and skipped; it never aborts the
/// load.
pub fn load_transactions(dir: &Path) -> Result<Vec<Transaction>, StorageError> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .collect::<Result<Vec<_>, io::Error>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.extension().map(|ext| ext == "json").unwrap_or(false))
        .collect();
    files.sort();

    let mut transactions = Vec::new();
    for path in &files {
        let data = fs::read_to_string(path)?;
        match serde_json::from_str::<MempoolFile>(&data) {
            Ok(MempoolFile::One(tx)) => transactions.push(tx),
            Ok(MempoolFile::Many(txs)) => transactions.extend(txs),
            Err(err) => warn!("Skipping {}: {}", path.display(), err),
        }
    }

    info!(
        "Loaded {} transactions from {} mempool files",
        transactions.len(),
        files.len()
    );
    Ok(transactions)
}

// =============================================================================
// Tests
// =============================================================================
