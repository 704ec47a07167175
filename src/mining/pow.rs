//! Proof-of-work search
//!
//! Single-threaded nonce iteration over the header's 4-byte nonce field:
//! serialize, hash, compare against the target, increment. The search
//! starts from the header's current nonce and wraps modulo 2^32; arriving
//! back at the start without success is exhaustion, which the caller
//! recovers from by refreshing the header timestamp.

use super::CancelFlag;
use crate::core::{BlockHeader, DifficultyTarget};
use log::info;
use std::time::Instant;
use thiserror::Error;

/// Full size of the 4-byte nonce space
const NONCE_SPACE: u64 = 1 << 32;

/// How many nonces to try between cancellation checks
const CANCEL_CHECK_INTERVAL: u64 = 4096;

/// Search failures
#[derive(Error, Debug, PartialEq)]
pub enum SearchError {
    /// Recoverable: refresh the header timestamp and search again
    #[error("Nonce space exhausted without meeting the target")]
    Exhausted,
    #[error("Search cancelled")]
    Cancelled,
}

/// Search statistics
#[derive(Debug, Clone)]
pub struct MiningStats {
    /// Number of hash attempts
    pub hash_attempts: u64,
    /// Time taken in milliseconds
    pub time_ms: u128,
    /// Hash rate (hashes per second)
    pub hash_rate: f64,
}

/// Iterate nonces until the header hash is strictly below the target
pub fn search(
    header: &BlockHeader,
    target: &DifficultyTarget,
    cancel: &CancelFlag,
) -> Result<(BlockHeader, MiningStats), SearchError> {
    search_span(header, target, cancel, NONCE_SPACE)
}

fn search_span(
    header: &BlockHeader,
    target: &DifficultyTarget,
    cancel: &CancelFlag,
    span: u64,
) -> Result<(BlockHeader, MiningStats), SearchError> {
    let start = Instant::now();
    let mut candidate = header.clone();

    for attempt in 0..span {
        if attempt % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }

        if candidate.meets_target(target) {
            let stats = stats_for(attempt + 1, &start);
            info!(
                "Found nonce {} after {} attempts ({:.2} H/s)",
                candidate.nonce, stats.hash_attempts, stats.hash_rate
            );
            return Ok((candidate, stats));
        }

        candidate.nonce = candidate.nonce.wrapping_add(1);
    }

    Err(SearchError::Exhausted)
}

fn stats_for(attempts: u64, start: &Instant) -> MiningStats {
    let elapsed = start.elapsed().as_millis();
    let hash_rate = if elapsed > 0 {
        (attempts as f64) / (elapsed as f64 / 1000.0)
    } else {
        attempts as f64
    };

    MiningStats {
        hash_attempts: attempts,
        time_ms: elapsed,
        hash_rate,
    }
}

// =============================================================================
// Tests
// =============================================================================
