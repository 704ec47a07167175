//! Cryptographic utilities for the mining pipeline
//!
//! This module provides:
//! - SHA-256 hashing
//! - Merkle root reduction

pub mod hash;
pub mod merkle;

pub use hash::{sha256, sha256_hex};
pub use merkle::{merkle_root, EMPTY_ROOT};
