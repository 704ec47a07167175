//! Result file writer
//!
//! Writes the mined block as newline-separated text in a fixed order:
//! header hex, coinbase serialization hex, coinbase txid, then one txid
//! per included transaction in inclusion order.

use super::StorageError;
use crate::mining::MinedBlock;
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write the mining result to a text file
pub fn write_result(path: &Path, block: &MinedBlock) -> Result<(), StorageError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{}", block.header.to_hex())?;
    writeln!(writer, "{}", hex::encode(block.coinbase.serialize()?))?;
    writeln!(writer, "{}", hex::encode(block.coinbase_txid))?;
    for tx in &block.transactions {
        writeln!(writer, "{}", hex::encode(tx.txid))?;
    }
    writer.flush()?;

    info!(
        "Wrote block with {} transactions to {}",
        block.transactions.len(),
        path.display()
    );
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DifficultyTarget, Transaction};
    use crate::mining::{CancelFlag, Miner, MinerConfig};
    use std::fs;

    fn mined_block() -> MinedBlock {
        let pending = vec![Transaction {
            version: 1,
            vin: vec![crate::core::TxInput {
                prevout: Some(crate::core::Prevout {
                    value: 10_000,
                    script_pubkey: "aa".to_string(),
                }),
            }],
            vout: vec![crate::core::TxOutput {
                value: 9_000,
                script_pubkey: "bb".to_string(),
            }],
            locktime: 0,
        }];

        let config = MinerConfig {
            target: DifficultyTarget([0xff; 32]),
            ..MinerConfig::default()
        };
        Miner::new(config)
            .mine(&pending, &CancelFlag::new())
            .unwrap()
    }

    #[test]
    fn test_output_line_layout() {
        let block = mined_block();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.txt");

        write_result(&path, &block).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines.len(), 3 + block.transactions.len());
        assert_eq!(lines[0], block.header.to_hex());
        assert_eq!(lines[1], hex::encode(block.coinbase.serialize().unwrap()));
        assert_eq!(lines[2], hex::encode(block.coinbase_txid));
        assert_eq!(lines[3], hex::encode(block.transactions[0].txid));
    }
}
