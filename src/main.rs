//! Blocksmith CLI
//!
//! Command-line front end for the block assembly and mining pipeline.

use blocksmith::core::{
    DifficultyTarget, FeePolicy, TransactionValidator, ValidationContext, DEFAULT_MAX_FEE,
    DEFAULT_MIN_FEE, DEFAULT_TARGET_HEX,
};
use blocksmith::mining::{CancelFlag, Miner, MinerConfig, ValidationCoordinator};
use blocksmith::storage;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use log::error;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "blocksmith")]
#[command(version = "0.1.0")]
#[command(about = "Assemble and mine a block from a mempool of pending transactions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the mempool, assemble a block, and run the nonce search
    Mine {
        /// Directory of pending transaction JSON files
        #[arg(short, long, default_value = "mempool")]
        mempool: PathBuf,

        /// Output file for the mined block
        #[arg(short, long, default_value = "output.txt")]
        output: PathBuf,

        /// Address credited by the coinbase
        #[arg(short, long, default_value = "miner")]
        address: String,

        /// Difficulty target as 64 hex characters
        #[arg(short, long, default_value = DEFAULT_TARGET_HEX)]
        target: String,

        #[command(flatten)]
        options: ValidationOptions,
    },

    /// Validate the mempool and report accepted/rejected transactions
    Validate {
        /// Directory of pending transaction JSON files
        #[arg(short, long, default_value = "mempool")]
        mempool: PathBuf,

        #[command(flatten)]
        options: ValidationOptions,
    },
}

#[derive(Args)]
struct ValidationOptions {
    /// Minimum accepted transaction fee in smallest units
    #[arg(long, default_value_t = DEFAULT_MIN_FEE)]
    min_fee: u64,

    /// Maximum accepted transaction fee in smallest units
    #[arg(long, default_value_t = DEFAULT_MAX_FEE)]
    max_fee: u64,

    /// Validation worker pool size (0 = one per available core)
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// Reference block height for locktime checks
    #[arg(long, default_value_t = 0)]
    height: u64,

    /// Reference Unix time for locktime checks (defaults to now)
    #[arg(long)]
    time: Option<u64>,
}

impl ValidationOptions {
    fn fee_policy(&self) -> FeePolicy {
        FeePolicy {
            min_fee: self.min_fee,
            max_fee: self.max_fee,
        }
    }

    fn context(&self) -> ValidationContext {
        ValidationContext {
            height: self.height,
            time: self
                .time
                .unwrap_or_else(|| Utc::now().timestamp() as u64),
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!("{}", err);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Mine {
            mempool,
            output,
            address,
            target,
            options,
        } => {
            let config = MinerConfig {
                target: DifficultyTarget::from_hex(&target)?,
                fee_policy: options.fee_policy(),
                context: options.context(),
                workers: options.workers,
                coinbase_address: address,
            };

            let pending = storage::load_transactions(&mempool)?;
            let block = Miner::new(config).mine(&pending, &CancelFlag::new())?;
            storage::write_result(&output, &block)?;

            println!(
                "Mined block with nonce {} ({} transactions, {} attempts, {:.2} H/s)",
                block.header.nonce,
                block.transactions.len(),
                block.stats.hash_attempts,
                block.stats.hash_rate
            );
        }
        Commands::Validate { mempool, options } => {
            let pending = storage::load_transactions(&mempool)?;
            let coordinator = ValidationCoordinator::new(
                TransactionValidator::new(options.fee_policy()),
                options.context(),
                options.workers,
            );
            let report = coordinator.validate_all(&pending, &CancelFlag::new())?;

            println!(
                "{} of {} transactions accepted, {} rejected",
                report.accepted.len(),
                pending.len(),
                report.rejected.len()
            );
            for rejection in &report.rejected {
                println!("  tx {}: {}", rejection.index, rejection.reason);
            }
        }
    }

    Ok(())
}
