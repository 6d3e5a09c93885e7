use crate::strategy::{BatchConfig, LedgerConfig};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Replay ledger operations against an in-memory account ledger
#[derive(Parser, Debug)]
#[command(name = "ledger-engine")]
#[command(
    about = "Replay ledger operations from CSV and print the resulting account balances",
    long_about = None
)]
pub struct CliArgs {
    /// Input CSV file path containing operation records
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// Processing strategy used to replay the operations
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for sequential or 'async' for partitioned batches"
    )]
    pub strategy: StrategyType,

    /// Number of operations per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of operations per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of worker threads processing partitions (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Account type seed file
    #[arg(
        long = "account-types",
        value_name = "PATH",
        help = "CSV file of account types to register instead of the built-in SAV and CHK types"
    )]
    pub account_types: Option<PathBuf>,

    /// Seed for account number generation
    #[arg(
        long = "seed",
        value_name = "SEED",
        help = "Seed making generated account numbers reproducible"
    )]
    pub seed: Option<u64>,
}

/// Available processing strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing values fall back to the defaults; zero values are replaced by
    /// the defaults with a warning (see [`BatchConfig::new`]).
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    /// Ledger setup shared by both strategies
    pub fn to_ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            account_types: self.account_types.clone(),
            seed: self.seed,
        }
    }
}
