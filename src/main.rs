//! Ledger Engine CLI
//!
//! Replays ledger operations from a CSV file and prints the final account
//! states.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- operations.csv > accounts.csv
//! cargo run -- --strategy sync operations.csv > accounts.csv
//! cargo run -- --strategy async --batch-size 2000 --max-concurrent 8 operations.csv > accounts.csv
//! cargo run -- --account-types types.csv --seed 42 operations.csv > accounts.csv
//! ```
//!
//! Logs go to stderr; the level defaults to `warn` and is set with `RUST_LOG`.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, invalid account type file, etc.)

use rust_ledger_engine::cli;
use rust_ledger_engine::strategy;
use std::process;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let args = cli::parse_args();

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_batch_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy, config, args.to_ledger_config())
    };

    let mut output = std::io::stdout();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        tracing::error!(error = %e, "replay failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
