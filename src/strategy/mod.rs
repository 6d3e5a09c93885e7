//! Processing strategy module for operation replay
//!
//! This module defines the Strategy pattern for complete replay pipelines,
//! covering CSV parsing and operation processing. Different implementations
//! (sequential, partitioned batches) can be selected at runtime and must
//! produce the same final account states for the same input.

use crate::cli::StrategyType;
use crate::core::{
    AccountService, AccountTypeRegistry, OperationEngine, RegistryConfig, ServiceConfig,
};
use crate::io::load_account_types;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Ledger setup shared by every strategy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Account type seed file; the built-in SAV and CHK types when unset
    pub account_types: Option<PathBuf>,

    /// Seed for account number generation
    pub seed: Option<u64>,
}

impl LedgerConfig {
    /// Build a fresh operation engine over an in-memory ledger
    ///
    /// # Errors
    ///
    /// Returns an error if the account type seed file cannot be loaded.
    pub fn build_engine(&self) -> Result<Arc<OperationEngine>, String> {
        let registry = match &self.account_types {
            Some(path) => {
                let registry = AccountTypeRegistry::new(RegistryConfig::default());
                load_account_types(path, &registry)?;
                registry
            }
            None => AccountTypeRegistry::with_defaults(RegistryConfig::default())
                .map_err(|e| format!("Failed to register default account types: {}", e))?,
        };

        let service = AccountService::in_memory(
            Arc::new(registry),
            ServiceConfig {
                number_seed: self.seed,
                ..ServiceConfig::default()
            },
        );
        Ok(Arc::new(OperationEngine::new(Arc::new(service))))
    }
}

/// Processing strategy trait for complete replay pipelines
///
/// Each strategy reads operation records from a CSV file, applies them to a
/// fresh ledger, and writes the final account states to output.
pub trait ProcessingStrategy: Send + Sync {
    /// Replay the operations of `input_path` and write account states to `output`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input file or the account type seed file cannot be opened
    /// - Output cannot be written
    ///
    /// A record that fails (bad row, policy violation, unauthorized role)
    /// is logged and skipped; it never fails the whole replay.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String>;
}

/// Create a processing strategy based on the specified strategy type
///
/// `config` only applies to the async strategy.
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
    ledger: LedgerConfig,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(ledger)),
        StrategyType::Async => Box::new(AsyncProcessingStrategy::new(
            config.unwrap_or_default(),
            ledger,
        )),
    }
}

/// Log the replay summary
fn log_summary(engine: &OperationEngine, applied: usize, failed: usize) {
    let statistics = engine.service().statistics();
    info!(
        applied,
        failed,
        accounts = statistics.total_accounts,
        active = statistics.by_status.active,
        closed = statistics.by_status.closed,
        total_balance = %statistics.total_balance,
        "replay finished"
    );
}
