//! Asynchronous batch processing strategy
//!
//! This module provides a multi-threaded implementation of the
//! ProcessingStrategy trait. It reads operations in batches and processes
//! each batch with account-based partitioning.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── BatchProcessor (account partitioning + tokio tasks)
//!     └── OperationEngine (shared, thread-safe)
//!         └── AccountService
//!             ├── InMemoryAccountRepository (DashMap)
//!             └── AccountTypeRegistry (DashMap + moka cache)
//! ```
//!
//! Batches are processed one after another, so operations on an account
//! that span several batches keep their file order. Inside a batch,
//! partitions that share no account run in parallel.

use crate::core::BatchProcessor;
use crate::io::async_reader::AsyncReader;
use crate::io::csv_format::write_accounts_csv;
use crate::strategy::{log_summary, LedgerConfig, ProcessingStrategy};
use std::io::Write;
use std::path::Path;
use tracing::warn;

/// Configuration for batch processing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of operations read per batch
    pub batch_size: usize,

    /// Number of runtime worker threads
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a BatchConfig, replacing zero values by the defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(default = default.batch_size, "invalid batch_size 0, using default");
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            warn!(
                default = default.max_concurrent_batches,
                "invalid max_concurrent_batches 0, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch processing strategy
#[derive(Debug, Clone, Default)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
    ledger: LedgerConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig, ledger: LedgerConfig) -> Self {
        Self { config, ledger }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let engine = self.ledger.build_engine()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        let (applied, failed) = runtime.block_on(async {
            let processor = BatchProcessor::new(engine.clone());

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| format!("Failed to open file '{}': {}", input_path.display(), e))?;
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let mut applied = 0usize;
            let mut failed = 0usize;
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                for outcome in processor.process_batch(batch).await {
                    match outcome.result {
                        Ok(()) => applied += 1,
                        Err(e) => {
                            failed += 1;
                            warn!(
                                op = outcome.record.op_type.as_str(),
                                account = %outcome.record.account,
                                error = %e,
                                "operation rejected"
                            );
                        }
                    }
                }
            }
            Ok::<_, String>((applied, failed))
        })?;

        log_summary(&engine, applied, failed);
        write_accounts_csv(&engine.accounts(), output)?;
        Ok(())
    }
}
