//! Synchronous processing strategy
//!
//! This module provides a sequential implementation of the
//! ProcessingStrategy trait. It orchestrates replay by coordinating between
//! the SyncReader (CSV input) and the OperationEngine (ledger operations).
//!
//! Records are streamed one at a time, so memory use is bounded by the
//! number of accounts, not by the size of the input.

use crate::io::csv_format::write_accounts_csv;
use crate::io::sync_reader::SyncReader;
use crate::strategy::{log_summary, LedgerConfig, ProcessingStrategy};
use std::io::Write;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct SyncProcessingStrategy {
    ledger: LedgerConfig,
}

impl SyncProcessingStrategy {
    pub fn new(ledger: LedgerConfig) -> Self {
        Self { ledger }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let engine = self.ledger.build_engine()?;
        let reader = SyncReader::new(input_path)?;

        let mut applied = 0usize;
        let mut failed = 0usize;
        for result in reader {
            match result {
                Ok(record) => {
                    let op = record.op_type.as_str();
                    let account = record.account.clone();
                    match engine.process(record) {
                        Ok(()) => applied += 1,
                        Err(e) => {
                            failed += 1;
                            warn!(op, account = %account, error = %e, "operation rejected");
                        }
                    }
                }
                Err(e) => {
                    failed += 1;
                    warn!(error = %e, "skipping record");
                }
            }
        }

        log_summary(&engine, applied, failed);
        write_accounts_csv(&engine.accounts(), output)?;
        Ok(())
    }
}
