//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over operation records from a CSV file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding
//! `Result<OperationRecord, String>` for each CSV row:
//!
//! ```no_run
//! use rust_ledger_engine::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("operations.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(record) => println!("Processing operation: {:?}", record),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual record parsing errors are yielded as Err variants in the iterator
//! - Line numbers are included in error messages for debugging
//!
//! Records are read one at a time, so memory use does not grow with the
//! file size.

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::OperationRecord;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

/// Synchronous CSV reader
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: usize,
}

impl SyncReader {
    /// Create a new SyncReader from a file path
    ///
    /// The CSV reader is configured to:
    /// - Trim whitespace from all fields
    /// - Allow flexible field counts (trailing optional columns may be omitted)
    /// - Use an 8KB buffer for efficient I/O
    ///
    /// # Errors
    ///
    /// Returns an error message if the file could not be opened.
    pub fn new(path: &Path) -> Result<Self, String> {
        let file = File::open(path)
            .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 0,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<OperationRecord, String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CsvRecord>();
        let row = deserializer.next()?;
        self.line_num += 1;

        // Header occupies line 1
        let line = self.line_num + 1;
        Some(match row {
            Ok(csv_record) => convert_csv_record(csv_record).map_err(|e| format!("Line {}: {}", line, e)),
            Err(e) => Err(format!("Line {}: CSV parse error: {}", line, e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OperationType, Role};
    use rust_decimal::Decimal;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    const HEADER: &str = "type,account,target,amount,account_type,branch,currency,role,reason\n";

    #[test]
    fn test_sync_reader_fails_on_missing_file() {
        let result = SyncReader::new(Path::new("nonexistent.csv"));
        assert!(result.unwrap_err().contains("Failed to open file"));
    }

    #[test]
    fn test_sync_reader_reads_open_record() {
        let file = create_temp_csv(&format!("{}open,alice,,150.00,SAV,NYC,EUR,,\n", HEADER));

        let records: Vec<_> = SyncReader::new(file.path()).unwrap().collect();

        assert_eq!(records.len(), 1);
        let record = records[0].as_ref().unwrap();
        assert_eq!(record.op_type, OperationType::Open);
        assert_eq!(record.account, "alice");
        assert_eq!(record.amount, Some(Decimal::new(15000, 2)));
        assert_eq!(record.account_type.as_deref(), Some("SAV"));
        assert_eq!(record.branch.as_deref(), Some("NYC"));
        assert_eq!(record.role, Role::Customer);
    }

    #[test]
    fn test_sync_reader_accepts_short_rows() {
        let file = create_temp_csv(&format!(
            "{}credit,alice,,10\nclose,alice\ntransfer,alice,bob,5\n",
            HEADER
        ));

        let records: Vec<_> = SyncReader::new(file.path()).unwrap().collect();

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.is_ok()));
        let transfer = records[2].as_ref().unwrap();
        assert_eq!(transfer.target.as_deref(), Some("bob"));
    }

    #[test]
    fn test_sync_reader_handles_malformed_record() {
        let file = create_temp_csv(&format!("{}credit,alice,,ten\ndebit,alice,,5\n", HEADER));

        let records: Vec<_> = SyncReader::new(file.path()).unwrap().collect();

        assert_eq!(records.len(), 2);
        let error = records[0].as_ref().unwrap_err();
        assert!(error.contains("Line 2"));
        assert!(error.contains("Invalid amount"));
        assert!(records[1].is_ok());
    }

    #[test]
    fn test_sync_reader_empty_file() {
        let file = create_temp_csv(HEADER);
        assert_eq!(SyncReader::new(file.path()).unwrap().count(), 0);
    }
}
