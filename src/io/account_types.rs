//! Account type seed file loading
//!
//! Reads account type policies from CSV (see
//! [`crate::io::csv_format::AccountTypeCsvRecord`] for the columns) and
//! registers them. Unlike replay records, a bad seed row is fatal: a replay
//! against a partially seeded registry would produce misleading results.

use crate::core::AccountTypeRegistry;
use crate::io::csv_format::{convert_account_type_record, AccountTypeCsvRecord};
use crate::types::NewAccountType;
use csv::{ReaderBuilder, Trim};
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Parse every account type in a CSV source
///
/// # Errors
///
/// Returns the first parse or conversion error, prefixed with its line number.
pub fn read_account_types<R: Read>(source: R) -> Result<Vec<NewAccountType>, String> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(source);

    reader
        .deserialize::<AccountTypeCsvRecord>()
        .enumerate()
        .map(|(index, row)| {
            // Header is line 1
            let line = index + 2;
            row.map_err(|e| format!("Line {}: CSV parse error: {}", line, e))
                .and_then(|record| {
                    convert_account_type_record(record).map_err(|e| format!("Line {}: {}", line, e))
                })
        })
        .collect()
}

/// Register every account type of a seed file
///
/// # Returns
///
/// The number of registered account types.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a row cannot be parsed, or
/// the registry rejects a policy.
pub fn load_account_types(path: &Path, registry: &AccountTypeRegistry) -> Result<usize, String> {
    let file = std::fs::File::open(path)
        .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

    let policies = read_account_types(file)?;
    for policy in &policies {
        registry
            .create(policy.clone())
            .map_err(|e| format!("Account type {}: {}", policy.code, e))?;
    }

    info!(count = policies.len(), path = %path.display(), "account types loaded");
    Ok(policies.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PolicyLookup, RegistryConfig};
    use rust_decimal::Decimal;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SEED: &str = "code,name,minimum_balance,maximum_balance,interest_rate,monthly_fee,daily_limit,monthly_limit,is_active\n\
        SAV,Savings Account,100,100000,2.5,0,5000,20000,true\n\
        chk,Checking Account,25,50000,0.1,5,,,\n\
        OLD,Legacy Account,,,,,,,false\n";

    fn seed_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_read_account_types() {
        let policies = read_account_types(SEED.as_bytes()).unwrap();

        assert_eq!(policies.len(), 3);
        assert_eq!(policies[0].interest_rate, Decimal::new(25, 1));
        assert_eq!(policies[1].transaction_limit.daily, Decimal::new(10_000, 0));
        assert!(!policies[2].is_active);
    }

    #[test]
    fn test_read_account_types_reports_line() {
        let content = "code,name,minimum_balance\nSAV,Savings,abc\n";

        let error = read_account_types(content.as_bytes()).unwrap_err();

        assert!(error.starts_with("Line 2:"));
        assert!(error.contains("Invalid minimum_balance"));
    }

    #[test]
    fn test_load_account_types() {
        let file = seed_file(SEED);
        let registry = AccountTypeRegistry::new(RegistryConfig::default());

        let count = load_account_types(file.path(), &registry).unwrap();

        assert_eq!(count, 3);
        assert_eq!(registry.find_by_code("CHK").unwrap().monthly_fee.to_string(), "5.00");
        assert_eq!(registry.list(false).len(), 2);
    }

    #[test]
    fn test_load_account_types_rejects_invalid_policy() {
        let file = seed_file("code,name,minimum_balance,maximum_balance\nBAD,Broken,500,100\n");
        let registry = AccountTypeRegistry::new(RegistryConfig::default());

        let error = load_account_types(file.path(), &registry).unwrap_err();

        assert!(error.contains("BAD"));
    }

    #[test]
    fn test_load_account_types_missing_file() {
        let registry = AccountTypeRegistry::new(RegistryConfig::default());
        let result = load_account_types(Path::new("/nonexistent/types.csv"), &registry);
        assert!(result.unwrap_err().contains("Failed to open file"));
    }
}
