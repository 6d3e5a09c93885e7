//! CSV format handling for operation records, account types and account output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserializing replay operations
//! - AccountTypeCsvRecord structure for deserializing account type seeds
//! - Conversion from CSV records to domain types
//! - Account output serialization
//!
//! All functions are pure (no I/O) for easy testing.

use crate::types::{
    Account, AccountRef, Currency, NewAccountType, OperationRecord, OperationType, Role,
    TransactionLimit,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// CSV record structure for deserialization
///
/// Matches the input CSV format with columns:
/// type, account, target, amount, account_type, branch, currency, role, reason
///
/// Only `type` and `account` are always present; which of the other columns
/// are needed depends on the operation type.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct CsvRecord {
    #[serde(rename = "type")]
    pub op_type: String,
    pub account: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Convert a CsvRecord to an OperationRecord
///
/// This function:
/// - Parses the operation type string into an OperationType enum
/// - Parses the amount string into a Decimal (if present)
/// - Validates that amounts are present for the types that need one
/// - Parses currency and role, defaulting the role to `customer`
///
/// # Arguments
///
/// * `csv_record` - The deserialized CSV record
///
/// # Returns
///
/// Result containing either:
/// - Ok(OperationRecord) - Successfully converted record
/// - Err(String) - Error message describing the conversion failure
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<OperationRecord, String> {
    let op_type = match csv_record.op_type.trim().to_lowercase().as_str() {
        "open" => OperationType::Open,
        "credit" => OperationType::Credit,
        "debit" => OperationType::Debit,
        "transfer" => OperationType::Transfer,
        "adjust_credit" => OperationType::AdjustCredit,
        "adjust_debit" => OperationType::AdjustDebit,
        "close" => OperationType::Close,
        "reactivate" => OperationType::Reactivate,
        "suspend" => OperationType::Suspend,
        "deactivate" => OperationType::Deactivate,
        "overdraft" => OperationType::Overdraft,
        _ => {
            return Err(format!(
                "Invalid operation type: '{}' for account {}",
                csv_record.op_type, csv_record.account
            ))
        }
    };

    let account = csv_record.account.trim().to_string();
    if account.is_empty() {
        return Err(format!("{} operation without an account", op_type.as_str()));
    }

    let amount = match non_empty(csv_record.amount) {
        Some(amount_str) => match Decimal::from_str(&amount_str) {
            Ok(decimal) => Some(decimal),
            Err(_) => {
                return Err(format!(
                    "Invalid amount '{}' for account {}",
                    amount_str, account
                ))
            }
        },
        None => None,
    };
    if op_type.requires_amount() && amount.is_none() {
        return Err(format!(
            "{} operation for account {} requires an amount",
            op_type.as_str(),
            account
        ));
    }

    let currency = non_empty(csv_record.currency)
        .map(|code| Currency::from_str(&code))
        .transpose()?;
    let role = non_empty(csv_record.role)
        .map(|role| Role::from_str(&role))
        .transpose()?
        .unwrap_or_default();

    Ok(OperationRecord {
        op_type,
        account,
        target: non_empty(csv_record.target),
        amount,
        account_type: non_empty(csv_record.account_type),
        branch: non_empty(csv_record.branch),
        currency,
        role,
        reason: non_empty(csv_record.reason),
    })
}

/// Account type seed record
///
/// Columns: code, name, minimum_balance, maximum_balance, interest_rate,
/// monthly_fee, daily_limit, monthly_limit, is_active. Every column except
/// `code` and `name` may be left empty to use the registry default.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct AccountTypeCsvRecord {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub minimum_balance: Option<String>,
    #[serde(default)]
    pub maximum_balance: Option<String>,
    #[serde(default)]
    pub interest_rate: Option<String>,
    #[serde(default)]
    pub monthly_fee: Option<String>,
    #[serde(default)]
    pub daily_limit: Option<String>,
    #[serde(default)]
    pub monthly_limit: Option<String>,
    #[serde(default)]
    pub is_active: Option<String>,
}

/// Convert an AccountTypeCsvRecord to registry input
///
/// Range checks are left to the registry; this only parses.
pub fn convert_account_type_record(record: AccountTypeCsvRecord) -> Result<NewAccountType, String> {
    let defaults = NewAccountType::new(record.code.trim(), record.name.trim());
    let code = defaults.code.clone();
    let decimal = |field: &str, value: Option<String>, default: Decimal| match non_empty(value) {
        Some(raw) => Decimal::from_str(&raw)
            .map_err(|_| format!("Invalid {} '{}' for account type {}", field, raw, code)),
        None => Ok(default),
    };

    let minimum = decimal("minimum_balance", record.minimum_balance, defaults.minimum_balance)?;
    let maximum = decimal("maximum_balance", record.maximum_balance, defaults.maximum_balance)?;
    let rate = decimal("interest_rate", record.interest_rate, defaults.interest_rate)?;
    let fee = decimal("monthly_fee", record.monthly_fee, defaults.monthly_fee)?;
    let limit = TransactionLimit {
        daily: decimal("daily_limit", record.daily_limit, defaults.transaction_limit.daily)?,
        monthly: decimal(
            "monthly_limit",
            record.monthly_limit,
            defaults.transaction_limit.monthly,
        )?,
    };
    let is_active = match non_empty(record.is_active) {
        Some(raw) => bool::from_str(&raw.to_lowercase())
            .map_err(|_| format!("Invalid is_active '{}' for account type {}", raw, code))?,
        None => true,
    };

    let mut input = defaults
        .with_balance_bounds(minimum, maximum)
        .with_interest_rate(rate)
        .with_monthly_fee(fee)
        .with_transaction_limit(limit);
    if !is_active {
        input = input.inactive();
    }
    Ok(input)
}

/// Write account states to CSV format
///
/// Writes accounts in CSV format with columns:
/// account, status, currency, balance, available, overdraft_limit, overdraft_used
/// Accounts are sorted by reference for deterministic output, and amounts
/// are written with two decimal places.
///
/// # Arguments
///
/// * `accounts` - Account states paired with their replay reference
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_accounts_csv(
    accounts: &[(AccountRef, Account)],
    output: &mut dyn Write,
) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record([
            "account",
            "status",
            "currency",
            "balance",
            "available",
            "overdraft_limit",
            "overdraft_used",
        ])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted: Vec<&(AccountRef, Account)> = accounts.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    for (reference, account) in sorted {
        writer
            .write_record(&[
                reference.clone(),
                account.status.to_string(),
                account.currency.to_string(),
                format!("{:.2}", account.balance),
                format!("{:.2}", account.available_balance),
                format!("{:.2}", account.overdraft_limit),
                format!("{:.2}", account.overdraft_used),
            ])
            .map_err(|e| format!("Failed to write account record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AccountStatus, Branch};
    use rstest::rstest;
    use uuid::Uuid;

    fn record(op_type: &str, amount: Option<&str>) -> CsvRecord {
        CsvRecord {
            op_type: op_type.to_string(),
            account: "alice".to_string(),
            amount: amount.map(|s| s.to_string()),
            ..CsvRecord::default()
        }
    }

    #[rstest]
    #[case("open", OperationType::Open)]
    #[case("credit", OperationType::Credit)]
    #[case("DEBIT", OperationType::Debit)] // case insensitive
    #[case("transfer", OperationType::Transfer)]
    #[case("adjust_credit", OperationType::AdjustCredit)]
    #[case("Overdraft", OperationType::Overdraft)]
    fn test_convert_csv_record_with_amount(#[case] op_type: &str, #[case] expected: OperationType) {
        let result = convert_csv_record(record(op_type, Some("100.5")));

        let record = result.unwrap();
        assert_eq!(record.op_type, expected);
        assert_eq!(record.account, "alice");
        assert_eq!(record.amount, Some(Decimal::new(1005, 1)));
        assert_eq!(record.role, Role::Customer);
    }

    #[rstest]
    #[case("close", OperationType::Close)]
    #[case("reactivate", OperationType::Reactivate)]
    #[case("suspend", OperationType::Suspend)]
    #[case("deactivate", OperationType::Deactivate)]
    fn test_convert_csv_record_without_amount(
        #[case] op_type: &str,
        #[case] expected: OperationType,
    ) {
        let record = convert_csv_record(record(op_type, None)).unwrap();
        assert_eq!(record.op_type, expected);
        assert_eq!(record.amount, None);
    }

    #[rstest]
    #[case::invalid_type("withdraw", Some("100.0"), "Invalid operation type")]
    #[case::credit_missing_amount("credit", None, "requires an amount")]
    #[case::open_missing_amount("open", None, "requires an amount")]
    #[case::invalid_amount("debit", Some("ten"), "Invalid amount")]
    #[case::empty_amount("credit", Some(""), "requires an amount")]
    #[case::whitespace_amount("credit", Some("  "), "requires an amount")]
    fn test_convert_csv_record_errors(
        #[case] op_type: &str,
        #[case] amount: Option<&str>,
        #[case] expected_error: &str,
    ) {
        let result = convert_csv_record(record(op_type, amount));
        assert!(result.unwrap_err().contains(expected_error));
    }

    #[test]
    fn test_convert_csv_record_optional_columns() {
        let csv_record = CsvRecord {
            op_type: "open".to_string(),
            account: " bob ".to_string(),
            target: Some("".to_string()),
            amount: Some("250".to_string()),
            account_type: Some("sav".to_string()),
            branch: Some("NYC".to_string()),
            currency: Some("eur".to_string()),
            role: Some("admin".to_string()),
            reason: Some("  ".to_string()),
        };

        let record = convert_csv_record(csv_record).unwrap();

        assert_eq!(record.account, "bob");
        assert_eq!(record.target, None);
        assert_eq!(record.account_type.as_deref(), Some("sav"));
        assert_eq!(record.branch.as_deref(), Some("NYC"));
        assert_eq!(record.currency, Some(Currency::Eur));
        assert_eq!(record.role, Role::Admin);
        assert_eq!(record.reason, None);
    }

    #[rstest]
    #[case::bad_currency(Some("JPY"), None, "Invalid currency")]
    #[case::bad_role(None, Some("root"), "Invalid role")]
    fn test_convert_csv_record_bad_enums(
        #[case] currency: Option<&str>,
        #[case] role: Option<&str>,
        #[case] expected_error: &str,
    ) {
        let csv_record = CsvRecord {
            currency: currency.map(str::to_string),
            role: role.map(str::to_string),
            ..record("credit", Some("1"))
        };
        assert!(convert_csv_record(csv_record)
            .unwrap_err()
            .contains(expected_error));
    }

    #[test]
    fn test_convert_account_type_record_defaults() {
        let record = AccountTypeCsvRecord {
            code: "biz".to_string(),
            name: "Business".to_string(),
            interest_rate: Some("1.5".to_string()),
            ..AccountTypeCsvRecord::default()
        };

        let input = convert_account_type_record(record).unwrap();

        assert_eq!(input.code, "biz");
        assert_eq!(input.interest_rate, Decimal::new(15, 1));
        assert_eq!(input.maximum_balance, Decimal::new(1_000_000, 0));
        assert_eq!(input.transaction_limit.daily, Decimal::new(10_000, 0));
        assert!(input.is_active);
    }

    #[rstest]
    #[case::bad_decimal(Some("lots"), None, "Invalid minimum_balance")]
    #[case::bad_flag(None, Some("maybe"), "Invalid is_active")]
    fn test_convert_account_type_record_errors(
        #[case] minimum: Option<&str>,
        #[case] is_active: Option<&str>,
        #[case] expected_error: &str,
    ) {
        let record = AccountTypeCsvRecord {
            code: "BIZ".to_string(),
            name: "Business".to_string(),
            minimum_balance: minimum.map(str::to_string),
            is_active: is_active.map(str::to_string),
            ..AccountTypeCsvRecord::default()
        };
        assert!(convert_account_type_record(record)
            .unwrap_err()
            .contains(expected_error));
    }

    #[test]
    fn test_convert_account_type_record_inactive() {
        let record = AccountTypeCsvRecord {
            code: "OLD".to_string(),
            name: "Legacy".to_string(),
            is_active: Some("FALSE".to_string()),
            ..AccountTypeCsvRecord::default()
        };
        assert!(!convert_account_type_record(record).unwrap().is_active);
    }

    fn output_account(balance: i64, overdraft_used: i64, status: AccountStatus) -> Account {
        let mut account = Account::new(
            Uuid::new_v4(),
            "owner",
            Branch {
                code: "NYC".to_string(),
                name: "NYC".to_string(),
                address: None,
            },
            Currency::Usd,
            Decimal::new(balance, 2),
            status,
        );
        account.overdraft_limit = Decimal::new(5_000, 2);
        account.overdraft_used = Decimal::new(overdraft_used, 2);
        account
    }

    #[rstest]
    #[case::empty(vec![], "account,status,currency,balance,available,overdraft_limit,overdraft_used\n")]
    #[case::sorted_by_reference(
        vec![
            ("bob".to_string(), output_account(0, 2_000, AccountStatus::Active)),
            ("alice".to_string(), output_account(12_345, 0, AccountStatus::Closed)),
        ],
        "account,status,currency,balance,available,overdraft_limit,overdraft_used\n\
         alice,closed,USD,123.45,123.45,50.00,0.00\n\
         bob,active,USD,0.00,0.00,50.00,20.00\n"
    )]
    fn test_write_accounts_csv(
        #[case] accounts: Vec<(AccountRef, Account)>,
        #[case] expected: &str,
    ) {
        let mut output = Vec::new();

        write_accounts_csv(&accounts, &mut output).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), expected);
    }
}
