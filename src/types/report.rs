//! Read-only results produced by the ledger and the account service

use super::account::{Account, BalanceSnapshot, Currency};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Result of a minimum balance compliance check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimumBalanceCheck {
    pub is_violated: bool,
    /// Minimum balance of the account type
    pub required: Decimal,
    /// Current balance
    pub current: Decimal,
    /// `max(0, required - current)`
    pub shortage: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverdraftSummary {
    pub limit: Decimal,
    pub used: Decimal,
    pub available: Decimal,
}

/// Account statement
#[derive(Debug, Clone, PartialEq)]
pub struct AccountStatement {
    pub account_number: String,
    /// Code of the account type, if it still exists
    pub account_type: Option<String>,
    pub currency: Currency,
    pub balance: BalanceSnapshot,
    /// Period the projected interest covers
    pub interest_days: u32,
    pub projected_interest: Decimal,
    pub minimum_balance: MinimumBalanceCheck,
    pub overdraft: OverdraftSummary,
    pub generated_at: DateTime<Utc>,
}

/// Both sides of a completed transfer
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    pub source: Account,
    pub destination: Account,
    pub amount: Decimal,
}

/// One page of results
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub limit: usize,
    /// Number of matching items across all pages
    pub total: usize,
    pub total_pages: usize,
}

/// Number of accounts per status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub pending: usize,
    pub active: usize,
    pub inactive: usize,
    pub suspended: usize,
    pub closed: usize,
}

/// Count and balance sum of a group of accounts
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GroupTotal {
    pub count: usize,
    pub total_balance: Decimal,
}

/// Portfolio statistics
///
/// Balance totals only include accounts that are not closed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccountStatistics {
    pub total_accounts: usize,
    pub by_status: StatusCounts,
    pub total_balance: Decimal,
    /// Keyed by account type code
    pub by_type: BTreeMap<String, GroupTotal>,
    /// Keyed by branch code
    pub by_branch: BTreeMap<String, GroupTotal>,
}
