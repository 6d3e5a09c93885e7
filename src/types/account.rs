//! Account-related types for the ledger engine
//!
//! This module defines the plain `Account` data structure and the value types
//! it is built from. Accounts carry no behavior tied to storage; balance
//! mutation happens only through [`crate::core::LedgerEngine`].

use super::money::{round_money, zero};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Account identifier
pub type AccountId = Uuid;

/// Account type (policy) identifier
pub type AccountTypeId = Uuid;

/// Lifecycle status of an account
///
/// `closed` is terminal unless an administrator reactivates the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Pending,
    Active,
    Inactive,
    Suspended,
    Closed,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Pending => "pending",
            AccountStatus::Active => "active",
            AccountStatus::Inactive => "inactive",
            AccountStatus::Suspended => "suspended",
            AccountStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(AccountStatus::Pending),
            "active" => Ok(AccountStatus::Active),
            "inactive" => Ok(AccountStatus::Inactive),
            "suspended" => Ok(AccountStatus::Suspended),
            "closed" => Ok(AccountStatus::Closed),
            other => Err(format!("Invalid account status '{}'", other)),
        }
    }
}

/// Supported account currencies
///
/// Fixed at account creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Cad,
    Aud,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Cad => "CAD",
            Currency::Aud => "AUD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "CAD" => Ok(Currency::Cad),
            "AUD" => Ok(Currency::Aud),
            other => Err(format!("Invalid currency '{}'", other)),
        }
    }
}

/// Branch that holds the account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// Uppercase branch code, prefix of the account number
    pub code: String,
    pub name: String,
    pub address: Option<String>,
}

/// A single notification preference
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotificationSetting {
    pub enabled: bool,
    pub threshold: Decimal,
}

/// Notification preferences of an account
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Notifications {
    /// Alert when the balance drops below the threshold
    pub low_balance: NotificationSetting,
    /// Alert on transactions above the threshold
    pub large_transaction: NotificationSetting,
}

impl Default for Notifications {
    fn default() -> Self {
        Self {
            low_balance: NotificationSetting {
                enabled: true,
                threshold: round_money(Decimal::new(100, 0)),
            },
            large_transaction: NotificationSetting {
                enabled: true,
                threshold: round_money(Decimal::new(1000, 0)),
            },
        }
    }
}

/// Opening and closing audit fields
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccountMetadata {
    pub opening_deposit: Decimal,
    pub opened_by: Option<String>,
    pub closed_by: Option<String>,
    pub closed_at: Option<DateTime<Utc>>,
    pub closure_reason: Option<String>,
}

impl AccountMetadata {
    /// Remove every closure field
    pub fn clear_closure(&mut self) {
        self.closed_by = None;
        self.closed_at = None;
        self.closure_reason = None;
    }
}

/// Ledger state of a single bank account
///
/// Invariants kept by the ledger engine after every operation:
/// - `balance >= 0` and `available_balance >= 0`
/// - `0 <= overdraft_used <= overdraft_limit`
/// - every amount carries exactly two decimal places
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: AccountId,

    /// Unique, generated once at creation and never changed
    pub account_number: String,

    /// Reference to the account type policy
    pub account_type_id: AccountTypeId,

    /// Owning user
    pub owner_id: String,

    pub branch: Branch,

    pub currency: Currency,

    /// Ledger balance
    pub balance: Decimal,

    /// Funds that can be debited without touching the overdraft
    pub available_balance: Decimal,

    /// Ceiling the account may borrow beyond a zero balance
    pub overdraft_limit: Decimal,

    /// Amount currently borrowed against the overdraft
    pub overdraft_used: Decimal,

    pub status: AccountStatus,

    /// Timestamp of the most recent balance mutation
    pub last_transaction_date: Option<DateTime<Utc>>,

    /// Day of month statements are produced (1-31)
    pub monthly_statement_date: u8,

    pub notifications: Notifications,

    pub metadata: AccountMetadata,

    pub tags: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create an account holding `opening_deposit`, with no overdraft
    ///
    /// The account number is left empty; it is assigned by the account
    /// service right before the account is persisted.
    pub fn new(
        account_type_id: AccountTypeId,
        owner_id: impl Into<String>,
        branch: Branch,
        currency: Currency,
        opening_deposit: Decimal,
        status: AccountStatus,
    ) -> Self {
        let now = Utc::now();
        let opening_deposit = round_money(opening_deposit);
        Account {
            id: Uuid::new_v4(),
            account_number: String::new(),
            account_type_id,
            owner_id: owner_id.into(),
            branch,
            currency,
            balance: opening_deposit,
            available_balance: opening_deposit,
            overdraft_limit: zero(),
            overdraft_used: zero(),
            status,
            last_transaction_date: None,
            monthly_statement_date: 1,
            notifications: Notifications::default(),
            metadata: AccountMetadata {
                opening_deposit,
                ..AccountMetadata::default()
            },
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Remaining overdraft headroom: `overdraft_limit - overdraft_used`
    pub fn overdraft_available(&self) -> Decimal {
        round_money(
            self.overdraft_limit
                .saturating_sub(self.overdraft_used)
                .max(Decimal::ZERO),
        )
    }

    /// `available_balance + overdraft_available`, saturating at `Decimal::MAX`
    ///
    /// A saturated sum still exceeds every representable amount, so
    /// comparisons against it stay exact.
    pub fn total_available_funds(&self) -> Decimal {
        round_money(
            self.available_balance
                .saturating_add(self.overdraft_available()),
        )
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Read-only balance view of the account
    pub fn balance_snapshot(&self) -> BalanceSnapshot {
        BalanceSnapshot {
            balance: self.balance,
            available_balance: self.available_balance,
            overdraft_limit: self.overdraft_limit,
            overdraft_used: self.overdraft_used,
            overdraft_available: self.overdraft_available(),
            total_available_funds: self.total_available_funds(),
            currency: self.currency,
            last_updated: self.updated_at,
        }
    }
}

/// Balance figures returned by `get_balance`
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceSnapshot {
    pub balance: Decimal,
    pub available_balance: Decimal,
    pub overdraft_limit: Decimal,
    pub overdraft_used: Decimal,
    pub overdraft_available: Decimal,
    pub total_available_funds: Decimal,
    pub currency: Currency,
    pub last_updated: DateTime<Utc>,
}
