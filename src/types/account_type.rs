//! Account type (policy) records
//!
//! An account type carries the static policy shared by every account that
//! references it: balance bounds, interest rate, fees and transaction limits.

use super::account::AccountTypeId;
use super::money::round_money;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Daily and monthly transaction caps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransactionLimit {
    pub daily: Decimal,
    pub monthly: Decimal,
}

impl Default for TransactionLimit {
    fn default() -> Self {
        Self {
            daily: round_money(Decimal::new(10_000, 0)),
            monthly: round_money(Decimal::new(50_000, 0)),
        }
    }
}

/// Policy record referenced by accounts
#[derive(Debug, Clone, PartialEq)]
pub struct AccountType {
    pub id: AccountTypeId,
    /// Short unique code, stored uppercase (e.g. "SAV")
    pub code: String,
    /// Unique display name
    pub name: String,
    pub description: Option<String>,
    pub minimum_balance: Decimal,
    pub maximum_balance: Decimal,
    /// Annual percentage, 0-100
    pub interest_rate: Decimal,
    pub monthly_fee: Decimal,
    pub transaction_limit: TransactionLimit,
    pub features: Vec<String>,
    /// Whether new accounts may reference this type
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an account type
///
/// Unset optional fields fall back to the registry defaults (see
/// [`NewAccountType::new`]).
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccountType {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub minimum_balance: Decimal,
    pub maximum_balance: Decimal,
    pub interest_rate: Decimal,
    pub monthly_fee: Decimal,
    pub transaction_limit: TransactionLimit,
    pub features: Vec<String>,
    pub is_active: bool,
}

impl NewAccountType {
    /// Create an input with default policy values
    ///
    /// Defaults: minimum balance 0, maximum balance 1,000,000, no interest,
    /// no monthly fee, 10,000 daily / 50,000 monthly limits, active.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            description: None,
            minimum_balance: Decimal::ZERO,
            maximum_balance: Decimal::new(1_000_000, 0),
            interest_rate: Decimal::ZERO,
            monthly_fee: Decimal::ZERO,
            transaction_limit: TransactionLimit::default(),
            features: Vec::new(),
            is_active: true,
        }
    }

    pub fn with_balance_bounds(mut self, minimum: Decimal, maximum: Decimal) -> Self {
        self.minimum_balance = minimum;
        self.maximum_balance = maximum;
        self
    }

    pub fn with_interest_rate(mut self, rate: Decimal) -> Self {
        self.interest_rate = rate;
        self
    }

    pub fn with_monthly_fee(mut self, fee: Decimal) -> Self {
        self.monthly_fee = fee;
        self
    }

    pub fn with_transaction_limit(mut self, limit: TransactionLimit) -> Self {
        self.transaction_limit = limit;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.features = features;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Partial transaction limit update, merged field by field
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransactionLimitPatch {
    pub daily: Option<Decimal>,
    pub monthly: Option<Decimal>,
}

/// Partial account type update
///
/// The code of an account type is immutable; every other field may change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccountTypePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub minimum_balance: Option<Decimal>,
    pub maximum_balance: Option<Decimal>,
    pub interest_rate: Option<Decimal>,
    pub monthly_fee: Option<Decimal>,
    pub transaction_limit: Option<TransactionLimitPatch>,
    pub features: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// Usage report of one account type
#[derive(Debug, Clone, PartialEq)]
pub struct AccountTypeUsage {
    pub account_type_id: AccountTypeId,
    pub code: String,
    pub name: String,
    /// Number of accounts referencing the type, any status
    pub count: usize,
    pub total_balance: Decimal,
    pub average_balance: Decimal,
    pub active_accounts: usize,
}

/// Popularity entry: active accounts per active type
#[derive(Debug, Clone, PartialEq)]
pub struct PopularAccountType {
    pub account_type_id: AccountTypeId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub active_accounts: usize,
}
