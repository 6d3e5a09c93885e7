//! Ledger operation records for replay processing
//!
//! An operation record is one line of a replay file: a request to open an
//! account, move money, or change an account's lifecycle. Accounts are named
//! by caller-chosen references, mapped to generated account ids by the
//! operation engine.

use super::account::Currency;
use super::role::Role;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Caller-chosen reference naming an account inside a replay
pub type AccountRef = String;

/// Operation types supported by the replay engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    /// Open a new account of an account type at a branch
    Open,

    /// Credit funds to an account
    Credit,

    /// Debit funds from an account, drawing on the overdraft if needed
    Debit,

    /// Move funds between two accounts as one unit
    Transfer,

    /// Administrative manual credit (audited)
    AdjustCredit,

    /// Administrative manual debit (audited)
    AdjustDebit,

    /// Close an account with zero balance and no overdraft
    Close,

    /// Reopen a closed or suspended account (admin)
    Reactivate,

    /// Suspend an active account (admin)
    Suspend,

    /// Mark an active account inactive (admin)
    Deactivate,

    /// Change the overdraft limit of an account
    Overdraft,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Open => "open",
            OperationType::Credit => "credit",
            OperationType::Debit => "debit",
            OperationType::Transfer => "transfer",
            OperationType::AdjustCredit => "adjust_credit",
            OperationType::AdjustDebit => "adjust_debit",
            OperationType::Close => "close",
            OperationType::Reactivate => "reactivate",
            OperationType::Suspend => "suspend",
            OperationType::Deactivate => "deactivate",
            OperationType::Overdraft => "overdraft",
        }
    }

    /// Whether records of this type must carry an amount
    pub fn requires_amount(&self) -> bool {
        matches!(
            self,
            OperationType::Open
                | OperationType::Credit
                | OperationType::Debit
                | OperationType::Transfer
                | OperationType::AdjustCredit
                | OperationType::AdjustDebit
                | OperationType::Overdraft
        )
    }
}

/// Parsed replay record
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRecord {
    pub op_type: OperationType,

    /// Account the operation applies to (source account for transfers)
    pub account: AccountRef,

    /// Destination account of a transfer
    pub target: Option<AccountRef>,

    /// Amount; opening deposit for `open`, new limit for `overdraft`
    pub amount: Option<Decimal>,

    /// Account type code, required by `open`
    pub account_type: Option<String>,

    /// Branch code, required by `open`
    pub branch: Option<String>,

    /// Currency for `open`; USD when absent
    pub currency: Option<Currency>,

    /// Role of the caller issuing the operation
    pub role: Role,

    /// Reason recorded for adjustments, closures and status changes
    pub reason: Option<String>,
}

impl OperationRecord {
    /// Create a record with only the type and account set
    pub fn new(op_type: OperationType, account: impl Into<AccountRef>) -> Self {
        Self {
            op_type,
            account: account.into(),
            target: None,
            amount: None,
            account_type: None,
            branch: None,
            currency: None,
            role: Role::Customer,
            reason: None,
        }
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_target(mut self, target: impl Into<AccountRef>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_account_type(mut self, code: impl Into<String>) -> Self {
        self.account_type = Some(code.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Every account reference the record touches
    pub fn references(&self) -> impl Iterator<Item = &AccountRef> {
        std::iter::once(&self.account).chain(self.target.iter())
    }
}
