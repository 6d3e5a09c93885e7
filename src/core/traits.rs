//! Core traits for account persistence, policy lookup and audit recording
//!
//! These traits are the seams between the ledger rules and their
//! collaborators. The account service is written against them so that the
//! in-memory implementations shipped with the crate can be swapped for a real
//! backing store.

use crate::types::{Account, AccountId, AccountType, AccountTypeId, LedgerError};

use super::audit::AuditEntry;

/// Persistence interface for accounts
///
/// Implementations must enforce account number uniqueness on `insert` and
/// serialize `update` calls per account.
pub trait AccountRepository: Send + Sync {
    /// Store a new account
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the account number is already taken. Callers
    /// generating numbers treat this as a signal to retry with a new one.
    fn insert(&self, account: Account) -> Result<Account, LedgerError>;

    /// Load an account by id
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no account has this id.
    fn load(&self, id: AccountId) -> Result<Account, LedgerError>;

    /// Overwrite a stored account with `account`
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account was never inserted.
    fn save(&self, account: Account) -> Result<(), LedgerError>;

    /// Look up an account by its account number
    fn find_by_number(&self, account_number: &str) -> Option<Account>;

    /// Whether an account number is already in use
    fn number_exists(&self, account_number: &str) -> bool;

    /// Read-modify-write an account under its lock
    ///
    /// The closure works on a copy of the account. The copy replaces the
    /// stored account only when the closure returns `Ok`, so a failing
    /// closure leaves the account untouched. No other `update` on the same
    /// account can interleave with the closure.
    fn update<F, T>(&self, id: AccountId, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Account) -> Result<T, LedgerError>;

    /// Number of accounts matching `predicate`
    fn count<P>(&self, predicate: P) -> usize
    where
        P: Fn(&Account) -> bool;

    /// Snapshot of every account, ordered by account number
    fn all(&self) -> Vec<Account>;
}

/// Read access to account type policies
pub trait PolicyLookup: Send + Sync {
    fn find_by_id(&self, id: AccountTypeId) -> Option<AccountType>;

    /// Look up a policy by its (case-insensitive) code
    fn find_by_code(&self, code: &str) -> Option<AccountType>;

    /// Whether the policy exists and accepts new accounts
    fn exists_and_active(&self, id: AccountTypeId) -> bool {
        self.find_by_id(id).is_some_and(|policy| policy.is_active)
    }
}

/// Destination for the audit trail of administrative adjustments
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry);
}
