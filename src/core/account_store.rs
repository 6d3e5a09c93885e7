//! Thread-safe in-memory account repository
//!
//! `InMemoryAccountRepository` stores accounts in a `DashMap`, which shards
//! its internal locks so that operations on different accounts proceed in
//! parallel while operations on the same account are serialized.
//!
//! A second map indexes accounts by account number. Claiming a number in that
//! index is the uniqueness check for `insert`: two concurrent inserts with the
//! same number cannot both succeed.

use super::traits::AccountRepository;
use crate::types::{Account, AccountId, LedgerError};
use dashmap::DashMap;

/// Concurrent in-memory implementation of [`AccountRepository`]
#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    /// Accounts by id
    accounts: DashMap<AccountId, Account>,

    /// Account number index
    numbers: DashMap<String, AccountId>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl AccountRepository for InMemoryAccountRepository {
    fn insert(&self, account: Account) -> Result<Account, LedgerError> {
        if account.account_number.is_empty() {
            return Err(LedgerError::validation(
                "account_number",
                "Account number must be assigned before insert",
            ));
        }
        if self.accounts.contains_key(&account.id) {
            return Err(LedgerError::conflict(format!(
                "Account {} already exists",
                account.id
            )));
        }

        let id = account.id;
        let mut claimed = false;
        self.numbers
            .entry(account.account_number.clone())
            .or_insert_with(|| {
                claimed = true;
                id
            });
        if !claimed {
            return Err(LedgerError::conflict(format!(
                "Account number {} is already in use",
                account.account_number
            )));
        }

        self.accounts.insert(id, account.clone());
        Ok(account)
    }

    fn load(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.accounts
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| LedgerError::account_not_found(id))
    }

    fn save(&self, account: Account) -> Result<(), LedgerError> {
        let mut entry = self
            .accounts
            .get_mut(&account.id)
            .ok_or_else(|| LedgerError::account_not_found(account.id))?;
        if entry.account_number != account.account_number {
            return Err(LedgerError::validation(
                "account_number",
                "Account number cannot be changed",
            ));
        }
        *entry.value_mut() = account;
        Ok(())
    }

    fn find_by_number(&self, account_number: &str) -> Option<Account> {
        let id = *self.numbers.get(account_number)?.value();
        self.accounts.get(&id).map(|entry| entry.value().clone())
    }

    fn number_exists(&self, account_number: &str) -> bool {
        self.numbers.contains_key(account_number)
    }

    fn update<F, T>(&self, id: AccountId, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut Account) -> Result<T, LedgerError>,
    {
        // The entry guard is the per-account lock for the whole closure
        let mut entry = self
            .accounts
            .get_mut(&id)
            .ok_or_else(|| LedgerError::account_not_found(id))?;

        let mut draft = entry.value().clone();
        let output = f(&mut draft)?;
        if draft.account_number != entry.account_number {
            return Err(LedgerError::validation(
                "account_number",
                "Account number cannot be changed",
            ));
        }
        *entry.value_mut() = draft;
        Ok(output)
    }

    fn count<P>(&self, predicate: P) -> usize
    where
        P: Fn(&Account) -> bool,
    {
        self.accounts
            .iter()
            .filter(|entry| predicate(entry.value()))
            .count()
    }

    fn all(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        accounts.sort_by(|a, b| a.account_number.cmp(&b.account_number));
        accounts
    }
}
