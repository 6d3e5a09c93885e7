//! Account type registry
//!
//! The registry owns the account type policies. It validates every write,
//! keeps the code and name unique, and serves reads through a `moka` cache
//! that is invalidated whenever a policy changes.
//!
//! # Caching
//!
//! Reads that miss the cache copy the stored policy into the cache while
//! still holding the store's read guard for that entry. Writers update the
//! store first and invalidate afterwards, so a concurrent reader can never
//! leave a stale policy behind in the cache.

use super::traits::{AccountRepository, PolicyLookup};
use crate::types::money::round_money;
use crate::types::{
    AccountStatus, AccountType, AccountTypeId, AccountTypePatch, AccountTypeUsage, LedgerError,
    NewAccountType, PopularAccountType, TransactionLimit,
};
use chrono::Utc;
use dashmap::DashMap;
use moka::sync::Cache;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// Registry cache settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Maximum number of cached policies
    pub cache_capacity: u64,

    /// Time a cached policy stays valid
    pub cache_ttl: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 1_000,
            cache_ttl: Duration::from_secs(300),
        }
    }
}

/// Store of account type policies
pub struct AccountTypeRegistry {
    types: DashMap<AccountTypeId, AccountType>,

    /// Uppercase code -> id
    codes: DashMap<String, AccountTypeId>,

    /// Lowercase name -> id
    names: DashMap<String, AccountTypeId>,

    cache: Cache<AccountTypeId, AccountType>,

    /// Serializes writes so that code and name uniqueness checks and the
    /// index updates happen as one step
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for AccountTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountTypeRegistry")
            .field("types", &self.types.len())
            .finish()
    }
}

impl Default for AccountTypeRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl AccountTypeRegistry {
    /// Create an empty registry
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            types: DashMap::new(),
            codes: DashMap::new(),
            names: DashMap::new(),
            cache: Cache::builder()
                .max_capacity(config.cache_capacity)
                .time_to_live(config.cache_ttl)
                .build(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a registry holding the built-in savings (SAV) and checking
    /// (CHK) account types
    pub fn with_defaults(config: RegistryConfig) -> Result<Self, LedgerError> {
        let registry = Self::new(config);
        for policy in default_account_types() {
            registry.create(policy)?;
        }
        Ok(registry)
    }

    /// Register a new account type
    ///
    /// The code is stored uppercase and monetary fields are rounded to two
    /// decimal places.
    ///
    /// # Errors
    ///
    /// - `Validation` if a field is out of range or `maximum <= minimum`
    /// - `Validation` if the code or name is already registered
    pub fn create(&self, input: NewAccountType) -> Result<AccountType, LedgerError> {
        let now = Utc::now();
        let policy = AccountType {
            id: Uuid::new_v4(),
            code: input.code.trim().to_uppercase(),
            name: input.name.trim().to_string(),
            description: input.description,
            minimum_balance: round_money(input.minimum_balance),
            maximum_balance: round_money(input.maximum_balance),
            interest_rate: input.interest_rate,
            monthly_fee: round_money(input.monthly_fee),
            transaction_limit: TransactionLimit {
                daily: round_money(input.transaction_limit.daily),
                monthly: round_money(input.transaction_limit.monthly),
            },
            features: input.features,
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        };
        validate_policy(&policy)?;

        let _guard = self.lock_writes();
        if self.codes.contains_key(&policy.code) {
            return Err(LedgerError::validation(
                "code",
                format!("Account type code {} already exists", policy.code),
            ));
        }
        let name_key = policy.name.to_lowercase();
        if self.names.contains_key(&name_key) {
            return Err(LedgerError::validation(
                "name",
                format!("Account type name '{}' already exists", policy.name),
            ));
        }

        self.codes.insert(policy.code.clone(), policy.id);
        self.names.insert(name_key, policy.id);
        self.types.insert(policy.id, policy.clone());

        Ok(policy)
    }

    /// Merge `patch` into an existing account type
    ///
    /// The transaction limit is merged field by field. The `maximum >
    /// minimum` rule is checked against the merged result.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no account type has this id
    /// - `Validation` if the merged policy is invalid
    /// - `Validation` if the new name belongs to another account type
    pub fn update(
        &self,
        id: AccountTypeId,
        patch: AccountTypePatch,
    ) -> Result<AccountType, LedgerError> {
        let _guard = self.lock_writes();
        let current = self
            .types
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| LedgerError::not_found("Account type", id))?;

        let mut merged = current.clone();
        if let Some(name) = patch.name {
            merged.name = name.trim().to_string();
        }
        if let Some(description) = patch.description {
            merged.description = Some(description);
        }
        if let Some(minimum) = patch.minimum_balance {
            merged.minimum_balance = round_money(minimum);
        }
        if let Some(maximum) = patch.maximum_balance {
            merged.maximum_balance = round_money(maximum);
        }
        if let Some(rate) = patch.interest_rate {
            merged.interest_rate = rate;
        }
        if let Some(fee) = patch.monthly_fee {
            merged.monthly_fee = round_money(fee);
        }
        if let Some(limit) = patch.transaction_limit {
            if let Some(daily) = limit.daily {
                merged.transaction_limit.daily = round_money(daily);
            }
            if let Some(monthly) = limit.monthly {
                merged.transaction_limit.monthly = round_money(monthly);
            }
        }
        if let Some(features) = patch.features {
            merged.features = features;
        }
        if let Some(is_active) = patch.is_active {
            merged.is_active = is_active;
        }
        validate_policy(&merged)?;

        let old_name_key = current.name.to_lowercase();
        let new_name_key = merged.name.to_lowercase();
        if new_name_key != old_name_key {
            if self.names.contains_key(&new_name_key) {
                return Err(LedgerError::validation(
                    "name",
                    format!("Account type name '{}' already exists", merged.name),
                ));
            }
            self.names.remove(&old_name_key);
            self.names.insert(new_name_key, id);
        }

        merged.updated_at = Utc::now();
        self.types.insert(id, merged.clone());
        self.cache.invalidate(&id);

        Ok(merged)
    }

    /// Remove an account type
    ///
    /// # Errors
    ///
    /// - `NotFound` if no account type has this id
    /// - `Conflict` if any non-closed account still references it
    pub fn delete<R: AccountRepository>(
        &self,
        id: AccountTypeId,
        accounts: &R,
    ) -> Result<AccountType, LedgerError> {
        let _guard = self.lock_writes();
        if !self.types.contains_key(&id) {
            return Err(LedgerError::not_found("Account type", id));
        }

        let in_use = accounts
            .count(|account| account.account_type_id == id && account.status != AccountStatus::Closed);
        if in_use > 0 {
            return Err(LedgerError::conflict(format!(
                "Account type {} is used by {} open account(s)",
                id, in_use
            )));
        }

        let (_, removed) = self
            .types
            .remove(&id)
            .ok_or_else(|| LedgerError::not_found("Account type", id))?;
        self.codes.remove(&removed.code);
        self.names.remove(&removed.name.to_lowercase());
        self.cache.invalidate(&id);

        Ok(removed)
    }

    /// Flip whether new accounts may reference the account type
    pub fn toggle_status(&self, id: AccountTypeId) -> Result<AccountType, LedgerError> {
        let _guard = self.lock_writes();
        let toggled = {
            let mut entry = self
                .types
                .get_mut(&id)
                .ok_or_else(|| LedgerError::not_found("Account type", id))?;
            entry.is_active = !entry.is_active;
            entry.updated_at = Utc::now();
            entry.value().clone()
        };
        self.cache.invalidate(&id);

        Ok(toggled)
    }

    /// Every account type, sorted by name
    ///
    /// Inactive types are skipped unless `include_inactive` is set.
    pub fn list(&self, include_inactive: bool) -> Vec<AccountType> {
        let mut policies: Vec<AccountType> = self
            .types
            .iter()
            .filter(|entry| include_inactive || entry.is_active)
            .map(|entry| entry.value().clone())
            .collect();
        policies.sort_by(|a, b| a.name.cmp(&b.name));
        policies
    }

    /// Account count and balance totals per account type
    ///
    /// Types without accounts report zero.
    pub fn usage<R: AccountRepository>(&self, accounts: &R) -> Vec<AccountTypeUsage> {
        // (count, total balance, active count)
        let mut totals: HashMap<AccountTypeId, (usize, Decimal, usize)> = HashMap::new();
        for account in accounts.all() {
            let entry = totals
                .entry(account.account_type_id)
                .or_insert((0, Decimal::ZERO, 0));
            entry.0 += 1;
            entry.1 = entry.1.saturating_add(account.balance);
            if account.is_active() {
                entry.2 += 1;
            }
        }

        self.list(true)
            .into_iter()
            .map(|policy| {
                let (count, total, active) =
                    totals.get(&policy.id).copied().unwrap_or((0, Decimal::ZERO, 0));
                let average = if count == 0 {
                    Decimal::ZERO
                } else {
                    total / Decimal::from(count)
                };
                AccountTypeUsage {
                    account_type_id: policy.id,
                    code: policy.code,
                    name: policy.name,
                    count,
                    total_balance: round_money(total),
                    average_balance: round_money(average),
                    active_accounts: active,
                }
            })
            .collect()
    }

    /// Active account types ranked by their number of active accounts
    pub fn popular<R: AccountRepository>(&self, accounts: &R) -> Vec<PopularAccountType> {
        let mut active_counts: HashMap<AccountTypeId, usize> = HashMap::new();
        for account in accounts.all().iter().filter(|a| a.is_active()) {
            *active_counts.entry(account.account_type_id).or_default() += 1;
        }

        let mut ranking: Vec<PopularAccountType> = self
            .list(false)
            .into_iter()
            .map(|policy| PopularAccountType {
                active_accounts: active_counts.get(&policy.id).copied().unwrap_or(0),
                account_type_id: policy.id,
                code: policy.code,
                name: policy.name,
                description: policy.description,
                features: policy.features,
            })
            .collect();
        ranking.sort_by(|a, b| {
            b.active_accounts
                .cmp(&a.active_accounts)
                .then_with(|| a.name.cmp(&b.name))
        });
        ranking
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn lock_writes(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PolicyLookup for AccountTypeRegistry {
    fn find_by_id(&self, id: AccountTypeId) -> Option<AccountType> {
        if let Some(policy) = self.cache.get(&id) {
            return Some(policy);
        }
        let entry = self.types.get(&id)?;
        let policy = entry.value().clone();
        self.cache.insert(id, policy.clone());
        Some(policy)
    }

    fn find_by_code(&self, code: &str) -> Option<AccountType> {
        let id = *self.codes.get(&code.trim().to_uppercase())?.value();
        self.find_by_id(id)
    }
}

/// Built-in account types
pub fn default_account_types() -> Vec<NewAccountType> {
    vec![
        NewAccountType::new("SAV", "Savings Account")
            .with_description("Standard savings account with interest")
            .with_balance_bounds(Decimal::new(100, 0), Decimal::new(100_000, 0))
            .with_interest_rate(Decimal::new(25, 1))
            .with_transaction_limit(TransactionLimit {
                daily: Decimal::new(5_000, 0),
                monthly: Decimal::new(20_000, 0),
            })
            .with_features(vec![
                "Interest earning".to_string(),
                "Online banking".to_string(),
            ]),
        NewAccountType::new("CHK", "Checking Account")
            .with_description("Everyday checking account")
            .with_balance_bounds(Decimal::new(25, 0), Decimal::new(50_000, 0))
            .with_interest_rate(Decimal::new(1, 1))
            .with_monthly_fee(Decimal::new(5, 0))
            .with_features(vec![
                "Debit card".to_string(),
                "Online banking".to_string(),
                "Overdraft protection".to_string(),
            ]),
    ]
}

fn validate_policy(policy: &AccountType) -> Result<(), LedgerError> {
    let code_len = policy.code.chars().count();
    if !(2..=10).contains(&code_len) || !policy.code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(LedgerError::validation(
            "code",
            "Code must be 2-10 alphanumeric characters",
        ));
    }
    let name_len = policy.name.chars().count();
    if !(2..=50).contains(&name_len) {
        return Err(LedgerError::validation(
            "name",
            "Name must be 2-50 characters",
        ));
    }
    if policy.minimum_balance < Decimal::ZERO {
        return Err(LedgerError::validation(
            "minimum_balance",
            "Minimum balance cannot be negative",
        ));
    }
    if policy.maximum_balance <= policy.minimum_balance {
        return Err(LedgerError::validation(
            "maximum_balance",
            "Maximum balance must be greater than minimum balance",
        ));
    }
    if policy.interest_rate < Decimal::ZERO || policy.interest_rate > Decimal::ONE_HUNDRED {
        return Err(LedgerError::validation(
            "interest_rate",
            "Interest rate must be between 0 and 100",
        ));
    }
    if policy.monthly_fee < Decimal::ZERO {
        return Err(LedgerError::validation(
            "monthly_fee",
            "Monthly fee cannot be negative",
        ));
    }
    if policy.transaction_limit.daily < Decimal::ZERO
        || policy.transaction_limit.monthly < Decimal::ZERO
    {
        return Err(LedgerError::validation(
            "transaction_limit",
            "Transaction limits cannot be negative",
        ));
    }
    Ok(())
}
