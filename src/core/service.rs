//! Account service
//!
//! `AccountService` is the inbound boundary of the ledger. It loads accounts
//! from the injected repository, applies the ledger rules under the
//! repository's per-account lock, and reports the outcome as a typed result.
//!
//! # Architecture
//!
//! ```text
//! AccountService
//!     ├── Arc<R: AccountRepository>   (account persistence)
//!     ├── Arc<P: PolicyLookup>        (account type policies)
//!     ├── AccountNumberGenerator      (number assignment at creation)
//!     ├── LedgerEngine                (balance and status rules)
//!     └── Arc<dyn AuditSink>          (trail of manual adjustments)
//! ```

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use super::account_store::InMemoryAccountRepository;
use super::audit::{AdjustmentKind, AuditEntry, TracingAuditSink};
use super::ledger::{LedgerEngine, DEFAULT_INTEREST_DAYS};
use super::number_generator::{AccountNumberGenerator, DEFAULT_MAX_ATTEMPTS};
use super::registry::AccountTypeRegistry;
use super::traits::{AccountRepository, AuditSink, PolicyLookup};
use crate::types::money::{positive_amount, round_money};
use crate::types::{
    Account, AccountFilter, AccountId, AccountStatement, AccountStatistics, AccountStatus,
    BalanceSnapshot, Branch, GroupTotal, LedgerError, OpenAccountRequest, OverdraftSummary, Page,
    PageRequest, SettingsUpdate, StatusCounts, TransferReceipt,
};

/// Account service settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Account number candidates tried before `create_account` gives up
    pub max_number_attempts: u32,

    /// Seed for account number generation; random when unset
    pub number_seed: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_number_attempts: DEFAULT_MAX_ATTEMPTS,
            number_seed: None,
        }
    }
}

/// Inbound interface of the account ledger
pub struct AccountService<R = InMemoryAccountRepository, P = AccountTypeRegistry> {
    accounts: Arc<R>,
    policies: Arc<P>,
    generator: AccountNumberGenerator,
    ledger: LedgerEngine,
    audit: Arc<dyn AuditSink>,
}

impl AccountService {
    /// Service over a fresh in-memory repository
    pub fn in_memory(registry: Arc<AccountTypeRegistry>, config: ServiceConfig) -> Self {
        Self::new(Arc::new(InMemoryAccountRepository::new()), registry, config)
    }
}

impl<R, P> AccountService<R, P>
where
    R: AccountRepository,
    P: PolicyLookup,
{
    pub fn new(accounts: Arc<R>, policies: Arc<P>, config: ServiceConfig) -> Self {
        let generator = match config.number_seed {
            Some(seed) => AccountNumberGenerator::with_seed(seed),
            None => AccountNumberGenerator::from_entropy(),
        }
        .with_max_attempts(config.max_number_attempts);

        Self {
            accounts,
            policies,
            generator,
            ledger: LedgerEngine::new(),
            audit: Arc::new(TracingAuditSink),
        }
    }

    /// Replace the default `tracing` audit sink
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    pub fn accounts(&self) -> &R {
        &self.accounts
    }

    pub fn policies(&self) -> &P {
        &self.policies
    }

    /// Open a new account
    ///
    /// The account type must exist and be active, and the opening deposit
    /// must lie between its minimum and maximum balance. The account number
    /// is generated here; a number taken by a concurrent insert is replaced
    /// by a fresh candidate.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the account type does not exist
    /// - `PolicyViolation` if the type is inactive or the deposit is out of bounds
    /// - `InvalidAmount` if the deposit is negative
    /// - `Validation` for a malformed branch, owner or initial status
    /// - `Conflict` if no free account number was found
    pub fn create_account(&self, request: OpenAccountRequest) -> Result<Account, LedgerError> {
        let policy = self
            .policies
            .find_by_id(request.account_type_id)
            .ok_or_else(|| LedgerError::not_found("Account type", request.account_type_id))?;
        if !policy.is_active {
            return Err(LedgerError::policy_violation(format!(
                "Account type {} is not accepting new accounts",
                policy.code
            )));
        }

        let deposit = round_money(request.opening_deposit);
        if deposit < Decimal::ZERO {
            return Err(LedgerError::invalid_amount(request.opening_deposit));
        }
        if deposit < policy.minimum_balance {
            return Err(LedgerError::policy_violation(format!(
                "Opening deposit {} is below the minimum balance {} of {}",
                deposit, policy.minimum_balance, policy.code
            )));
        }
        if deposit > policy.maximum_balance {
            return Err(LedgerError::policy_violation(format!(
                "Opening deposit {} exceeds the maximum balance {} of {}",
                deposit, policy.maximum_balance, policy.code
            )));
        }

        if !matches!(request.status, AccountStatus::Active | AccountStatus::Pending) {
            return Err(LedgerError::validation(
                "status",
                "Accounts open as active or pending",
            ));
        }
        let owner_id = request.owner_id.trim();
        if owner_id.is_empty() {
            return Err(LedgerError::validation("owner_id", "Owner is required"));
        }
        let branch = validate_branch(
            &request.branch_code,
            &request.branch_name,
            request.branch_address,
        )?;

        let mut account = Account::new(
            policy.id,
            owner_id,
            branch,
            request.currency,
            deposit,
            request.status,
        );
        account.metadata.opened_by = request.opened_by;

        let branch_code = account.branch.code.clone();
        let stored = self.generator.claim_unique(
            &branch_code,
            &policy.code,
            |candidate| {
                if self.accounts.number_exists(candidate) {
                    return Ok(None);
                }
                account.account_number = candidate.to_string();
                match self.accounts.insert(account.clone()) {
                    Ok(stored) => Ok(Some(stored)),
                    Err(LedgerError::Conflict { .. }) => {
                        debug!(candidate, "account number taken at insert, retrying");
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            },
        )?;

        info!(
            account = %stored.account_number,
            account_type = %policy.code,
            owner = %stored.owner_id,
            deposit = %deposit,
            "account opened"
        );
        Ok(stored)
    }

    pub fn get_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.accounts.load(id)
    }

    pub fn find_by_number(&self, account_number: &str) -> Result<Account, LedgerError> {
        self.accounts
            .find_by_number(account_number)
            .ok_or_else(|| LedgerError::not_found("Account", account_number))
    }

    pub fn get_balance(&self, id: AccountId) -> Result<BalanceSnapshot, LedgerError> {
        Ok(self.accounts.load(id)?.balance_snapshot())
    }

    /// Credit an active account
    ///
    /// The account type's maximum balance is not enforced; exceeding it is
    /// only logged.
    pub fn credit(&self, id: AccountId, amount: Decimal) -> Result<Account, LedgerError> {
        let account = self.accounts.update(id, |account| {
            self.ledger.credit(account, amount)?;
            Ok(account.clone())
        })?;
        debug!(account = %account.account_number, amount = %amount, balance = %account.balance, "credited");

        if let Some(policy) = self.policies.find_by_id(account.account_type_id) {
            if account.balance > policy.maximum_balance {
                warn!(
                    account = %account.account_number,
                    balance = %account.balance,
                    maximum = %policy.maximum_balance,
                    "balance above account type maximum"
                );
            }
        }
        notify_large_transaction(&account, amount);

        Ok(account)
    }

    /// Debit an active account, drawing on the overdraft when needed
    pub fn debit(&self, id: AccountId, amount: Decimal) -> Result<Account, LedgerError> {
        let account = self.accounts.update(id, |account| {
            self.ledger.debit(account, amount)?;
            Ok(account.clone())
        })?;
        debug!(
            account = %account.account_number,
            amount = %amount,
            balance = %account.balance,
            overdraft_used = %account.overdraft_used,
            "debited"
        );

        notify_large_transaction(&account, amount);
        notify_low_balance(&account);

        Ok(account)
    }

    /// Manual credit or debit by an administrator
    ///
    /// The reason must be 5-200 characters. Every successful adjustment is
    /// sent to the audit sink.
    pub fn adjust_balance(
        &self,
        id: AccountId,
        amount: Decimal,
        kind: AdjustmentKind,
        reason: &str,
        actor: &str,
    ) -> Result<Account, LedgerError> {
        let reason = reason.trim();
        if !(5..=200).contains(&reason.chars().count()) {
            return Err(LedgerError::validation(
                "reason",
                "Adjustment reason must be 5-200 characters",
            ));
        }

        let account = match kind {
            AdjustmentKind::Credit => self.credit(id, amount)?,
            AdjustmentKind::Debit => self.debit(id, amount)?,
        };

        self.audit.record(AuditEntry {
            actor: actor.to_string(),
            kind,
            account_id: account.id,
            account_number: account.account_number.clone(),
            amount: round_money(amount),
            balance_after: account.balance,
            reason: reason.to_string(),
            timestamp: Utc::now(),
        });

        Ok(account)
    }

    /// Close an account with zero balance and no outstanding overdraft
    pub fn close_account(
        &self,
        id: AccountId,
        reason: &str,
        actor: &str,
    ) -> Result<Account, LedgerError> {
        let reason = non_empty(reason);
        let account = self.accounts.update(id, |account| {
            self.ledger
                .change_status(account, AccountStatus::Closed, Some(actor), reason)?;
            Ok(account.clone())
        })?;
        info!(account = %account.account_number, actor, reason = reason.unwrap_or(""), "account closed");
        Ok(account)
    }

    /// Return a closed or suspended account to active
    pub fn reactivate_account(&self, id: AccountId, actor: &str) -> Result<Account, LedgerError> {
        let account = self.accounts.update(id, |account| {
            self.ledger.reactivate(account)?;
            Ok(account.clone())
        })?;
        info!(account = %account.account_number, actor, "account reactivated");
        Ok(account)
    }

    /// Move an account along the status state machine
    pub fn set_status(
        &self,
        id: AccountId,
        status: AccountStatus,
        actor: &str,
        reason: Option<&str>,
    ) -> Result<Account, LedgerError> {
        let reason = reason.and_then(non_empty);
        let account = self.accounts.update(id, |account| {
            self.ledger
                .change_status(account, status, Some(actor), reason)?;
            Ok(account.clone())
        })?;
        info!(account = %account.account_number, status = %status, actor, "account status changed");
        Ok(account)
    }

    /// Change the overdraft limit, notification preferences or statement date
    ///
    /// All fields are validated before anything changes.
    pub fn update_settings(
        &self,
        id: AccountId,
        settings: SettingsUpdate,
    ) -> Result<Account, LedgerError> {
        if let Some(day) = settings.monthly_statement_date {
            if !(1..=31).contains(&day) {
                return Err(LedgerError::validation(
                    "monthly_statement_date",
                    "Statement date must be between 1 and 31",
                ));
            }
        }
        let notifications = settings.notifications.map(|mut notifications| {
            notifications.low_balance.threshold = round_money(notifications.low_balance.threshold);
            notifications.large_transaction.threshold =
                round_money(notifications.large_transaction.threshold);
            notifications
        });
        if let Some(notifications) = &notifications {
            if notifications.low_balance.threshold < Decimal::ZERO
                || notifications.large_transaction.threshold < Decimal::ZERO
            {
                return Err(LedgerError::validation(
                    "notifications",
                    "Notification thresholds cannot be negative",
                ));
            }
        }

        let account = self.accounts.update(id, |account| {
            if let Some(limit) = settings.overdraft_limit {
                self.ledger.set_overdraft_limit(account, limit)?;
            }
            if let Some(notifications) = notifications {
                account.notifications = notifications;
            }
            if let Some(day) = settings.monthly_statement_date {
                account.monthly_statement_date = day;
            }
            account.updated_at = Utc::now();
            Ok(account.clone())
        })?;
        debug!(account = %account.account_number, "settings updated");
        Ok(account)
    }

    /// Move `amount` from one account to another
    ///
    /// The destination is checked before the source is debited. If the
    /// credit still fails, the debit is reversed before the error is
    /// returned, so a transfer never debits without crediting.
    pub fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> Result<TransferReceipt, LedgerError> {
        if from == to {
            return Err(LedgerError::validation(
                "target",
                "Cannot transfer to the same account",
            ));
        }
        let amount = positive_amount(amount).ok_or_else(|| LedgerError::invalid_amount(amount))?;

        let destination = self.accounts.load(to)?;
        if !destination.is_active() {
            return Err(LedgerError::account_not_active(
                &destination.account_number,
                destination.status,
            ));
        }
        let source = self.accounts.load(from)?;
        if source.currency != destination.currency {
            return Err(LedgerError::policy_violation(format!(
                "Cannot transfer between {} and {} accounts",
                source.currency, destination.currency
            )));
        }

        let source = self.debit(from, amount)?;
        match self.credit(to, amount) {
            Ok(destination) => {
                info!(
                    from = %source.account_number,
                    to = %destination.account_number,
                    amount = %amount,
                    "transfer completed"
                );
                Ok(TransferReceipt {
                    source,
                    destination,
                    amount,
                })
            }
            Err(err) => {
                warn!(
                    from = %source.account_number,
                    to = %destination.account_number,
                    amount = %amount,
                    error = %err,
                    "transfer credit failed, reversing debit"
                );
                let reversal = self.accounts.update(from, |account| {
                    self.ledger.reverse_debit(account, amount)
                });
                if let Err(reversal_err) = reversal {
                    error!(
                        account = %source.account_number,
                        amount = %amount,
                        error = %reversal_err,
                        "transfer reversal failed"
                    );
                }
                Err(err)
            }
        }
    }

    /// Statement with projected interest, minimum balance compliance and
    /// overdraft usage
    pub fn statement(
        &self,
        id: AccountId,
        interest_days: Option<u32>,
    ) -> Result<AccountStatement, LedgerError> {
        let account = self.accounts.load(id)?;
        let policy = self.policies.find_by_id(account.account_type_id);
        let days = interest_days.unwrap_or(DEFAULT_INTEREST_DAYS);
        let projected_interest = self
            .ledger
            .calculate_interest(&account, policy.as_ref(), days)?;

        Ok(AccountStatement {
            account_number: account.account_number.clone(),
            account_type: policy.as_ref().map(|p| p.code.clone()),
            currency: account.currency,
            balance: account.balance_snapshot(),
            interest_days: days,
            projected_interest,
            minimum_balance: self.ledger.check_minimum_balance(&account, policy.as_ref()),
            overdraft: OverdraftSummary {
                limit: account.overdraft_limit,
                used: account.overdraft_used,
                available: account.overdraft_available(),
            },
            generated_at: Utc::now(),
        })
    }

    /// Filtered, paginated account listing, newest first
    pub fn list_accounts(&self, filter: &AccountFilter, page: PageRequest) -> Page<Account> {
        let needle = filter.number_contains.as_ref().map(|n| n.to_uppercase());
        let mut matching: Vec<Account> = self
            .accounts
            .all()
            .into_iter()
            .filter(|a| filter.status.map_or(true, |s| a.status == s))
            .filter(|a| filter.account_type_id.map_or(true, |t| a.account_type_id == t))
            .filter(|a| {
                filter
                    .branch_code
                    .as_ref()
                    .map_or(true, |b| a.branch.code.eq_ignore_ascii_case(b))
            })
            .filter(|a| filter.owner_id.as_ref().map_or(true, |o| &a.owner_id == o))
            .filter(|a| {
                needle
                    .as_ref()
                    .map_or(true, |n| a.account_number.contains(n.as_str()))
            })
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.account_number.cmp(&b.account_number))
        });

        let total = matching.len();
        let items = matching
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .collect();

        Page {
            items,
            page: page.page(),
            limit: page.limit(),
            total,
            total_pages: total.div_ceil(page.limit()),
        }
    }

    /// Counts by status and balance totals by account type and branch
    pub fn statistics(&self) -> AccountStatistics {
        let mut stats = AccountStatistics::default();
        let mut counts = StatusCounts::default();

        for account in self.accounts.all() {
            stats.total_accounts += 1;
            match account.status {
                AccountStatus::Pending => counts.pending += 1,
                AccountStatus::Active => counts.active += 1,
                AccountStatus::Inactive => counts.inactive += 1,
                AccountStatus::Suspended => counts.suspended += 1,
                AccountStatus::Closed => counts.closed += 1,
            }
            if account.status == AccountStatus::Closed {
                continue;
            }

            stats.total_balance = stats.total_balance.saturating_add(account.balance);
            let type_code = self
                .policies
                .find_by_id(account.account_type_id)
                .map(|p| p.code)
                .unwrap_or_else(|| account.account_type_id.to_string());
            add_to_group(stats.by_type.entry(type_code).or_default(), &account);
            add_to_group(
                stats.by_branch.entry(account.branch.code.clone()).or_default(),
                &account,
            );
        }

        stats.by_status = counts;
        stats.total_balance = round_money(stats.total_balance);
        stats
    }
}

fn add_to_group(group: &mut GroupTotal, account: &Account) {
    group.count += 1;
    group.total_balance = round_money(group.total_balance.saturating_add(account.balance));
}

fn validate_branch(
    code: &str,
    name: &str,
    address: Option<String>,
) -> Result<Branch, LedgerError> {
    let code = code.trim().to_uppercase();
    if !(2..=10).contains(&code.len()) || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(LedgerError::validation(
            "branch_code",
            "Branch code must be 2-10 alphanumeric characters",
        ));
    }
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::validation("branch_name", "Branch name is required"));
    }
    Ok(Branch {
        code,
        name: name.to_string(),
        address,
    })
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

fn notify_large_transaction(account: &Account, amount: Decimal) {
    let setting = account.notifications.large_transaction;
    if setting.enabled && amount >= setting.threshold {
        info!(
            account = %account.account_number,
            amount = %amount,
            threshold = %setting.threshold,
            "large transaction"
        );
    }
}

fn notify_low_balance(account: &Account) {
    let setting = account.notifications.low_balance;
    if setting.enabled && account.balance < setting.threshold {
        info!(
            account = %account.account_number,
            balance = %account.balance,
            threshold = %setting.threshold,
            "low balance"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audit::MemoryAuditSink;
    use crate::core::registry::RegistryConfig;
    use crate::types::{Currency, NotificationSetting, Notifications};
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn money(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn service() -> AccountService {
        let registry =
            Arc::new(AccountTypeRegistry::with_defaults(RegistryConfig::default()).unwrap());
        AccountService::in_memory(
            registry,
            ServiceConfig {
                number_seed: Some(42),
                ..ServiceConfig::default()
            },
        )
    }

    fn open(service: &AccountService, code: &str, deposit: i64) -> Account {
        let policy = service.policies().find_by_code(code).unwrap();
        service
            .create_account(
                OpenAccountRequest::new(policy.id, "user-1", "NYC", money(deposit))
                    .with_branch_name("New York"),
            )
            .unwrap()
    }

    #[test]
    fn test_create_account() {
        let service = service();

        let account = open(&service, "SAV", 25_000);

        assert!(account.account_number.starts_with("NYCSAV"));
        assert_eq!(account.account_number.len(), 12);
        assert_eq!(account.status, AccountStatus::Active);
        assert_eq!(account.balance.to_string(), "250.00");
        assert_eq!(account.metadata.opening_deposit, money(25_000));
        assert_eq!(account.branch.name, "New York");
        assert_eq!(
            service.find_by_number(&account.account_number).unwrap().id,
            account.id
        );
    }

    /// Repository whose every insert loses the race for the number
    #[derive(Default)]
    struct CollidingRepository {
        inner: InMemoryAccountRepository,
        inserts: AtomicUsize,
    }

    impl AccountRepository for CollidingRepository {
        fn insert(&self, account: Account) -> Result<Account, LedgerError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            Err(LedgerError::conflict(format!(
                "Account number {} already exists",
                account.account_number
            )))
        }

        fn load(&self, id: AccountId) -> Result<Account, LedgerError> {
            self.inner.load(id)
        }

        fn save(&self, account: Account) -> Result<(), LedgerError> {
            self.inner.save(account)
        }

        fn find_by_number(&self, account_number: &str) -> Option<Account> {
            self.inner.find_by_number(account_number)
        }

        fn number_exists(&self, account_number: &str) -> bool {
            self.inner.number_exists(account_number)
        }

        fn update<F, T>(&self, id: AccountId, f: F) -> Result<T, LedgerError>
        where
            F: FnOnce(&mut Account) -> Result<T, LedgerError>,
        {
            self.inner.update(id, f)
        }

        fn count<P>(&self, predicate: P) -> usize
        where
            P: Fn(&Account) -> bool,
        {
            self.inner.count(predicate)
        }

        fn all(&self) -> Vec<Account> {
            self.inner.all()
        }
    }

    #[test]
    fn test_insert_collisions_share_the_attempt_budget() {
        let registry =
            Arc::new(AccountTypeRegistry::with_defaults(RegistryConfig::default()).unwrap());
        let sav = registry.find_by_code("SAV").unwrap();
        let accounts = Arc::new(CollidingRepository::default());
        let service = AccountService::new(
            accounts.clone(),
            registry,
            ServiceConfig {
                max_number_attempts: 4,
                number_seed: Some(42),
            },
        );

        let result =
            service.create_account(OpenAccountRequest::new(sav.id, "user-1", "NYC", money(25_000)));

        assert!(matches!(result, Err(LedgerError::Conflict { .. })));
        assert_eq!(accounts.inserts.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_opening_deposit_below_minimum_is_rejected() {
        let service = service();
        let sav = service.policies().find_by_code("SAV").unwrap();

        let result =
            service.create_account(OpenAccountRequest::new(sav.id, "user-1", "NYC", money(5_000)));

        assert!(matches!(result, Err(LedgerError::PolicyViolation { .. })));
        assert!(service.accounts().is_empty());
    }

    #[test]
    fn test_opening_deposit_above_maximum_is_rejected() {
        let service = service();
        let chk = service.policies().find_by_code("CHK").unwrap();

        let result = service
            .create_account(OpenAccountRequest::new(chk.id, "user-1", "NYC", money(5_000_001)));

        assert!(matches!(result, Err(LedgerError::PolicyViolation { .. })));
    }

    #[test]
    fn test_create_with_inactive_or_missing_type() {
        let service = service();
        let chk = service.policies().find_by_code("CHK").unwrap();
        service.policies().toggle_status(chk.id).unwrap();

        let inactive =
            service.create_account(OpenAccountRequest::new(chk.id, "user-1", "NYC", money(5_000)));
        assert!(matches!(inactive, Err(LedgerError::PolicyViolation { .. })));

        let missing = service.create_account(OpenAccountRequest::new(
            uuid::Uuid::new_v4(),
            "user-1",
            "NYC",
            money(5_000),
        ));
        assert!(matches!(missing, Err(LedgerError::NotFound { .. })));
    }

    #[rstest]
    #[case::short_branch("N")]
    #[case::symbol_branch("NY-C")]
    fn test_create_rejects_bad_branch(#[case] branch: &str) {
        let service = service();
        let sav = service.policies().find_by_code("SAV").unwrap();

        let result =
            service.create_account(OpenAccountRequest::new(sav.id, "user-1", branch, money(10_000)));

        assert!(matches!(result, Err(LedgerError::Validation { .. })));
    }

    #[test]
    fn test_create_pending_account_cannot_transact() {
        let service = service();
        let sav = service.policies().find_by_code("SAV").unwrap();
        let account = service
            .create_account(OpenAccountRequest::new(sav.id, "user-1", "NYC", money(10_000)).pending())
            .unwrap();

        let result = service.credit(account.id, money(100));
        assert!(matches!(result, Err(LedgerError::AccountNotActive { .. })));

        service
            .set_status(account.id, AccountStatus::Active, "admin", None)
            .unwrap();
        assert!(service.credit(account.id, money(100)).is_ok());
    }

    #[test]
    fn test_debit_into_overdraft() {
        let service = service();
        let account = open(&service, "CHK", 10_000);
        service
            .update_settings(
                account.id,
                SettingsUpdate {
                    overdraft_limit: Some(money(5_000)),
                    ..SettingsUpdate::default()
                },
            )
            .unwrap();

        service.debit(account.id, money(12_000)).unwrap();

        let balance = service.get_balance(account.id).unwrap();
        assert_eq!(balance.available_balance, Decimal::ZERO);
        assert_eq!(balance.balance, Decimal::ZERO);
        assert_eq!(balance.overdraft_used, money(2_000));
        assert_eq!(balance.overdraft_available, money(3_000));
        assert_eq!(balance.total_available_funds, money(3_000));
    }

    #[test]
    fn test_close_with_cent_left_is_rejected() {
        let service = service();
        let account = open(&service, "CHK", 10_000);
        service.debit(account.id, money(9_999)).unwrap();

        let result = service.close_account(account.id, "No longer needed", "user-1");

        assert!(matches!(result, Err(LedgerError::PolicyViolation { .. })));
        assert_eq!(
            service.get_account(account.id).unwrap().status,
            AccountStatus::Active
        );
    }

    #[test]
    fn test_close_and_reactivate() {
        let service = service();
        let account = open(&service, "CHK", 10_000);
        service.debit(account.id, money(10_000)).unwrap();

        let closed = service
            .close_account(account.id, "No longer needed", "user-1")
            .unwrap();
        assert_eq!(closed.status, AccountStatus::Closed);
        assert!(closed.metadata.closed_at.is_some());
        assert_eq!(closed.metadata.closed_by.as_deref(), Some("user-1"));
        assert_eq!(
            closed.metadata.closure_reason.as_deref(),
            Some("No longer needed")
        );

        let reopened = service.reactivate_account(account.id, "admin").unwrap();
        assert_eq!(reopened.status, AccountStatus::Active);
        assert!(reopened.metadata.closed_at.is_none());
        assert!(reopened.metadata.closed_by.is_none());
        assert!(reopened.metadata.closure_reason.is_none());
    }

    #[test]
    fn test_adjust_balance_is_audited() {
        let sink = Arc::new(MemoryAuditSink::new());
        let service = service().with_audit_sink(sink.clone());
        let account = open(&service, "SAV", 10_000);

        let adjusted = service
            .adjust_balance(
                account.id,
                money(2_500),
                AdjustmentKind::Credit,
                "Fee refund",
                "admin-7",
            )
            .unwrap();

        assert_eq!(adjusted.balance, money(12_500));
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].actor, "admin-7");
        assert_eq!(entries[0].kind, AdjustmentKind::Credit);
        assert_eq!(entries[0].amount, money(2_500));
        assert_eq!(entries[0].balance_after, money(12_500));
        assert_eq!(entries[0].reason, "Fee refund");
    }

    #[rstest]
    #[case::too_short("oops")]
    #[case::blank("      ")]
    fn test_adjust_balance_requires_reason(#[case] reason: &str) {
        let sink = Arc::new(MemoryAuditSink::new());
        let service = service().with_audit_sink(sink.clone());
        let account = open(&service, "SAV", 10_000);

        let result =
            service.adjust_balance(account.id, money(100), AdjustmentKind::Debit, reason, "admin");

        assert!(matches!(result, Err(LedgerError::Validation { .. })));
        assert!(sink.entries().is_empty());
        assert_eq!(service.get_account(account.id).unwrap().balance, money(10_000));
    }

    #[test]
    fn test_failed_adjustment_is_not_audited() {
        let sink = Arc::new(MemoryAuditSink::new());
        let service = service().with_audit_sink(sink.clone());
        let account = open(&service, "SAV", 10_000);

        let result = service.adjust_balance(
            account.id,
            money(20_000),
            AdjustmentKind::Debit,
            "Chargeback",
            "admin",
        );

        assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn test_update_settings() {
        let service = service();
        let account = open(&service, "SAV", 10_000);
        let notifications = Notifications {
            low_balance: NotificationSetting {
                enabled: false,
                threshold: money(5_000),
            },
            ..Notifications::default()
        };

        let updated = service
            .update_settings(
                account.id,
                SettingsUpdate {
                    overdraft_limit: Some(money(2_500)),
                    notifications: Some(notifications),
                    monthly_statement_date: Some(15),
                },
            )
            .unwrap();

        assert_eq!(updated.overdraft_limit, money(2_500));
        assert!(!updated.notifications.low_balance.enabled);
        assert_eq!(updated.monthly_statement_date, 15);
    }

    #[rstest]
    #[case::day_zero(0)]
    #[case::day_thirty_two(32)]
    fn test_update_settings_rejects_statement_date(#[case] day: u8) {
        let service = service();
        let account = open(&service, "SAV", 10_000);

        let result = service.update_settings(
            account.id,
            SettingsUpdate {
                overdraft_limit: Some(money(2_500)),
                monthly_statement_date: Some(day),
                ..SettingsUpdate::default()
            },
        );

        assert!(matches!(result, Err(LedgerError::Validation { .. })));
        assert_eq!(
            service.get_account(account.id).unwrap().overdraft_limit,
            Decimal::ZERO
        );
    }

    #[test]
    fn test_transfer_moves_funds() {
        let service = service();
        let source = open(&service, "CHK", 10_000);
        let destination = open(&service, "SAV", 10_000);

        let receipt = service
            .transfer(source.id, destination.id, money(4_000))
            .unwrap();

        assert_eq!(receipt.source.balance, money(6_000));
        assert_eq!(receipt.destination.balance, money(14_000));
    }

    #[test]
    fn test_transfer_to_inactive_destination_leaves_source_untouched() {
        let service = service();
        let source = open(&service, "CHK", 10_000);
        let destination = open(&service, "SAV", 10_000);
        service
            .set_status(destination.id, AccountStatus::Suspended, "admin", Some("review"))
            .unwrap();

        let result = service.transfer(source.id, destination.id, money(4_000));

        assert!(matches!(result, Err(LedgerError::AccountNotActive { .. })));
        assert_eq!(service.get_account(source.id).unwrap().balance, money(10_000));
    }

    #[test]
    fn test_transfer_reverses_debit_when_credit_fails() {
        let service = service();
        let source = open(&service, "CHK", 10_000);
        service
            .update_settings(
                source.id,
                SettingsUpdate {
                    overdraft_limit: Some(money(5_000)),
                    ..SettingsUpdate::default()
                },
            )
            .unwrap();
        let destination = open(&service, "SAV", 10_000);
        // Push the destination close to overflow so the credit fails after
        // the destination checks have passed
        service
            .accounts()
            .update(destination.id, |account| {
                account.balance = Decimal::MAX;
                account.available_balance = Decimal::MAX;
                Ok(())
            })
            .unwrap();

        let result = service.transfer(source.id, destination.id, money(12_000));

        assert!(matches!(result, Err(LedgerError::ArithmeticOverflow { .. })));
        let source = service.get_account(source.id).unwrap();
        assert_eq!(source.balance, money(10_000));
        assert_eq!(source.available_balance, money(10_000));
        assert_eq!(source.overdraft_used, Decimal::ZERO);
    }

    #[test]
    fn test_transfer_rejections() {
        let service = service();
        let source = open(&service, "CHK", 10_000);
        let policy = service.policies().find_by_code("SAV").unwrap();
        let euro = service
            .create_account(
                OpenAccountRequest::new(policy.id, "user-2", "PAR", money(10_000))
                    .with_currency(Currency::Eur),
            )
            .unwrap();

        assert!(matches!(
            service.transfer(source.id, source.id, money(100)),
            Err(LedgerError::Validation { .. })
        ));
        assert!(matches!(
            service.transfer(source.id, euro.id, money(100)),
            Err(LedgerError::PolicyViolation { .. })
        ));
        assert!(matches!(
            service.transfer(source.id, euro.id, Decimal::ZERO),
            Err(LedgerError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_statement() {
        let service = service();
        let account = open(&service, "SAV", 3_650_000);
        service.debit(account.id, money(3_600_000)).unwrap();

        let statement = service.statement(account.id, None).unwrap();

        assert_eq!(statement.account_type.as_deref(), Some("SAV"));
        assert_eq!(statement.interest_days, 30);
        // 500.00 * 2.5% / 365 * 30
        assert_eq!(statement.projected_interest.to_string(), "1.03");
        assert!(!statement.minimum_balance.is_violated);
        assert_eq!(statement.overdraft.available, Decimal::ZERO);

        service.debit(account.id, money(45_000)).unwrap();
        let statement = service.statement(account.id, Some(365)).unwrap();
        assert!(statement.minimum_balance.is_violated);
        assert_eq!(statement.minimum_balance.shortage, money(5_000));
    }

    #[test]
    fn test_balances_near_decimal_limit_return_errors() {
        let service = service();
        let first = open(&service, "CHK", 5_000);
        let second = open(&service, "CHK", 5_000);
        let huge = Decimal::MAX - Decimal::from(1000);

        service.credit(first.id, huge).unwrap();
        service.credit(second.id, huge).unwrap();
        service
            .update_settings(
                first.id,
                SettingsUpdate {
                    overdraft_limit: Some(Decimal::MAX),
                    ..SettingsUpdate::default()
                },
            )
            .unwrap();

        let debited = service.debit(first.id, money(100)).unwrap();
        assert_eq!(debited.overdraft_used, Decimal::ZERO);
        assert_eq!(
            service.get_balance(first.id).unwrap().total_available_funds,
            Decimal::MAX
        );

        let statement = service.statement(first.id, None);
        assert!(matches!(statement, Err(LedgerError::ArithmeticOverflow { .. })));

        let stats = service.statistics();
        assert_eq!(stats.total_accounts, 2);
        assert_eq!(stats.total_balance, Decimal::MAX);
    }

    #[test]
    fn test_list_accounts_filters_and_paginates() {
        let service = service();
        for _ in 0..5 {
            open(&service, "SAV", 10_000);
        }
        let chk = open(&service, "CHK", 10_000);
        service
            .set_status(chk.id, AccountStatus::Suspended, "admin", None)
            .unwrap();

        let all = service.list_accounts(&AccountFilter::default(), PageRequest::new(1, 4));
        assert_eq!(all.total, 6);
        assert_eq!(all.items.len(), 4);
        assert_eq!(all.total_pages, 2);

        let second = service.list_accounts(&AccountFilter::default(), PageRequest::new(2, 4));
        assert_eq!(second.items.len(), 2);

        let suspended = service.list_accounts(
            &AccountFilter {
                status: Some(AccountStatus::Suspended),
                ..AccountFilter::default()
            },
            PageRequest::default(),
        );
        assert_eq!(suspended.total, 1);
        assert_eq!(suspended.items[0].id, chk.id);

        let by_number = service.list_accounts(
            &AccountFilter {
                number_contains: Some("nycchk".to_string()),
                ..AccountFilter::default()
            },
            PageRequest::default(),
        );
        assert_eq!(by_number.total, 1);
    }

    #[test]
    fn test_list_accounts_zero_page_and_limit_are_clamped() {
        let service = service();
        open(&service, "SAV", 10_000);
        open(&service, "SAV", 10_000);

        let page = service.list_accounts(&AccountFilter::default(), PageRequest::new(0, 0));

        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 1);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn test_statistics() {
        let service = service();
        open(&service, "SAV", 10_000);
        open(&service, "SAV", 20_000);
        let chk = open(&service, "CHK", 5_000);
        service.debit(chk.id, money(5_000)).unwrap();
        service.close_account(chk.id, "Consolidating", "user-1").unwrap();

        let stats = service.statistics();

        assert_eq!(stats.total_accounts, 3);
        assert_eq!(stats.by_status.active, 2);
        assert_eq!(stats.by_status.closed, 1);
        assert_eq!(stats.total_balance, money(30_000));
        assert_eq!(stats.by_type["SAV"].count, 2);
        assert_eq!(stats.by_type["SAV"].total_balance, money(30_000));
        assert!(!stats.by_type.contains_key("CHK"));
        assert_eq!(stats.by_branch["NYC"].count, 2);
    }

    #[test]
    fn test_concurrent_debits_never_overdraw() {
        let service = Arc::new(service());
        let account = open(&service, "CHK", 100_000);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&service);
                thread::spawn(move || {
                    (0..50)
                        .filter(|_| service.debit(account.id, money(300)).is_ok())
                        .count()
                })
            })
            .collect();
        let successes: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        // 1000.00 / 3.00 -> 333 debits fit, 1.00 remains
        assert_eq!(successes, 333);
        let account = service.get_account(account.id).unwrap();
        assert_eq!(account.balance, money(100));
        assert_eq!(account.overdraft_used, Decimal::ZERO);
    }
}
