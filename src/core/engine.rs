//! Operation replay engine
//!
//! This module provides the `OperationEngine`, which turns parsed
//! [`OperationRecord`]s into account service calls.
//!
//! The engine is responsible for:
//! - Mapping caller-chosen account references to generated account ids
//! - Evaluating the caller's role before any call reaches the ledger
//! - Routing each operation type to its service operation
//!
//! All state lives in concurrent maps, so one engine can be shared across
//! tasks. Operations on the same account reference must still be submitted
//! in order by the caller (see [`crate::core::BatchProcessor`]).

use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::debug;

use super::audit::AdjustmentKind;
use super::service::AccountService;
use super::traits::PolicyLookup;
use crate::types::{
    is_authorized, Account, AccountId, AccountRef, AccountStatus, Action, LedgerError,
    OpenAccountRequest, OperationRecord, OperationType, SettingsUpdate,
};

const DEFAULT_CLOSURE_REASON: &str = "Closed by account holder";

/// Engine applying replayed operations to an account service
pub struct OperationEngine {
    service: Arc<AccountService>,

    /// Account reference -> account id, filled by `open` records
    references: DashMap<AccountRef, AccountId>,
}

impl OperationEngine {
    pub fn new(service: Arc<AccountService>) -> Self {
        Self {
            service,
            references: DashMap::new(),
        }
    }

    pub fn service(&self) -> &AccountService {
        &self.service
    }

    /// Action a record needs authorization for
    pub fn required_action(op_type: OperationType) -> Action {
        match op_type {
            OperationType::Open => Action::OpenAccount,
            OperationType::Credit | OperationType::Debit => Action::Transact,
            OperationType::Transfer => Action::Transfer,
            OperationType::AdjustCredit | OperationType::AdjustDebit => Action::AdjustBalance,
            OperationType::Close => Action::CloseAccount,
            OperationType::Reactivate => Action::ReactivateAccount,
            OperationType::Suspend | OperationType::Deactivate => Action::ChangeStatus,
            OperationType::Overdraft => Action::UpdateSettings,
        }
    }

    /// Apply a single record
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the record's role may not perform the operation
    /// - `Validation` if a field the operation needs is missing
    /// - `NotFound` if an account reference was never opened
    /// - any error of the underlying service operation
    pub fn process(&self, record: OperationRecord) -> Result<(), LedgerError> {
        let action = Self::required_action(record.op_type);
        if !is_authorized(record.role, action) {
            return Err(LedgerError::forbidden(record.role, action));
        }

        let actor = record.role.to_string();
        match record.op_type {
            OperationType::Open => {
                self.open(&record)?;
            }
            OperationType::Credit => {
                self.service
                    .credit(self.resolve(&record.account)?, required_amount(&record)?)?;
            }
            OperationType::Debit => {
                self.service
                    .debit(self.resolve(&record.account)?, required_amount(&record)?)?;
            }
            OperationType::Transfer => {
                let target = record
                    .target
                    .as_ref()
                    .ok_or_else(|| LedgerError::validation("target", "Transfer needs a target"))?;
                self.service.transfer(
                    self.resolve(&record.account)?,
                    self.resolve(target)?,
                    required_amount(&record)?,
                )?;
            }
            OperationType::AdjustCredit | OperationType::AdjustDebit => {
                let kind = if record.op_type == OperationType::AdjustCredit {
                    AdjustmentKind::Credit
                } else {
                    AdjustmentKind::Debit
                };
                self.service.adjust_balance(
                    self.resolve(&record.account)?,
                    required_amount(&record)?,
                    kind,
                    record.reason.as_deref().unwrap_or_default(),
                    &actor,
                )?;
            }
            OperationType::Close => {
                self.service.close_account(
                    self.resolve(&record.account)?,
                    record.reason.as_deref().unwrap_or(DEFAULT_CLOSURE_REASON),
                    &actor,
                )?;
            }
            OperationType::Reactivate => {
                self.service
                    .reactivate_account(self.resolve(&record.account)?, &actor)?;
            }
            OperationType::Suspend | OperationType::Deactivate => {
                let status = if record.op_type == OperationType::Suspend {
                    AccountStatus::Suspended
                } else {
                    AccountStatus::Inactive
                };
                self.service.set_status(
                    self.resolve(&record.account)?,
                    status,
                    &actor,
                    record.reason.as_deref(),
                )?;
            }
            OperationType::Overdraft => {
                self.service.update_settings(
                    self.resolve(&record.account)?,
                    SettingsUpdate {
                        overdraft_limit: Some(required_amount(&record)?),
                        ..SettingsUpdate::default()
                    },
                )?;
            }
        }

        debug!(op = record.op_type.as_str(), account = %record.account, "operation applied");
        Ok(())
    }

    fn open(&self, record: &OperationRecord) -> Result<(), LedgerError> {
        if self.references.contains_key(&record.account) {
            return Err(LedgerError::conflict(format!(
                "Account reference {} is already open",
                record.account
            )));
        }
        let code = record
            .account_type
            .as_deref()
            .ok_or_else(|| LedgerError::validation("account_type", "Open needs an account type"))?;
        let policy = self
            .service
            .policies()
            .find_by_code(code)
            .ok_or_else(|| LedgerError::not_found("Account type", code))?;
        let branch = record
            .branch
            .as_deref()
            .ok_or_else(|| LedgerError::validation("branch", "Open needs a branch"))?;

        let mut request =
            OpenAccountRequest::new(policy.id, record.account.clone(), branch, required_amount(record)?)
                .opened_by(record.role.to_string());
        if let Some(currency) = record.currency {
            request = request.with_currency(currency);
        }

        let account = self.service.create_account(request)?;
        self.references.insert(record.account.clone(), account.id);
        Ok(())
    }

    fn resolve(&self, reference: &str) -> Result<AccountId, LedgerError> {
        self.references
            .get(reference)
            .map(|entry| *entry.value())
            .ok_or_else(|| LedgerError::not_found("Account reference", reference))
    }

    /// Every opened account with its reference, sorted by reference
    pub fn accounts(&self) -> Vec<(AccountRef, Account)> {
        let mut accounts: Vec<(AccountRef, Account)> = self
            .references
            .iter()
            .filter_map(|entry| {
                self.service
                    .get_account(*entry.value())
                    .ok()
                    .map(|account| (entry.key().clone(), account))
            })
            .collect();
        accounts.sort_by(|a, b| a.0.cmp(&b.0));
        accounts
    }
}

fn required_amount(record: &OperationRecord) -> Result<Decimal, LedgerError> {
    record.amount.ok_or_else(|| {
        LedgerError::validation(
            "amount",
            format!("{} needs an amount", record.op_type.as_str()),
        )
    })
}
