//! Account ledger engine
//!
//! This module provides the stateless `LedgerEngine`, which applies balance
//! mutations and status transitions to a plain [`Account`] value.
//!
//! The LedgerEngine is responsible for:
//! - Crediting and debiting with overdraft bookkeeping
//! - Enforcing the account status state machine
//! - Minimum balance compliance reporting and interest calculation
//!
//! Every operation validates first and mutates last: a returned error means
//! the account was not touched. Callers serialize operations per account (see
//! [`crate::core::AccountRepository::update`]).
//!
//! # Overdraft semantics
//!
//! Neither `balance` nor `available_balance` ever goes below zero. A debit
//! that exceeds the available balance drains it to zero and records the
//! excess in `overdraft_used`. A credit repays outstanding overdraft before
//! adding to the balance.

use crate::types::money::{positive_amount, round_money, zero};
use crate::types::{Account, AccountStatus, AccountType, LedgerError, MinimumBalanceCheck};
use chrono::Utc;
use rust_decimal::Decimal;

/// Interest period used when callers do not pass one
pub const DEFAULT_INTEREST_DAYS: u32 = 30;

/// Stateless engine applying ledger rules to accounts
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerEngine;

impl LedgerEngine {
    pub fn new() -> Self {
        LedgerEngine
    }

    /// Whether `amount` fits within available balance plus overdraft headroom
    ///
    /// Pure predicate with no side effects.
    pub fn can_debit(&self, account: &Account, amount: Decimal) -> bool {
        account.total_available_funds() >= amount
    }

    /// Credit funds to an active account
    ///
    /// Outstanding overdraft is repaid first; the remainder increases both
    /// `balance` and `available_balance`. No maximum balance is enforced here.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if the amount is not strictly positive after rounding
    /// - `AccountNotActive` if the account status is not active
    /// - `ArithmeticOverflow` if the new balance is not representable
    pub fn credit(&self, account: &mut Account, amount: Decimal) -> Result<(), LedgerError> {
        let amount = validate_amount(amount)?;
        ensure_active(account)?;
        self.apply_credit(account, amount)
    }

    /// Debit funds from an active account
    ///
    /// The part of `amount` above the available balance is drawn from the
    /// overdraft. Balances floor at zero.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if the amount is not strictly positive after rounding
    /// - `AccountNotActive` if the account status is not active
    /// - `InsufficientFunds` if `amount` exceeds total available funds
    pub fn debit(&self, account: &mut Account, amount: Decimal) -> Result<(), LedgerError> {
        let amount = validate_amount(amount)?;
        ensure_active(account)?;

        if !self.can_debit(account, amount) {
            return Err(LedgerError::insufficient_funds(
                &account.account_number,
                account.total_available_funds(),
                amount,
            ));
        }

        let from_available = amount.min(account.available_balance);
        let shortfall = amount - from_available;

        let new_available = round_money(account.available_balance - from_available);
        let new_balance = round_money((account.balance - amount).max(Decimal::ZERO));
        let new_overdraft = round_money(account.overdraft_used + shortfall);

        let now = Utc::now();
        account.available_balance = new_available;
        account.balance = new_balance;
        account.overdraft_used = new_overdraft;
        account.last_transaction_date = Some(now);
        account.updated_at = now;

        Ok(())
    }

    /// Undo a debit of `amount` regardless of the account status
    ///
    /// Used as the compensating action of a failed transfer. The account may
    /// have been suspended between the debit and its reversal; the funds are
    /// returned anyway.
    pub(crate) fn reverse_debit(
        &self,
        account: &mut Account,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        let amount = validate_amount(amount)?;
        self.apply_credit(account, amount)
    }

    fn apply_credit(&self, account: &mut Account, amount: Decimal) -> Result<(), LedgerError> {
        let repaid = amount.min(account.overdraft_used);
        let remainder = amount - repaid;

        let new_balance = account
            .balance
            .checked_add(remainder)
            .ok_or_else(|| LedgerError::arithmetic_overflow("credit", &account.account_number))?;
        let new_available = account
            .available_balance
            .checked_add(remainder)
            .ok_or_else(|| LedgerError::arithmetic_overflow("credit", &account.account_number))?;

        let now = Utc::now();
        account.overdraft_used = round_money(account.overdraft_used - repaid);
        account.balance = round_money(new_balance);
        account.available_balance = round_money(new_available);
        account.last_transaction_date = Some(now);
        account.updated_at = now;

        Ok(())
    }

    /// Compare the balance against the account type's minimum balance
    ///
    /// Advisory only: debits are never blocked by this check. Without a
    /// policy the check reports no violation.
    pub fn check_minimum_balance(
        &self,
        account: &Account,
        policy: Option<&AccountType>,
    ) -> MinimumBalanceCheck {
        let current = account.balance;
        let required = policy
            .map(|p| round_money(p.minimum_balance))
            .unwrap_or_else(zero);
        let shortage = round_money((required - current).max(Decimal::ZERO));

        MinimumBalanceCheck {
            is_violated: current < required,
            required,
            current,
            shortage,
        }
    }

    /// Simple interest earned over `days`: `balance * rate / 100 / 365 * days`
    ///
    /// Returns zero when the interest rate is zero or the policy is missing.
    ///
    /// # Errors
    ///
    /// `ArithmeticOverflow` if the product is not representable.
    pub fn calculate_interest(
        &self,
        account: &Account,
        policy: Option<&AccountType>,
        days: u32,
    ) -> Result<Decimal, LedgerError> {
        let Some(policy) = policy else {
            return Ok(zero());
        };
        if policy.interest_rate.is_zero() {
            return Ok(zero());
        }

        // Multiply before dividing to keep the intermediate exact
        let numerator = account
            .balance
            .checked_mul(policy.interest_rate)
            .and_then(|product| product.checked_mul(Decimal::from(days)))
            .ok_or_else(|| LedgerError::arithmetic_overflow("interest", &account.account_number))?;
        Ok(round_money(numerator / Decimal::from(36_500)))
    }

    /// Whether the state machine permits `from -> to`
    pub fn is_transition_allowed(from: AccountStatus, to: AccountStatus) -> bool {
        use AccountStatus::*;
        matches!(
            (from, to),
            (Pending, Active)
                | (Active, Inactive)
                | (Active, Suspended)
                | (Active, Closed)
                | (Closed, Active)
                | (Suspended, Active)
        )
    }

    /// Move an account to `to`, applying the side effects of the transition
    ///
    /// - Closing requires a zero balance and no overdraft, and records the
    ///   closure metadata.
    /// - Leaving `closed` or `suspended` clears the closure metadata.
    pub fn change_status(
        &self,
        account: &mut Account,
        to: AccountStatus,
        actor: Option<&str>,
        reason: Option<&str>,
    ) -> Result<(), LedgerError> {
        let from = account.status;
        if !Self::is_transition_allowed(from, to) {
            return Err(LedgerError::invalid_transition(
                &account.account_number,
                from,
                to,
            ));
        }

        if to == AccountStatus::Closed {
            if !account.balance.is_zero() {
                return Err(LedgerError::policy_violation(format!(
                    "Account balance must be zero before closing (current {})",
                    account.balance
                )));
            }
            if !account.overdraft_used.is_zero() {
                return Err(LedgerError::policy_violation(format!(
                    "Outstanding overdraft must be cleared before closing (used {})",
                    account.overdraft_used
                )));
            }
        }

        let now = Utc::now();
        match (from, to) {
            (_, AccountStatus::Closed) => {
                account.metadata.closed_at = Some(now);
                account.metadata.closed_by = actor.map(str::to_string);
                account.metadata.closure_reason = reason.map(str::to_string);
            }
            (AccountStatus::Closed | AccountStatus::Suspended, AccountStatus::Active) => {
                account.metadata.clear_closure();
            }
            _ => {}
        }
        account.status = to;
        account.updated_at = now;

        Ok(())
    }

    /// Close an active account
    pub fn close(
        &self,
        account: &mut Account,
        actor: &str,
        reason: &str,
    ) -> Result<(), LedgerError> {
        self.change_status(account, AccountStatus::Closed, Some(actor), Some(reason))
    }

    /// Return a closed or suspended account to active
    pub fn reactivate(&self, account: &mut Account) -> Result<(), LedgerError> {
        match account.status {
            AccountStatus::Closed | AccountStatus::Suspended => {
                self.change_status(account, AccountStatus::Active, None, None)
            }
            from => Err(LedgerError::invalid_transition(
                &account.account_number,
                from,
                AccountStatus::Active,
            )),
        }
    }

    /// Change the overdraft limit
    ///
    /// The new limit cannot be below the overdraft already in use, and closed
    /// accounts cannot be changed.
    pub fn set_overdraft_limit(
        &self,
        account: &mut Account,
        limit: Decimal,
    ) -> Result<(), LedgerError> {
        let limit = round_money(limit);
        if limit < Decimal::ZERO {
            return Err(LedgerError::validation(
                "overdraft_limit",
                "Overdraft limit cannot be negative",
            ));
        }
        if account.status == AccountStatus::Closed {
            return Err(LedgerError::account_not_active(
                &account.account_number,
                account.status,
            ));
        }
        if limit < account.overdraft_used {
            return Err(LedgerError::policy_violation(format!(
                "Overdraft limit {} is below the overdraft in use ({})",
                limit, account.overdraft_used
            )));
        }

        account.overdraft_limit = limit;
        account.updated_at = Utc::now();
        Ok(())
    }
}

fn validate_amount(amount: Decimal) -> Result<Decimal, LedgerError> {
    positive_amount(amount).ok_or_else(|| LedgerError::invalid_amount(amount))
}

fn ensure_active(account: &Account) -> Result<(), LedgerError> {
    if account.is_active() {
        Ok(())
    } else {
        Err(LedgerError::account_not_active(
            &account.account_number,
            account.status,
        ))
    }
}
