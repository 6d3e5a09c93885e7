//! Error types for the ledger engine
//!
//! This module defines every error the ledger, the account type registry and
//! the account service can return. Errors are typed results; the engine never
//! renders user-facing text beyond the `Display` messages below.
//!
//! # Error Categories
//!
//! - **Amount Errors**: non-positive or non-finite amounts
//! - **Funds Errors**: debits exceeding balance plus overdraft headroom
//! - **State Errors**: mutations against non-active accounts, invalid status transitions
//! - **Policy Errors**: opening deposits below minimum balance, invalid policy bounds
//! - **Lookup Errors**: missing accounts or account types, duplicates

use crate::types::{AccountId, AccountStatus};
use rust_decimal::Decimal;
use thiserror::Error;

/// Classification of a [`LedgerError`]
///
/// The route layer maps these onto transport status codes; the ledger itself
/// only reports the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidAmount,
    InsufficientFunds,
    AccountNotActive,
    PolicyViolation,
    Validation,
    NotFound,
    Conflict,
    InvalidTransition,
    Forbidden,
    Arithmetic,
}

/// Main error type for the ledger engine
///
/// Every variant is a local, recoverable error. Operations detect these
/// before applying any mutation, so a returned error always means the
/// account state is unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Amount is zero, negative, or not representable
    #[error("Invalid amount '{amount}': amount must be greater than zero")]
    InvalidAmount {
        /// The rejected amount as received
        amount: String,
    },

    /// Debit exceeds available balance plus remaining overdraft
    #[error(
        "Insufficient funds on account {account}: available {available}, requested {requested}"
    )]
    InsufficientFunds {
        /// Account number
        account: String,
        /// Total available funds (available balance + overdraft headroom)
        available: Decimal,
        /// Requested debit amount
        requested: Decimal,
    },

    /// Balance mutation attempted on an account that is not active
    #[error("Account {account} is {status} and cannot be used")]
    AccountNotActive {
        /// Account number
        account: String,
        /// Current status of the account
        status: AccountStatus,
    },

    /// A business policy rejected the operation
    #[error("Policy violation: {message}")]
    PolicyViolation {
        /// Description of the violated policy
        message: String,
    },

    /// Input failed field validation
    #[error("Validation failed for {field}: {message}")]
    Validation {
        /// Offending field
        field: String,
        /// Description of the problem
        message: String,
    },

    /// Requested entity does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of entity ("Account", "Account type", ...)
        entity: String,
        /// Identifier that was looked up
        id: String,
    },

    /// Uniqueness or usage conflict
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflict
        message: String,
    },

    /// Status change not permitted by the account state machine
    #[error("Account {account} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Account number
        account: String,
        /// Current status
        from: AccountStatus,
        /// Requested status
        to: AccountStatus,
    },

    /// Caller role is not allowed to perform the action
    #[error("Role '{role}' is not allowed to {action}")]
    Forbidden {
        /// Caller role
        role: String,
        /// Attempted action
        action: String,
    },

    /// Checked arithmetic overflowed
    #[error("Arithmetic overflow in {operation} on account {account}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Account number
        account: String,
    },
}

impl LedgerError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            LedgerError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LedgerError::AccountNotActive { .. } => ErrorKind::AccountNotActive,
            LedgerError::PolicyViolation { .. } => ErrorKind::PolicyViolation,
            LedgerError::Validation { .. } => ErrorKind::Validation,
            LedgerError::NotFound { .. } => ErrorKind::NotFound,
            LedgerError::Conflict { .. } => ErrorKind::Conflict,
            LedgerError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            LedgerError::Forbidden { .. } => ErrorKind::Forbidden,
            LedgerError::ArithmeticOverflow { .. } => ErrorKind::Arithmetic,
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: impl ToString) -> Self {
        LedgerError::InvalidAmount {
            amount: amount.to_string(),
        }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account: &str, available: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientFunds {
            account: account.to_string(),
            available,
            requested,
        }
    }

    /// Create an AccountNotActive error
    pub fn account_not_active(account: &str, status: AccountStatus) -> Self {
        LedgerError::AccountNotActive {
            account: account.to_string(),
            status,
        }
    }

    /// Create a PolicyViolation error
    pub fn policy_violation(message: impl Into<String>) -> Self {
        LedgerError::PolicyViolation {
            message: message.into(),
        }
    }

    /// Create a Validation error
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Create a NotFound error for an account id
    pub fn account_not_found(id: AccountId) -> Self {
        LedgerError::NotFound {
            entity: "Account".to_string(),
            id: id.to_string(),
        }
    }

    /// Create a NotFound error for an arbitrary entity
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        LedgerError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Create a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        LedgerError::Conflict {
            message: message.into(),
        }
    }

    /// Create an InvalidTransition error
    pub fn invalid_transition(account: &str, from: AccountStatus, to: AccountStatus) -> Self {
        LedgerError::InvalidTransition {
            account: account.to_string(),
            from,
            to,
        }
    }

    /// Create a Forbidden error
    pub fn forbidden(role: impl ToString, action: impl ToString) -> Self {
        LedgerError::Forbidden {
            role: role.to_string(),
            action: action.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: &str) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            account: account.to_string(),
        }
    }
}
