//! Rust Ledger Engine Library
//!
//! # Overview
//!
//! This library provides an in-memory account ledger: a registry of account
//! type policies, unique account number generation, balance operations with
//! overdraft handling, and an account lifecycle state machine. An operation
//! replay CLI drives it from CSV with a sync and an async strategy.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Account, AccountType, OperationRecord, errors)
//! - [`core`] - Business logic components:
//!   - [`core::registry`] - Account type policies with a read cache
//!   - [`core::number_generator`] - Branch and type prefixed account numbers
//!   - [`core::ledger`] - Pure balance and status rules
//!   - [`core::service`] - Account service over a repository and a policy lookup
//!   - [`core::engine`] - Replay of operation records with role checks
//!   - [`core::batch_processor`] - Partitioned parallel replay
//! - [`io`] - CSV input and output
//! - [`cli`] - CLI arguments parsing
//! - [`strategy`] - Sync and async replay pipelines
//!
//! # Balances
//!
//! Each account maintains:
//! - `balance` and `available_balance`, never negative
//! - `overdraft_limit` and `overdraft_used`, with `overdraft_used <= overdraft_limit`
//!
//! A debit first drains the available balance and takes the rest from the
//! overdraft. A credit first repays the overdraft.

pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{AccountService, AccountTypeRegistry, LedgerEngine, OperationEngine};
pub use io::write_accounts_csv;
pub use types::{
    Account, AccountId, AccountStatus, AccountType, LedgerError, OperationRecord, OperationType,
};
