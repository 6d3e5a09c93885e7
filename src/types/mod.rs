//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account ledger state and its value types
//! - `account_type`: Account type policy records
//! - `money`: Two-decimal rounding helpers
//! - `operation`: Replay operation records
//! - `request`: Inputs of the account service
//! - `report`: Statements, statistics and other read-only results
//! - `role`: Caller roles and the authorization predicate
//! - `error`: Error types for the ledger engine

pub mod account;
pub mod account_type;
pub mod error;
pub mod money;
pub mod operation;
pub mod report;
pub mod request;
pub mod role;

pub use account::{
    Account, AccountId, AccountMetadata, AccountStatus, AccountTypeId, BalanceSnapshot, Branch,
    Currency, NotificationSetting, Notifications,
};
pub use account_type::{
    AccountType, AccountTypePatch, AccountTypeUsage, NewAccountType, PopularAccountType,
    TransactionLimit, TransactionLimitPatch,
};
pub use error::{ErrorKind, LedgerError};
pub use operation::{AccountRef, OperationRecord, OperationType};
pub use report::{
    AccountStatement, AccountStatistics, GroupTotal, MinimumBalanceCheck, OverdraftSummary, Page,
    StatusCounts, TransferReceipt,
};
pub use request::{AccountFilter, OpenAccountRequest, PageRequest, SettingsUpdate};
pub use role::{is_authorized, Action, Role};
