//! Core business logic module
//!
//! This module contains the account ledger components:
//! - `traits` - Persistence, policy lookup and audit seams
//! - `ledger` - Balance, overdraft and status rules on a single account
//! - `registry` - Account type policies with a read cache
//! - `number_generator` - Account number generation
//! - `account_store` - Concurrent in-memory account repository
//! - `audit` - Audit trail of manual adjustments
//! - `service` - Account service, the inbound interface of the ledger
//! - `engine` - Replay of operation records against the service
//! - `batch_processor` - Concurrent replay with account-based partitioning

pub mod account_store;
pub mod audit;
pub mod batch_processor;
pub mod engine;
pub mod ledger;
pub mod number_generator;
pub mod registry;
pub mod service;
pub mod traits;

pub use account_store::InMemoryAccountRepository;
pub use audit::{AdjustmentKind, AuditEntry, MemoryAuditSink, TracingAuditSink};
pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use engine::OperationEngine;
pub use ledger::{LedgerEngine, DEFAULT_INTEREST_DAYS};
pub use number_generator::AccountNumberGenerator;
pub use registry::{AccountTypeRegistry, RegistryConfig};
pub use service::{AccountService, ServiceConfig};
pub use traits::{AccountRepository, AuditSink, PolicyLookup};
