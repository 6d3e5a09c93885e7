//! Audit trail of administrative balance adjustments

use super::traits::AuditSink;
use crate::types::AccountId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Mutex;

/// Direction of a manual balance adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentKind {
    Credit,
    Debit,
}

impl fmt::Display for AdjustmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AdjustmentKind::Credit => "credit",
            AdjustmentKind::Debit => "debit",
        })
    }
}

/// One audited adjustment
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub actor: String,
    pub kind: AdjustmentKind,
    pub account_id: AccountId,
    pub account_number: String,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// Audit sink emitting each entry as a structured `tracing` event
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, entry: AuditEntry) {
        tracing::info!(
            target: "ledger::audit",
            actor = %entry.actor,
            kind = %entry.kind,
            account = %entry.account_number,
            amount = %entry.amount,
            balance_after = %entry.balance_after,
            reason = %entry.reason,
            timestamp = %entry.timestamp,
            "balance adjusted"
        );
    }
}

/// Audit sink keeping entries in memory
///
/// Useful when the caller wants to inspect or export the trail afterwards.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every recorded entry, oldest first
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, entry: AuditEntry) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(entry);
    }
}
