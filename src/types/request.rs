//! Inputs of the account service operations

use super::account::{AccountStatus, AccountTypeId, Currency, Notifications};
use rust_decimal::Decimal;

/// Request to open an account
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAccountRequest {
    pub account_type_id: AccountTypeId,
    pub owner_id: String,
    pub branch_code: String,
    pub branch_name: String,
    pub branch_address: Option<String>,
    /// Must lie within the account type's balance bounds
    pub opening_deposit: Decimal,
    pub currency: Currency,
    /// `active` (default) or `pending`
    pub status: AccountStatus,
    pub opened_by: Option<String>,
}

impl OpenAccountRequest {
    pub fn new(
        account_type_id: AccountTypeId,
        owner_id: impl Into<String>,
        branch_code: impl Into<String>,
        opening_deposit: Decimal,
    ) -> Self {
        let branch_code = branch_code.into();
        Self {
            account_type_id,
            owner_id: owner_id.into(),
            branch_name: branch_code.clone(),
            branch_code,
            branch_address: None,
            opening_deposit,
            currency: Currency::default(),
            status: AccountStatus::Active,
            opened_by: None,
        }
    }

    pub fn with_branch_name(mut self, name: impl Into<String>) -> Self {
        self.branch_name = name.into();
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn pending(mut self) -> Self {
        self.status = AccountStatus::Pending;
        self
    }

    pub fn opened_by(mut self, actor: impl Into<String>) -> Self {
        self.opened_by = Some(actor.into());
        self
    }
}

/// Account settings change; `None` fields stay as they are
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SettingsUpdate {
    pub overdraft_limit: Option<Decimal>,
    pub notifications: Option<Notifications>,
    /// Day of month, 1-31
    pub monthly_statement_date: Option<u8>,
}

/// Filter of `list_accounts`; every set field must match
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccountFilter {
    pub status: Option<AccountStatus>,
    pub account_type_id: Option<AccountTypeId>,
    pub branch_code: Option<String>,
    pub owner_id: Option<String>,
    /// Case-insensitive substring of the account number
    pub number_contains: Option<String>,
}

/// 1-based page selection
///
/// Only built through [`PageRequest::new`], so `page` and `limit` are never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: usize,
    limit: usize,
}

impl PageRequest {
    pub const MAX_LIMIT: usize = 100;

    /// Clamp `page` to at least 1 and `limit` to 1-100
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of items before this page
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 10)
    }
}
