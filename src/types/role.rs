//! Caller roles and the authorization predicate
//!
//! Authorization is evaluated by the operation layer before any call reaches
//! the ledger. The ledger itself never inspects roles.

use std::fmt;
use std::str::FromStr;

/// Role of the caller issuing an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    #[default]
    Customer,
    Support,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Customer => "customer",
            Role::Support => "support",
            Role::Admin => "admin",
        })
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "customer" | "user" => Ok(Role::Customer),
            "support" => Ok(Role::Support),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Invalid role '{}'", other)),
        }
    }
}

/// Operations subject to authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    OpenAccount,
    Transact,
    Transfer,
    CloseAccount,
    UpdateSettings,
    AdjustBalance,
    ReactivateAccount,
    ChangeStatus,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::OpenAccount => "open accounts",
            Action::Transact => "credit or debit accounts",
            Action::Transfer => "transfer funds",
            Action::CloseAccount => "close accounts",
            Action::UpdateSettings => "update account settings",
            Action::AdjustBalance => "adjust balances",
            Action::ReactivateAccount => "reactivate accounts",
            Action::ChangeStatus => "change account status",
        })
    }
}

/// Whether `role` may perform `action`
///
/// Customers and support staff can use accounts; balance adjustments,
/// reactivation and status changes are reserved to administrators.
pub fn is_authorized(role: Role, action: Action) -> bool {
    match action {
        Action::OpenAccount
        | Action::Transact
        | Action::Transfer
        | Action::CloseAccount
        | Action::UpdateSettings => true,
        Action::AdjustBalance
        | Action::ReactivateAccount
        | Action::ChangeStatus => role == Role::Admin,
    }
}
