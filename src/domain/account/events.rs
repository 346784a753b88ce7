use serde::{Deserialize, Serialize};

use crate::event_sourcing::DomainEvent;

use super::value_objects::AccountNumber;

// ============================================================================
// Account Domain Events
// ============================================================================
//
// Immutable facts about an account. Amounts are in minor currency units.
// Sequence numbers and timestamps live on the envelope, not here.
//
// ============================================================================

/// Union type for all account events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AccountEvent {
    Created(AccountCreated),
    Deposited(MoneyDeposited),
    Withdrawn(MoneyWithdrawn),
}

impl AccountEvent {
    /// Per-variant type name, recorded on the envelope and used as a metric
    /// label.
    pub fn event_name(&self) -> &'static str {
        match self {
            AccountEvent::Created(_) => "AccountCreated",
            AccountEvent::Deposited(_) => "MoneyDeposited",
            AccountEvent::Withdrawn(_) => "MoneyWithdrawn",
        }
    }

    pub fn account_number(&self) -> &AccountNumber {
        match self {
            AccountEvent::Created(e) => &e.account_number,
            AccountEvent::Deposited(e) => &e.account_number,
            AccountEvent::Withdrawn(e) => &e.account_number,
        }
    }
}

impl DomainEvent for AccountEvent {
    fn event_type() -> &'static str {
        "AccountEvent"
    }
}

// Individual event types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountCreated {
    pub account_number: AccountNumber,
    pub name: String,
    pub balance: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoneyDeposited {
    pub account_number: AccountNumber,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoneyWithdrawn {
    pub account_number: AccountNumber,
    pub amount: i64,
}
