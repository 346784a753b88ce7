use crate::event_sourcing::StoreError;

use super::value_objects::AccountNumber;

// ============================================================================
// Account Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("account [{0}] already exists")]
    AlreadyExists(AccountNumber),

    #[error("account [{0}] does not exist")]
    NotFound(AccountNumber),

    #[error("account holder name [{0}] is not accepted here")]
    DisallowedName(String),

    #[error("amount {amount} is below the minimum transaction of {minimum}")]
    AmountTooSmall { amount: i64, minimum: i64 },

    #[error("withdrawing {amount} would overdraw account [{account_number}] (balance {balance})")]
    InsufficientFunds {
        account_number: AccountNumber,
        amount: i64,
        balance: i64,
    },

    #[error("stream applied a movement before the account was created")]
    NotInitialized,

    #[error("stream created account [{0}] more than once")]
    AlreadyInitialized(AccountNumber),
}

/// Outcome channel of the command handler: business rejections are distinct
/// from infrastructure failures, so the adapter can map them to 400 vs 500.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Rejected(#[from] AccountError),

    #[error("event store failure: {0}")]
    Store(#[from] StoreError),
}
