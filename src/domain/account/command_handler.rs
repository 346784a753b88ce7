use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use uuid::Uuid;

use crate::event_sourcing::{Aggregate, EventEnvelope, EventStore};
use crate::metrics::Metrics;

use super::aggregate::AccountAggregate;
use super::commands::AccountCommand;
use super::errors::{AccountError, CommandError};
use super::events::AccountEvent;
use super::value_objects::AccountNumber;

// ============================================================================
// Account Command Handler
// ============================================================================
//
// Orchestrates: Command → business rules → Aggregate → Events → Event Store
//
// The whole load-validate-append cycle is serialized per account number, so
// at most one command is in flight for a given account at a time; commands
// against different accounts proceed in parallel.
//
// ============================================================================

/// Business rules the handler enforces. Everything here is configuration,
/// not domain structure.
#[derive(Debug, Clone)]
pub struct CommandPolicy {
    /// Deposits and withdrawals below this amount are rejected.
    pub min_transaction_amount: i64,
    /// Account holder names starting with this prefix are rejected.
    pub disallowed_name_prefix: String,
    /// When false, withdrawals that would make the balance negative are
    /// rejected. The reference behavior is to allow them.
    pub allow_overdraft: bool,
}

impl Default for CommandPolicy {
    fn default() -> Self {
        Self {
            min_transaction_amount: 1_000,
            disallowed_name_prefix: "Cindy".to_string(),
            allow_overdraft: true,
        }
    }
}

pub struct AccountCommandHandler {
    event_store: Arc<EventStore<AccountEvent>>,
    policy: CommandPolicy,
    metrics: Arc<Metrics>,
    account_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl AccountCommandHandler {
    pub fn new(
        event_store: Arc<EventStore<AccountEvent>>,
        policy: CommandPolicy,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            event_store,
            policy,
            metrics,
            account_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Handle a command: validate, load, apply, persist, publish.
    /// On success the returned aggregate reflects the appended events.
    pub async fn handle(&self, command: AccountCommand) -> Result<AccountAggregate, CommandError> {
        let started = Instant::now();
        let kind = command.kind();

        let lock = self.account_lock(command.account_number());
        let _guard = lock.lock().await;

        let result = self.handle_locked(&command).await;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(CommandError::Rejected(_)) => "rejected",
            Err(CommandError::Store(_)) => "error",
        };
        self.metrics
            .record_command(kind, outcome, started.elapsed().as_secs_f64());

        match &result {
            Ok(account) => tracing::info!(
                command = kind,
                account_number = %account.account_number(),
                balance = account.balance(),
                "Command handled"
            ),
            Err(error) => tracing::warn!(
                command = kind,
                account_number = %command.account_number(),
                error = %error,
                "Command failed"
            ),
        }

        result
    }

    async fn handle_locked(
        &self,
        command: &AccountCommand,
    ) -> Result<AccountAggregate, CommandError> {
        match command {
            AccountCommand::OpenAccount {
                account_number,
                name,
                balance,
            } => {
                // An empty prefix disables the name rule entirely.
                if !self.policy.disallowed_name_prefix.is_empty()
                    && name.starts_with(&self.policy.disallowed_name_prefix)
                {
                    return Err(AccountError::DisallowedName(name.clone()).into());
                }
                if self.event_store.stream_exists(account_number.as_str()).await {
                    return Err(AccountError::AlreadyExists(account_number.clone()).into());
                }

                let (account, events) =
                    AccountAggregate::open(account_number.clone(), name.clone(), *balance)?;
                self.save(account, 0, events).await
            }

            AccountCommand::Deposit {
                account_number,
                amount,
            } => {
                self.check_minimum(*amount)?;
                let current = self.load(account_number).await?;

                let (account, events) = current.deposit(*amount)?;
                self.save(account, current.version(), events).await
            }

            AccountCommand::Withdraw {
                account_number,
                amount,
            } => {
                self.check_minimum(*amount)?;
                let current = self.load(account_number).await?;

                if !self.policy.allow_overdraft && *amount > current.balance() {
                    return Err(AccountError::InsufficientFunds {
                        account_number: account_number.clone(),
                        amount: *amount,
                        balance: current.balance(),
                    }
                    .into());
                }

                let (account, events) = current.withdraw(*amount)?;
                self.save(account, current.version(), events).await
            }
        }
    }

    fn check_minimum(&self, amount: i64) -> Result<(), AccountError> {
        if amount < self.policy.min_transaction_amount {
            return Err(AccountError::AmountTooSmall {
                amount,
                minimum: self.policy.min_transaction_amount,
            });
        }
        Ok(())
    }

    async fn load(&self, account_number: &AccountNumber) -> Result<AccountAggregate, CommandError> {
        self.event_store
            .load_aggregate(account_number.as_str())
            .await?
            .ok_or_else(|| AccountError::NotFound(account_number.clone()).into())
    }

    /// Wrap the emitted events in envelopes and append them. The store
    /// publishes each appended event before returning.
    async fn save(
        &self,
        account: AccountAggregate,
        expected_version: i64,
        events: Vec<AccountEvent>,
    ) -> Result<AccountAggregate, CommandError> {
        let correlation_id = Uuid::new_v4();

        let envelopes: Vec<EventEnvelope<AccountEvent>> = events
            .into_iter()
            .map(|event| {
                self.metrics.record_append(event.event_name());
                EventEnvelope::new(
                    account.aggregate_id(),
                    event.event_name(),
                    event,
                    correlation_id,
                )
            })
            .collect();

        self.event_store
            .append_events(account.aggregate_id(), expected_version, envelopes)
            .await?;

        Ok(account)
    }

    fn account_lock(&self, account_number: &AccountNumber) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .account_locks
            .lock()
            .expect("account lock registry poisoned");
        locks
            .entry(account_number.as_str().to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
