use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::domain::account::{AccountEvent, AccountNumber};
use crate::event_sourcing::{EventEnvelope, EventListener};
use crate::metrics::Metrics;

use super::currency::format_eur;

// ============================================================================
// Balance Projection - Query Side
// ============================================================================
//
// Eventually-consistent read model: a plain account number → balance map,
// fed by the event bus and queried without touching the event log.
//
// The view lives in process memory only. It is rebuilt from whatever
// arrives on the bus after startup and is not reconciled against the event
// log, so a restart starts from an empty view until events flow again.
//
// ============================================================================

/// Read-side queries answered by the projection.
#[derive(Debug, Clone)]
pub enum Query {
    AccountBalance { account_number: AccountNumber },
}

pub struct BalanceProjection {
    balances: RwLock<HashMap<String, i64>>,
    metrics: Arc<Metrics>,
}

impl BalanceProjection {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            balances: RwLock::new(HashMap::new()),
            metrics,
        }
    }

    /// Answer a query from the materialized view.
    /// Unknown accounts produce an empty map, known ones a single entry
    /// with the balance formatted as a currency string.
    pub fn handle(&self, query: &Query) -> HashMap<String, String> {
        match query {
            Query::AccountBalance { account_number } => {
                let balances = self.balances.read().expect("balance view poisoned");
                match balances.get(account_number.as_str()) {
                    Some(balance) => HashMap::from([(
                        account_number.as_str().to_string(),
                        format_eur(*balance),
                    )]),
                    None => HashMap::new(),
                }
            }
        }
    }
}

#[async_trait]
impl EventListener<AccountEvent> for BalanceProjection {
    fn name(&self) -> &'static str {
        "balance-projection"
    }

    async fn on_event(&self, envelope: &EventEnvelope<AccountEvent>) -> anyhow::Result<()> {
        let mut balances = self.balances.write().expect("balance view poisoned");

        match &envelope.event_data {
            AccountEvent::Created(e) => {
                balances.insert(e.account_number.as_str().to_string(), e.balance);
            }
            AccountEvent::Deposited(e) => {
                *balances
                    .entry(e.account_number.as_str().to_string())
                    .or_insert(0) += e.amount;
            }
            AccountEvent::Withdrawn(e) => {
                *balances
                    .entry(e.account_number.as_str().to_string())
                    .or_insert(0) -= e.amount;
            }
        }

        self.metrics.projection_accounts.set(balances.len() as i64);

        tracing::debug!(
            account_number = %envelope.event_data.account_number(),
            sequence_number = envelope.sequence_number,
            event_type = %envelope.event_type,
            "Projection updated"
        );

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
