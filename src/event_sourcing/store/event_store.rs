use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::event_sourcing::bus::EventBus;
use crate::event_sourcing::core::{
    deserialize_event, serialize_event, Aggregate, DomainEvent, EventEnvelope,
};

// ============================================================================
// Generic Event Store - Repository for Events
// ============================================================================
//
// In-memory, append-only store keyed by stream id (one stream per
// aggregate). This is a GENERIC event store that works with ANY event type.
//
// Responsibilities:
// 1. Append events to a stream (append-only, never rewrites history)
// 2. Assign per-stream sequence numbers at append time
// 3. Enforce optimistic concurrency control
// 4. Publish appended events through the event bus, in emission order,
//    only after the append succeeded
// 5. Load event history and rebuild aggregates by replay
//
// Events are persisted as serialized JSON payloads with type/version
// metadata; the physical encoding is an implementation choice, not part of
// the store's contract.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot append an empty event list to stream [{0}]")]
    EmptyAppend(String),

    #[error("concurrency conflict on stream [{stream}]: expected version {expected}, current is {actual}")]
    Conflict {
        stream: String,
        expected: i64,
        actual: i64,
    },

    #[error("failed to encode or decode an event payload: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("failed to replay stream [{stream}]: {reason}")]
    Replay { stream: String, reason: String },
}

/// One persisted row of a stream. The payload is stored serialized, the way
/// a durable backend would hold it.
#[derive(Clone, Debug)]
struct StoredEvent {
    event_id: Uuid,
    sequence_number: i64,
    event_type: String,
    event_version: i32,
    payload: String,
    correlation_id: Uuid,
    timestamp: DateTime<Utc>,
}

pub struct EventStore<E: DomainEvent> {
    streams: RwLock<HashMap<String, Vec<StoredEvent>>>,
    bus: Arc<EventBus<E>>,
}

impl<E: DomainEvent> EventStore<E> {
    pub fn new(bus: Arc<EventBus<E>>) -> Self {
        tracing::debug!(
            event_type = E::event_type(),
            event_version = E::event_version(),
            "Event store created"
        );
        Self {
            streams: RwLock::new(HashMap::new()),
            bus,
        }
    }

    /// Append events to a stream and publish them.
    /// Returns the new version number after appending.
    pub async fn append_events(
        &self,
        aggregate_id: &str,
        expected_version: i64,
        mut events: Vec<EventEnvelope<E>>,
    ) -> Result<i64, StoreError> {
        if events.is_empty() {
            return Err(StoreError::EmptyAppend(aggregate_id.to_string()));
        }

        // Encode every payload up front so a codec failure cannot leave a
        // partially appended stream behind.
        let mut payloads = Vec::with_capacity(events.len());
        for envelope in &events {
            payloads.push(serialize_event(&envelope.event_data)?);
        }

        let new_version = {
            let mut streams = self.streams.write().expect("event store poisoned");
            let stream = streams.entry(aggregate_id.to_string()).or_default();

            // Optimistic concurrency check
            let current_version = stream.len() as i64;
            if current_version != expected_version {
                return Err(StoreError::Conflict {
                    stream: aggregate_id.to_string(),
                    expected: expected_version,
                    actual: current_version,
                });
            }

            let mut sequence = expected_version;
            for (envelope, payload) in events.iter_mut().zip(payloads) {
                sequence += 1;
                envelope.sequence_number = sequence;
                stream.push(StoredEvent {
                    event_id: envelope.event_id,
                    sequence_number: sequence,
                    event_type: envelope.event_type.clone(),
                    event_version: envelope.event_version,
                    payload,
                    correlation_id: envelope.correlation_id,
                    timestamp: envelope.timestamp,
                });
            }
            sequence
        };

        // Publish after the append is in place. The append and the publish
        // form one logical unit: nothing is published for a rejected append,
        // and a listener failure never unwinds appended events.
        for envelope in &events {
            self.bus.publish(envelope).await;
        }

        tracing::info!(
            aggregate_id = %aggregate_id,
            new_version = new_version,
            event_count = events.len(),
            "✅ Appended events to event store"
        );

        Ok(new_version)
    }

    /// Load all events for a stream, in ascending sequence order.
    pub async fn load_events(&self, aggregate_id: &str) -> Result<Vec<EventEnvelope<E>>, StoreError> {
        let rows = {
            let streams = self.streams.read().expect("event store poisoned");
            streams.get(aggregate_id).cloned().unwrap_or_default()
        };

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let event_data: E = deserialize_event(&row.payload)?;
            events.push(EventEnvelope {
                event_id: row.event_id,
                aggregate_id: aggregate_id.to_string(),
                sequence_number: row.sequence_number,
                event_type: row.event_type,
                event_version: row.event_version,
                event_data,
                correlation_id: row.correlation_id,
                timestamp: row.timestamp,
            });
        }

        tracing::debug!(
            aggregate_id = %aggregate_id,
            event_count = events.len(),
            "Loaded events"
        );
        Ok(events)
    }

    /// Get current version of a stream (0 for an unknown stream).
    pub async fn current_version(&self, aggregate_id: &str) -> i64 {
        let streams = self.streams.read().expect("event store poisoned");
        streams.get(aggregate_id).map_or(0, |s| s.len() as i64)
    }

    /// Check if a stream has any events.
    pub async fn stream_exists(&self, aggregate_id: &str) -> bool {
        self.current_version(aggregate_id).await > 0
    }

    /// Rebuild an aggregate by replaying its stream.
    /// Returns `None` when the stream has no events.
    pub async fn load_aggregate<A>(&self, aggregate_id: &str) -> Result<Option<A>, StoreError>
    where
        A: Aggregate<Event = E>,
        A::Error: std::fmt::Display,
    {
        let events = self.load_events(aggregate_id).await?;
        if events.is_empty() {
            return Ok(None);
        }

        A::load_from_events(&events)
            .map(Some)
            .map_err(|e| StoreError::Replay {
                stream: aggregate_id.to_string(),
                reason: e.to_string(),
            })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{
        AccountAggregate, AccountCreated, AccountEvent, AccountNumber, MoneyDeposited,
    };
    use crate::event_sourcing::bus::EventListener;
    use crate::metrics::Metrics;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recorder {
        seen: Mutex<Vec<(i64, String)>>,
    }

    #[async_trait]
    impl EventListener<AccountEvent> for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        async fn on_event(&self, envelope: &EventEnvelope<AccountEvent>) -> anyhow::Result<()> {
            self.seen
                .lock()
                .unwrap()
                .push((envelope.sequence_number, envelope.event_type.clone()));
            Ok(())
        }
    }

    fn created(number: &str, balance: i64) -> EventEnvelope<AccountEvent> {
        let event = AccountEvent::Created(AccountCreated {
            account_number: AccountNumber::new(number),
            name: "Jan".to_string(),
            balance,
        });
        EventEnvelope::new(number, "AccountCreated", event, Uuid::new_v4())
    }

    fn deposited(number: &str, amount: i64) -> EventEnvelope<AccountEvent> {
        let event = AccountEvent::Deposited(MoneyDeposited {
            account_number: AccountNumber::new(number),
            amount,
        });
        EventEnvelope::new(number, "MoneyDeposited", event, Uuid::new_v4())
    }

    fn store_with_recorder() -> (EventStore<AccountEvent>, Arc<Recorder>) {
        let metrics = Arc::new(Metrics::new().unwrap());
        let bus = Arc::new(EventBus::new(metrics));
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        bus.register(recorder.clone());
        (EventStore::new(bus), recorder)
    }

    #[tokio::test]
    async fn test_append_assigns_contiguous_sequence_numbers() {
        let (store, _) = store_with_recorder();

        let v1 = store
            .append_events("ACC1", 0, vec![created("ACC1", 10_000)])
            .await
            .unwrap();
        assert_eq!(v1, 1);

        let v2 = store
            .append_events(
                "ACC1",
                1,
                vec![deposited("ACC1", 1_000), deposited("ACC1", 2_000)],
            )
            .await
            .unwrap();
        assert_eq!(v2, 3);

        let events = store.load_events("ACC1").await.unwrap();
        let sequences: Vec<i64> = events.iter().map(|e| e.sequence_number).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_append_rejects_version_conflict() {
        let (store, recorder) = store_with_recorder();

        store
            .append_events("ACC1", 0, vec![created("ACC1", 10_000)])
            .await
            .unwrap();

        let result = store
            .append_events("ACC1", 0, vec![deposited("ACC1", 1_000)])
            .await;

        assert!(matches!(
            result,
            Err(StoreError::Conflict {
                expected: 0,
                actual: 1,
                ..
            })
        ));

        // The rejected append must not publish nor grow the stream.
        assert_eq!(store.current_version("ACC1").await, 1);
        assert_eq!(recorder.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_append_rejects_empty_event_list() {
        let (store, _) = store_with_recorder();

        let result = store.append_events("ACC1", 0, vec![]).await;
        assert!(matches!(result, Err(StoreError::EmptyAppend(_))));
    }

    #[tokio::test]
    async fn test_streams_are_append_only() {
        let (store, _) = store_with_recorder();

        store
            .append_events("ACC1", 0, vec![created("ACC1", 10_000)])
            .await
            .unwrap();
        let before = store.load_events("ACC1").await.unwrap();

        store
            .append_events("ACC1", 1, vec![deposited("ACC1", 5_000)])
            .await
            .unwrap();
        let after = store.load_events("ACC1").await.unwrap();

        // The existing prefix is untouched, the new event is appended at the
        // tail.
        assert_eq!(after.len(), before.len() + 1);
        for (old, new) in before.iter().zip(after.iter()) {
            assert_eq!(old.event_id, new.event_id);
            assert_eq!(old.sequence_number, new.sequence_number);
        }
        assert_eq!(after.last().unwrap().sequence_number, 2);
    }

    #[tokio::test]
    async fn test_publishes_each_appended_event_in_order() {
        let (store, recorder) = store_with_recorder();

        store
            .append_events("ACC1", 0, vec![created("ACC1", 10_000)])
            .await
            .unwrap();
        store
            .append_events(
                "ACC1",
                1,
                vec![deposited("ACC1", 1_000), deposited("ACC1", 2_000)],
            )
            .await
            .unwrap();

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (1, "AccountCreated".to_string()),
                (2, "MoneyDeposited".to_string()),
                (3, "MoneyDeposited".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_load_aggregate_returns_none_for_unknown_stream() {
        let (store, _) = store_with_recorder();

        let loaded: Option<AccountAggregate> = store.load_aggregate("missing").await.unwrap();
        assert!(loaded.is_none());
        assert!(!store.stream_exists("missing").await);
    }

    #[tokio::test]
    async fn test_load_aggregate_replays_stream() {
        let (store, _) = store_with_recorder();

        store
            .append_events("ACC1", 0, vec![created("ACC1", 10_000)])
            .await
            .unwrap();
        store
            .append_events("ACC1", 1, vec![deposited("ACC1", 2_500)])
            .await
            .unwrap();

        let account: AccountAggregate = store.load_aggregate("ACC1").await.unwrap().unwrap();
        assert_eq!(account.account_number().as_str(), "ACC1");
        assert_eq!(account.balance(), 12_500);
        assert_eq!(account.version(), 2);
    }

    #[tokio::test]
    async fn test_streams_are_isolated() {
        let (store, _) = store_with_recorder();

        store
            .append_events("ACC1", 0, vec![created("ACC1", 10_000)])
            .await
            .unwrap();
        store
            .append_events("ACC2", 0, vec![created("ACC2", 5_000)])
            .await
            .unwrap();

        assert_eq!(store.current_version("ACC1").await, 1);
        assert_eq!(store.current_version("ACC2").await, 1);

        let acc2: AccountAggregate = store.load_aggregate("ACC2").await.unwrap().unwrap();
        assert_eq!(acc2.balance(), 5_000);
    }
}
