use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

// ============================================================================
// Event Envelope - Event Metadata
// ============================================================================
//
// Wraps domain events with metadata for proper event sourcing.
// This is GENERIC and works with ANY event type.
//
// ============================================================================

/// Generic event envelope - wraps any domain event with stream metadata.
///
/// `sequence_number` is assigned by the event store at append time and is
/// the replay ordering key. `timestamp` records when the event was created
/// and plays no part in ordering.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EventEnvelope<E> {
    // Event identity
    pub event_id: Uuid,
    pub aggregate_id: String,
    pub sequence_number: i64,

    // Event type information
    pub event_type: String,
    pub event_version: i32,

    // Event payload
    pub event_data: E,

    // Groups the events emitted by one command
    pub correlation_id: Uuid,

    // Timing (metadata only, not an ordering key)
    pub timestamp: DateTime<Utc>,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        aggregate_id: impl Into<String>,
        event_type: impl Into<String>,
        event_data: E,
        correlation_id: Uuid,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            aggregate_id: aggregate_id.into(),
            sequence_number: 0, // assigned by the store at append time
            event_type: event_type.into(),
            event_version: 1,
            event_data,
            correlation_id,
            timestamp: Utc::now(),
        }
    }
}

// ============================================================================
// Domain Event Trait
// ============================================================================

/// All domain events must implement this trait to be used with the event
/// store.
pub trait DomainEvent: Serialize + for<'de> Deserialize<'de> + Clone + Send + Sync {
    fn event_type() -> &'static str
    where
        Self: Sized;

    fn event_version() -> i32
    where
        Self: Sized,
    {
        1
    }
}

// ============================================================================
// Event Serialization Helpers
// ============================================================================

pub fn serialize_event<E: Serialize>(event: &E) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}

pub fn deserialize_event<E: for<'de> Deserialize<'de>>(json: &str) -> Result<E, serde_json::Error> {
    serde_json::from_str(json)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Clone, Debug)]
    struct TestEvent {
        data: String,
    }

    impl DomainEvent for TestEvent {
        fn event_type() -> &'static str {
            "TestEvent"
        }
    }

    #[test]
    fn test_event_envelope_creation() {
        let correlation_id = Uuid::new_v4();

        let event = TestEvent {
            data: "test".to_string(),
        };

        let envelope = EventEnvelope::new("ACC1", "TestEvent", event, correlation_id);

        assert_eq!(envelope.aggregate_id, "ACC1");
        assert_eq!(envelope.sequence_number, 0);
        assert_eq!(envelope.event_type, "TestEvent");
        assert_eq!(envelope.event_version, 1);
        assert_eq!(envelope.correlation_id, correlation_id);
    }

    #[test]
    fn test_event_serialization() {
        let event = TestEvent {
            data: "test data".to_string(),
        };

        let json = serialize_event(&event).unwrap();
        let deserialized: TestEvent = deserialize_event(&json).unwrap();

        assert_eq!(event.data, deserialized.data);
    }
}
