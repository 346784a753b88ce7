use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::event_sourcing::core::EventEnvelope;
use crate::metrics::Metrics;
use crate::utils::{retry_with_backoff, RetryConfig, RetryResult};

// ============================================================================
// Event Bus - Synchronous In-Process Fan-Out
// ============================================================================
//
// Delivers every published envelope to every registered listener, in
// registration order. `publish` returns only after all listeners ran.
//
// A listener failure is retried with backoff, then logged and dropped for
// that listener only: an already-appended event is never rolled back, and
// the remaining listeners still receive it.
//
// ============================================================================

/// A consumer of published events. Listeners must tolerate redelivery: a
/// failed `on_event` is retried before being dropped.
#[async_trait]
pub trait EventListener<E>: Send + Sync {
    /// Stable name, used in logs and metric labels.
    fn name(&self) -> &'static str;

    async fn on_event(&self, envelope: &EventEnvelope<E>) -> anyhow::Result<()>;
}

pub struct EventBus<E> {
    listeners: RwLock<Vec<Arc<dyn EventListener<E>>>>,
    retry: RetryConfig,
    metrics: Arc<Metrics>,
}

impl<E: Send + Sync> EventBus<E> {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self::with_retry(metrics, RetryConfig::conservative())
    }

    pub fn with_retry(metrics: Arc<Metrics>, retry: RetryConfig) -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            retry,
            metrics,
        }
    }

    pub fn register(&self, listener: Arc<dyn EventListener<E>>) {
        let mut listeners = self
            .listeners
            .write()
            .expect("event bus listener registry poisoned");
        tracing::info!(listener = listener.name(), "Registered event listener");
        listeners.push(listener);
    }

    /// Deliver one envelope to every registered listener, in order.
    pub async fn publish(&self, envelope: &EventEnvelope<E>) {
        let listeners = self
            .listeners
            .read()
            .expect("event bus listener registry poisoned")
            .clone();

        for listener in listeners {
            let outcome =
                retry_with_backoff(self.retry.clone(), |_attempt| listener.on_event(envelope))
                    .await;

            match outcome {
                RetryResult::Success(()) => {
                    self.metrics
                        .record_delivery(listener.name(), &envelope.event_type, true);
                }
                RetryResult::Failed(error) => {
                    // The append is already durable; losing one listener's
                    // update must not fail the command.
                    tracing::error!(
                        listener = listener.name(),
                        aggregate_id = %envelope.aggregate_id,
                        sequence_number = envelope.sequence_number,
                        event_type = %envelope.event_type,
                        error = %error,
                        "Dropping event delivery after all retries"
                    );
                    self.metrics
                        .record_delivery(listener.name(), &envelope.event_type, false);
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct TestEvent {
        value: i64,
    }

    struct Recorder {
        name: &'static str,
        seen: Mutex<Vec<i64>>,
    }

    impl Recorder {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EventListener<TestEvent> for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn on_event(&self, envelope: &EventEnvelope<TestEvent>) -> anyhow::Result<()> {
            self.seen.lock().unwrap().push(envelope.event_data.value);
            Ok(())
        }
    }

    fn envelope(value: i64) -> EventEnvelope<TestEvent> {
        EventEnvelope::new("ACC1", "TestEvent", TestEvent { value }, Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_publish_fans_out_in_registration_order() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let bus: EventBus<TestEvent> = EventBus::new(metrics);

        let first = Arc::new(Recorder::new("first"));
        let second = Arc::new(Recorder::new("second"));
        bus.register(first.clone());
        bus.register(second.clone());

        bus.publish(&envelope(1)).await;
        bus.publish(&envelope(2)).await;

        assert_eq!(*first.seen.lock().unwrap(), vec![1, 2]);
        assert_eq!(*second.seen.lock().unwrap(), vec![1, 2]);
    }

    struct FailingOnce {
        attempts: AtomicU32,
    }

    #[async_trait]
    impl EventListener<TestEvent> for FailingOnce {
        fn name(&self) -> &'static str {
            "failing-once"
        }

        async fn on_event(&self, _envelope: &EventEnvelope<TestEvent>) -> anyhow::Result<()> {
            if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                anyhow::bail!("transient listener failure");
            }
            Ok(())
        }
    }

    struct AlwaysFailing;

    #[async_trait]
    impl EventListener<TestEvent> for AlwaysFailing {
        fn name(&self) -> &'static str {
            "always-failing"
        }

        async fn on_event(&self, _envelope: &EventEnvelope<TestEvent>) -> anyhow::Result<()> {
            anyhow::bail!("permanently broken");
        }
    }

    #[tokio::test]
    async fn test_transient_listener_failure_is_retried() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let bus: EventBus<TestEvent> = EventBus::new(metrics);

        let listener = Arc::new(FailingOnce {
            attempts: AtomicU32::new(0),
        });
        bus.register(listener.clone());

        bus.publish(&envelope(7)).await;

        assert_eq!(listener.attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failing_listener_does_not_stop_the_others() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let bus: EventBus<TestEvent> = EventBus::with_retry(
            metrics.clone(),
            RetryConfig {
                max_attempts: 2,
                initial_delay: std::time::Duration::from_millis(1),
                max_delay: std::time::Duration::from_millis(5),
                multiplier: 2.0,
            },
        );

        let healthy = Arc::new(Recorder::new("healthy"));
        bus.register(Arc::new(AlwaysFailing));
        bus.register(healthy.clone());

        bus.publish(&envelope(9)).await;

        assert_eq!(*healthy.seen.lock().unwrap(), vec![9]);

        let gathered = metrics.registry().gather();
        let failures = gathered
            .iter()
            .find(|m| m.name() == "ledger_listener_failures_total")
            .unwrap();
        assert_eq!(failures.metric[0].counter.value, Some(1.0));
    }
}
