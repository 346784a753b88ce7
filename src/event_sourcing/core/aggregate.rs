use super::event::EventEnvelope;

// ============================================================================
// Aggregate Root Pattern - Event Sourcing Core
// ============================================================================
//
// Key principles:
// 1. State is derived from events (not stored directly)
// 2. Commands emit events; they never mutate state themselves
// 3. `apply_event` is the single authoritative transition function
// 4. Replay folds the ordered event stream from the identity value
//
// This is the GENERIC aggregate trait that works for ANY domain aggregate.
//
// ============================================================================

/// Generic aggregate trait - all event-sourced aggregates implement this.
///
/// `Default` is the fold seed: the identity value replay starts from when a
/// stream is rebuilt.
pub trait Aggregate: Default + Sized + Send + Sync {
    type Event;
    type Command;
    type Error;

    /// Apply one event to update state. This is the only state transition
    /// in the system: both live command handling and replay go through it.
    fn apply_event(&mut self, event: &Self::Event) -> Result<(), Self::Error>;

    /// Handle a command and emit events (business logic). Never mutates
    /// `self`; the new state is obtained by folding the emitted events.
    fn handle_command(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;

    /// Stream identity of this aggregate.
    fn aggregate_id(&self) -> &str;

    /// Sequence number of the last applied event.
    fn version(&self) -> i64;

    /// Reconstruct the aggregate by folding its event history, in ascending
    /// sequence order, starting from the identity value.
    fn load_from_events(envelopes: &[EventEnvelope<Self::Event>]) -> Result<Self, Self::Error> {
        let mut aggregate = Self::default();
        for envelope in envelopes {
            aggregate.apply_event(&envelope.event_data)?;
        }
        Ok(aggregate)
    }
}
