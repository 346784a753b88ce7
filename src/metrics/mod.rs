// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Command handling (throughput by outcome, latency)
// - Event store appends
// - Event bus deliveries and listener failures
// - Balance projection size
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // Command handling
    pub commands_total: IntCounterVec,
    pub command_duration: HistogramVec,

    // Event store
    pub events_appended: IntCounterVec,

    // Event bus
    pub events_delivered: IntCounterVec,
    pub listener_failures: IntCounterVec,

    // Projection
    pub projection_accounts: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let commands_total = IntCounterVec::new(
            Opts::new("ledger_commands_total", "Commands handled, by outcome"),
            &["command", "outcome"],
        )?;
        registry.register(Box::new(commands_total.clone()))?;

        let command_duration = HistogramVec::new(
            HistogramOpts::new("ledger_command_duration_seconds", "Command handling duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["command"],
        )?;
        registry.register(Box::new(command_duration.clone()))?;

        let events_appended = IntCounterVec::new(
            Opts::new("ledger_events_appended_total", "Events appended to the event store"),
            &["event_type"],
        )?;
        registry.register(Box::new(events_appended.clone()))?;

        let events_delivered = IntCounterVec::new(
            Opts::new("ledger_events_delivered_total", "Events delivered to bus listeners"),
            &["listener", "event_type"],
        )?;
        registry.register(Box::new(events_delivered.clone()))?;

        let listener_failures = IntCounterVec::new(
            Opts::new(
                "ledger_listener_failures_total",
                "Deliveries dropped after all retries, by listener",
            ),
            &["listener", "event_type"],
        )?;
        registry.register(Box::new(listener_failures.clone()))?;

        let projection_accounts = IntGauge::new(
            "ledger_projection_accounts",
            "Accounts currently known to the balance projection",
        )?;
        registry.register(Box::new(projection_accounts.clone()))?;

        Ok(Self {
            registry,
            commands_total,
            command_duration,
            events_appended,
            events_delivered,
            listener_failures,
            projection_accounts,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record one handled command
    pub fn record_command(&self, command: &str, outcome: &str, duration_secs: f64) {
        self.commands_total
            .with_label_values(&[command, outcome])
            .inc();
        self.command_duration
            .with_label_values(&[command])
            .observe(duration_secs);
    }

    /// Record an appended event
    pub fn record_append(&self, event_type: &str) {
        self.events_appended.with_label_values(&[event_type]).inc();
    }

    /// Record a bus delivery outcome for one listener
    pub fn record_delivery(&self, listener: &str, event_type: &str, success: bool) {
        if success {
            self.events_delivered
                .with_label_values(&[listener, event_type])
                .inc();
        } else {
            self.listener_failures
                .with_label_values(&[listener, event_type])
                .inc();
        }
    }
}
