//! Prometheus metrics for the economy service.
//!
//! [`EconomyMetrics`] owns a dedicated [`Registry`]; the host process decides
//! how to expose it (for example by serving [`EconomyMetrics::render`] on a
//! `/metrics` route).

use prometheus::{
    register_gauge_with_registry, register_histogram_with_registry,
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, Gauge, Histogram, HistogramOpts, IntCounter,
    IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

use crate::EconomyEngine;

/// Central collection of all economy-level Prometheus metrics.
pub struct EconomyMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Commands handled, by operation and outcome (`ok` or an error category).
    pub operations: IntCounterVec,
    /// Events emitted, by event name.
    pub events: IntCounterVec,
    /// Write batches committed to the store.
    pub batches_flushed: IntCounter,
    /// Flushes that failed.
    pub flush_failures: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Sum of all stakes, in raw token units. Precision is lost past 2^53.
    pub total_staked: Gauge,
    /// Sum of all vault balances, in raw token units.
    pub total_vault_balances: Gauge,
    /// Players with a non-zero stake.
    pub staker_count: IntGauge,
    /// Registered usernames.
    pub username_count: IntGauge,
    /// Referral links.
    pub referral_count: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Time spent handling one command, in milliseconds.
    pub command_time_ms: Histogram,
}

impl EconomyMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        let operations = register_int_counter_vec_with_registry!(
            Opts::new(
                "stakevault_operations_total",
                "Economy commands handled, by operation and outcome"
            ),
            &["operation", "outcome"],
            registry
        )
        .expect("failed to register operations counter");

        let events = register_int_counter_vec_with_registry!(
            Opts::new("stakevault_events_total", "Economy events emitted"),
            &["event"],
            registry
        )
        .expect("failed to register events counter");

        let batches_flushed = register_int_counter_with_registry!(
            Opts::new(
                "stakevault_batches_flushed_total",
                "Write batches committed to the store"
            ),
            registry
        )
        .expect("failed to register batches_flushed counter");

        let flush_failures = register_int_counter_with_registry!(
            Opts::new("stakevault_flush_failures_total", "Failed store flushes"),
            registry
        )
        .expect("failed to register flush_failures counter");

        let total_staked = register_gauge_with_registry!(
            Opts::new("stakevault_total_staked", "Sum of all stakes in raw units"),
            registry
        )
        .expect("failed to register total_staked gauge");

        let total_vault_balances = register_gauge_with_registry!(
            Opts::new(
                "stakevault_total_vault_balances",
                "Sum of all vault balances in raw units"
            ),
            registry
        )
        .expect("failed to register total_vault_balances gauge");

        let staker_count = register_int_gauge_with_registry!(
            Opts::new("stakevault_staker_count", "Players with a non-zero stake"),
            registry
        )
        .expect("failed to register staker_count gauge");

        let username_count = register_int_gauge_with_registry!(
            Opts::new("stakevault_username_count", "Registered usernames"),
            registry
        )
        .expect("failed to register username_count gauge");

        let referral_count = register_int_gauge_with_registry!(
            Opts::new("stakevault_referral_count", "Referral links"),
            registry
        )
        .expect("failed to register referral_count gauge");

        let command_time_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "stakevault_command_time_ms",
                "Command handling time in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(0.01, 2.0, 16).unwrap()),
            registry
        )
        .expect("failed to register command_time_ms histogram");

        Self {
            registry,
            operations,
            events,
            batches_flushed,
            flush_failures,
            total_staked,
            total_vault_balances,
            staker_count,
            username_count,
            referral_count,
            command_time_ms,
        }
    }

    /// Count one handled command.
    pub fn record_operation(&self, operation: &str, outcome: &str) {
        self.operations
            .with_label_values(&[operation, outcome])
            .inc();
    }

    /// Refresh every gauge from the engine's current state.
    pub fn observe_engine(&self, engine: &EconomyEngine) {
        self.total_staked
            .set(engine.staking().total_staked().raw() as f64);
        self.total_vault_balances
            .set(engine.vault().total_balances().raw() as f64);
        self.staker_count
            .set(engine.staking().staker_count() as i64);
        self.username_count
            .set(engine.directory().registered_count() as i64);
        self.referral_count
            .set(engine.referrals().edge_count() as i64);
    }

    /// Encode the registry in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for EconomyMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operations_are_labelled() {
        let metrics = EconomyMetrics::new();
        metrics.record_operation("stake", "ok");
        metrics.record_operation("stake", "ok");
        metrics.record_operation("stake", "validation");
        assert_eq!(
            metrics
                .operations
                .with_label_values(&["stake", "ok"])
                .get(),
            2
        );
        assert_eq!(
            metrics
                .operations
                .with_label_values(&["stake", "validation"])
                .get(),
            1
        );
    }

    #[test]
    fn render_contains_metric_names() {
        let metrics = EconomyMetrics::new();
        metrics.record_operation("deposit", "ok");
        metrics.batches_flushed.inc();
        let text = metrics.render().unwrap();
        assert!(text.contains("stakevault_operations_total"));
        assert!(text.contains("stakevault_batches_flushed_total 1"));
    }

    #[test]
    fn separate_instances_do_not_collide() {
        let a = EconomyMetrics::new();
        let b = EconomyMetrics::new();
        a.batches_flushed.inc();
        assert_eq!(b.batches_flushed.get(), 0);
    }
}
