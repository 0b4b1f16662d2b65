//! Prometheus metrics for the relayer.
//!
//! [`IntentMetrics`] owns a dedicated [`Registry`] that the HTTP `/metrics`
//! endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, Encoder, HistogramOpts, HistogramVec, IntCounter,
    IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::NodeError;

pub struct IntentMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Intents persisted, by kind.
    pub accepted: IntCounterVec,
    /// Intents and eligibility probes refused, by kind and reason.
    pub rejected: IntCounterVec,
    /// Records the relay service landed synchronously.
    pub relayed: IntCounter,
    pub relay_failures: IntCounter,
    pub notify_failures: IntCounter,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Wall time of a full submission, in milliseconds.
    pub submit_time_ms: HistogramVec,
}

impl IntentMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let accepted = register_int_counter_vec_with_registry!(
            Opts::new("sigrelay_intents_accepted_total", "Intents persisted"),
            &["kind"],
            registry
        )
        .expect("failed to register accepted counter");

        let rejected = register_int_counter_vec_with_registry!(
            Opts::new("sigrelay_intents_rejected_total", "Intents and probes refused"),
            &["kind", "reason"],
            registry
        )
        .expect("failed to register rejected counter");

        let relayed = register_int_counter_with_registry!(
            Opts::new("sigrelay_relayed_total", "Records relayed synchronously"),
            registry
        )
        .expect("failed to register relayed counter");

        let relay_failures = register_int_counter_with_registry!(
            Opts::new("sigrelay_relay_failures_total", "Relay dispatch failures"),
            registry
        )
        .expect("failed to register relay_failures counter");

        let notify_failures = register_int_counter_with_registry!(
            Opts::new("sigrelay_notify_failures_total", "Webhook notification failures"),
            registry
        )
        .expect("failed to register notify_failures counter");

        // 1 ms → ~16 s
        let submit_time_ms = register_histogram_vec_with_registry!(
            HistogramOpts::new("sigrelay_submit_time_ms", "Submission time in milliseconds")
                .buckets(prometheus::exponential_buckets(1.0, 2.0, 15).unwrap()),
            &["kind"],
            registry
        )
        .expect("failed to register submit_time_ms histogram");

        Self {
            registry,
            accepted,
            rejected,
            relayed,
            relay_failures,
            notify_failures,
            submit_time_ms,
        }
    }

    pub fn record_rejection(&self, kind: &str, reason: &str) {
        self.rejected.with_label_values(&[kind, reason]).inc();
    }

    /// Text exposition of every registered metric.
    pub fn encode(&self) -> Result<String, NodeError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| NodeError::Metrics(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| NodeError::Metrics(e.to_string()))
    }
}

impl Default for IntentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_show_up_in_the_exposition() {
        let metrics = IntentMetrics::new();
        metrics.record_rejection("vote", "already_voted");
        metrics.accepted.with_label_values(&["delegate"]).inc();
        let text = metrics.encode().unwrap();
        assert!(text.contains("sigrelay_intents_rejected_total{kind=\"vote\",reason=\"already_voted\"} 1"));
        assert!(text.contains("sigrelay_intents_accepted_total{kind=\"delegate\"} 1"));
    }

    #[test]
    fn registries_are_independent() {
        let a = IntentMetrics::new();
        let b = IntentMetrics::new();
        a.relay_failures.inc();
        assert_eq!(b.relay_failures.get(), 0);
    }
}
