//! Prometheus metrics collection for eurekad.
//!
//! Metrics are exposed on the HTTP server at `/metrics`.
//!
//! - `eureka_action_total{action}` - Actions executed by name
//! - `eureka_action_duration_seconds{action}` - Action latency histogram
//! - `eureka_action_errors_total{action, error}` - Failed actions by error code
//! - `eureka_stream_hashtags_stored_total` - Stream hashtag rows inserted
//! - `eureka_daily_summaries_generated_total` - Daily usage summaries written
//! - `eureka_cache_invalidations_total{key}` - Cache keys deleted by key family

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Stream hashtag associations inserted.
pub static HASHTAGS_STORED: OnceLock<IntCounter> = OnceLock::new();

/// Daily usage summaries generated.
pub static SUMMARIES_GENERATED: OnceLock<IntCounter> = OnceLock::new();

/// Cache invalidations by key family (`PersonPagePropertiesById`, ...).
pub static CACHE_INVALIDATIONS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Action metrics
// ========================================================================

/// Actions executed by name.
pub static ACTION_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Action latency by name.
pub static ACTION_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Action errors by name and error code.
pub static ACTION_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at startup before any metrics are recorded.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
            }
            let _ = $metric.set(m);
        };
    }

    register!(HASHTAGS_STORED, IntCounter::new("eureka_stream_hashtags_stored_total", "Stream hashtag rows inserted"));
    register!(SUMMARIES_GENERATED, IntCounter::new("eureka_daily_summaries_generated_total", "Daily usage summaries generated"));
    register!(CACHE_INVALIDATIONS, IntCounterVec::new(Opts::new("eureka_cache_invalidations_total", "Cache keys deleted"), &["key"]));

    register!(ACTION_COUNTER, IntCounterVec::new(Opts::new("eureka_action_total", "Actions executed by name"), &["action"]));
    register!(ACTION_LATENCY, HistogramVec::new(
        HistogramOpts::new("eureka_action_duration_seconds", "Action latency by name")
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["action"]));
    register!(ACTION_ERRORS, IntCounterVec::new(Opts::new("eureka_action_errors_total", "Action errors by name and code"), &["action", "error"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions for metric updates
// ============================================================================

/// Record an action execution with latency.
#[inline]
pub fn record_action(action: &str, duration_secs: f64) {
    if let Some(c) = ACTION_COUNTER.get() {
        c.with_label_values(&[action]).inc();
    }
    if let Some(h) = ACTION_LATENCY.get() {
        h.with_label_values(&[action]).observe(duration_secs);
    }
}

/// Record an action error.
#[inline]
pub fn record_action_error(action: &str, error: &str) {
    if let Some(c) = ACTION_ERRORS.get() {
        c.with_label_values(&[action, error]).inc();
    }
}

#[inline]
pub fn record_hashtags_stored(count: usize) {
    if let Some(c) = HASHTAGS_STORED.get() {
        c.inc_by(count as u64);
    }
}

#[inline]
pub fn record_summary_generated() {
    if let Some(c) = SUMMARIES_GENERATED.get() {
        c.inc();
    }
}

/// Record a cache invalidation, labeled by the key's prefix before `:`.
#[inline]
pub fn record_cache_invalidation(key: &str) {
    let family = key.split(':').next().unwrap_or(key);
    if let Some(c) = CACHE_INVALIDATIONS.get() {
        c.with_label_values(&[family]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_lifecycle() {
        init();

        record_action("get_system_administrator_ids", 0.001);
        record_action_error("undelete_gadget", "execution");
        record_cache_invalidation("PersonPagePropertiesById:7");

        let output = gather_metrics();
        assert!(output.contains("eureka_action_total"));
        assert!(output.contains("eureka_action_errors_total"));
        assert!(output.contains("key=\"PersonPagePropertiesById\""));
    }
}
