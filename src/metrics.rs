// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the config listener operator.
//!
//! All metrics carry the namespace prefix `infinispan_org_config_listener_`.
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - reconciliations by outcome and their duration
//! - **Bundle Metrics** - objects created, updated and deleted by kind
//! - **Scale Metrics** - scale operations by target replica count
//! - **Error Metrics** - failures by category
//!
//! # Example
//!
//! ```rust,no_run
//! use config_listener::metrics::record_reconciliation;
//!
//! record_reconciliation("unchanged", std::time::Duration::from_millis(12));
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

/// Namespace prefix for all metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "infinispan_org_config_listener";

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

fn register_counter(name: &str, help: &str, labels: &[&str]) -> CounterVec {
    let counter = CounterVec::new(Opts::new(format!("{METRICS_NAMESPACE}_{name}"), help), labels)
        .unwrap_or_else(|e| panic!("invalid metric definition {name}: {e}"));
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap_or_else(|e| panic!("failed to register metric {name}: {e}"));
    counter
}

/// Total number of reconciliations by outcome
///
/// Labels:
/// - `outcome`: `created`, `updated`, `scaled_up`, `unchanged`, `removed`, `scaled_down`, `error`
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "reconciliations_total",
        "Total number of config listener reconciliations by outcome",
        &["outcome"],
    )
});

/// Duration of reconciliations in seconds
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of config listener reconciliations in seconds",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = HistogramVec::new(opts, &["outcome"])
        .unwrap_or_else(|e| panic!("invalid reconciliation histogram: {e}"));
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap_or_else(|e| panic!("failed to register reconciliation histogram: {e}"));
    histogram
});

/// Bundle objects written, by kind and operation
///
/// Labels:
/// - `kind`: `ServiceAccount`, `Role`, `RoleBinding`, `Deployment`
/// - `operation`: `created`, `updated`, `deleted`
pub static BUNDLE_OBJECTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "bundle_objects_total",
        "Config listener bundle objects written by kind and operation",
        &["kind", "operation"],
    )
});

/// Scale operations by target replica count
pub static SCALE_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "scale_operations_total",
        "Config listener scale operations by target replica count",
        &["replicas"],
    )
});

/// Errors by category
///
/// Labels:
/// - `category`: see [`ListenerError::category`](crate::errors::ListenerError::category)
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "errors_total",
        "Config listener errors by category",
        &["category"],
    )
});

/// Record a finished reconciliation
///
/// # Arguments
/// * `outcome` - Branch taken, or `error`
/// * `duration` - How long the reconciliation took
pub fn record_reconciliation(outcome: &str, duration: Duration) {
    RECONCILIATION_TOTAL.with_label_values(&[outcome]).inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[outcome])
        .observe(duration.as_secs_f64());
}

/// Record a bundle object write
pub fn record_bundle_object(kind: &str, operation: &str) {
    BUNDLE_OBJECTS_TOTAL
        .with_label_values(&[kind, operation])
        .inc();
}

/// Record a scale operation
pub fn record_scale(replicas: i32) {
    SCALE_TOTAL
        .with_label_values(&[replicas.to_string().as_str()])
        .inc();
}

/// Record an error
pub fn record_error(category: &str) {
    ERRORS_TOTAL.with_label_values(&[category]).inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
