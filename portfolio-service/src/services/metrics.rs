//! Prometheus metrics for portfolio-service.
//!
//! HTTP request metrics come from the `metrics` facade (recorded by
//! `service_core::middleware::metrics_middleware`) and are rendered through the
//! installed recorder. Domain counters live in the default `prometheus`
//! registry and are appended to the same exposition.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Contact form submissions by storage outcome.
pub static CONTACT_SUBMISSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "portfolio_contact_submissions_total",
        "Contact form submissions by storage outcome",
        &["status"]
    )
    .expect("Failed to register contact_submissions_total")
});

/// Owner notification emails by outcome.
pub static CONTACT_EMAILS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "portfolio_contact_emails_total",
        "Contact notification emails by outcome",
        &["status"]
    )
    .expect("Failed to register contact_emails_total")
});

/// Proxy requests by outcome (ok, unconfigured, bad_request, upstream_error, ...).
pub static PROXY_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "portfolio_gemini_proxy_requests_total",
        "Gemini proxy requests by outcome",
        &["outcome"]
    )
    .expect("Failed to register gemini_proxy_requests_total")
});

/// Upstream generation latency.
pub static UPSTREAM_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "portfolio_gemini_upstream_duration_seconds",
        "Gemini API call duration in seconds",
        &["status"],
        vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0]
    )
    .expect("Failed to register gemini_upstream_duration")
});

/// Install the `metrics` recorder and force domain metric registration.
///
/// Call once per process. A second call keeps the first recorder.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_none() {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                let _ = METRICS_HANDLE.set(handle);
            }
            Err(e) => tracing::warn!("Failed to install Prometheus recorder: {}", e),
        }
    }

    Lazy::force(&CONTACT_SUBMISSIONS_TOTAL);
    Lazy::force(&CONTACT_EMAILS_TOTAL);
    Lazy::force(&PROXY_REQUESTS_TOTAL);
    Lazy::force(&UPSTREAM_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_default();

    let encoder = TextEncoder::new();
    if let Ok(custom) = encoder.encode_to_string(&prometheus::gather()) {
        output.push_str(&custom);
    }

    output
}

pub fn record_contact_submission(status: &str) {
    CONTACT_SUBMISSIONS_TOTAL.with_label_values(&[status]).inc();
}

pub fn record_contact_email(status: &str) {
    CONTACT_EMAILS_TOTAL.with_label_values(&[status]).inc();
}

pub fn record_proxy_outcome(outcome: &str) {
    PROXY_REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
}
