//! Prometheus metrics for application observability.
//!
//! Metrics are exposed through a dedicated HTTP listener (`METRICS_PORT`,
//! default 9090). Recording functions are safe to call when no exporter is
//! installed; the `metrics` facade then drops the samples.
//!
//! # Available Metrics
//!
//! ## Counters
//! - `quotes_requests_total` - Quote endpoint calls (labels: endpoint, outcome)
//! - `quotes_rate_limited_total` - Requests rejected by the rate limiter (label: scope)
//!
//! ## Histograms
//! - `quotes_dataset_load_duration_seconds` - Time to read and parse the dataset file
//!
//! ## Gauges
//! - `quotes_dataset_size` - Number of quotes in the last loaded dataset

use std::net::SocketAddr;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{error, info};

use crate::error::AppResult;

/// Metric names as constants for consistency.
pub mod names {
    pub const REQUESTS_TOTAL: &str = "quotes_requests_total";
    pub const RATE_LIMITED_TOTAL: &str = "quotes_rate_limited_total";
    pub const DATASET_LOAD_DURATION_SECONDS: &str = "quotes_dataset_load_duration_seconds";
    pub const DATASET_SIZE: &str = "quotes_dataset_size";
}

/// Initialize the Prometheus metrics exporter on `metrics_addr`.
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        names::REQUESTS_TOTAL,
        "Total number of quote endpoint requests by outcome"
    );
    describe_counter!(
        names::RATE_LIMITED_TOTAL,
        "Total number of requests rejected by the rate limiter"
    );
    describe_histogram!(
        names::DATASET_LOAD_DURATION_SECONDS,
        "Time spent reading and parsing the quotes dataset in seconds"
    );
    describe_gauge!(
        names::DATASET_SIZE,
        "Number of quotes in the most recently loaded dataset"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

/// Outcome label for a handler result: `ok` or the lowercase error kind.
pub fn outcome_label<T>(result: &AppResult<T>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => match e.kind() {
            crate::error::ErrorKind::NotFound => "not_found",
            crate::error::ErrorKind::Validation => "validation",
            crate::error::ErrorKind::Internal => "internal",
        },
    }
}

/// Record a quote endpoint call.
pub fn record_request(endpoint: &'static str, outcome: &'static str) {
    counter!(names::REQUESTS_TOTAL, "endpoint" => endpoint, "outcome" => outcome).increment(1);
}

/// Record a rate-limited request.
pub fn record_rate_limited(scope: &'static str) {
    counter!(names::RATE_LIMITED_TOTAL, "scope" => scope).increment(1);
}

/// Record a dataset load and its resulting size.
pub fn record_dataset_load(duration_secs: f64, size: usize) {
    histogram!(names::DATASET_LOAD_DURATION_SECONDS).record(duration_secs);
    gauge!(names::DATASET_SIZE).set(size as f64);
}
