//! Metrics collection.
//!
//! # Metrics
//! - `fetch_requests_total` (counter): completed fetches by method and outcome
//! - `fetch_duration_seconds` (histogram): end-to-end fetch latency by method
//! - `transport_rebuilds_total` (counter): connection pools built

use std::time::Instant;

use crate::error::Error;
use crate::request::Method;

/// Record the outcome of one fetch.
pub fn record_fetch(method: Method, outcome: Result<u16, &Error>, start: Instant) {
    let outcome = match outcome {
        Ok(status) => status.to_string(),
        Err(Error::Timeout(_)) | Err(Error::DeadlineExceeded) => "timeout".to_string(),
        Err(Error::Canceled) => "canceled".to_string(),
        Err(_) => "error".to_string(),
    };

    metrics::counter!(
        "fetch_requests_total",
        "method" => method.as_str(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("fetch_duration_seconds", "method" => method.as_str())
        .record(start.elapsed().as_secs_f64());
}

/// Record that a connection pool was (re)built.
pub fn record_transport_rebuild() {
    metrics::counter!("transport_rebuilds_total").increment(1);
}
