//! Client-side metrics
//!
//! Recorded through the `metrics` facade; the library installs no exporter.
//! Applications pick one (e.g. `metrics-exporter-prometheus`).
//!
//! - `connectivity_requests_total` (counter): labels `endpoint`, `status`
//! - `connectivity_request_duration_seconds` (histogram): label `endpoint`
//! - `connectivity_transport_errors_total` (counter): label `kind`
//! - `connectivity_token_fetches_total` (counter): label `outcome`

/// Record a completed exchange, whatever its status.
pub fn record_request(endpoint: &'static str, status: u16, duration_secs: f64) {
    metrics::counter!("connectivity_requests_total", "endpoint" => endpoint, "status" => status.to_string())
        .increment(1);
    metrics::histogram!("connectivity_request_duration_seconds", "endpoint" => endpoint)
        .record(duration_secs);
}

/// Record a request that never produced a response.
pub fn record_transport_error(kind: &'static str) {
    metrics::counter!("connectivity_transport_errors_total", "kind" => kind).increment(1);
}

/// Record a token fetch attempt; `outcome` is `success` or `failure`.
pub fn record_token_fetch(outcome: &'static str) {
    metrics::counter!("connectivity_token_fetches_total", "outcome" => outcome).increment(1);
}
