//! Prometheus metrics for the replay service.
//!
//! Recording goes through the `metrics` facade; [`install`] wires the
//! Prometheus exporter and returns the handle rendered at `/metrics`.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

static HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Install the global Prometheus recorder.
///
/// Safe to call more than once (tests build several routers per process);
/// later calls return the handle created by the first.
pub fn install() -> Option<PrometheusHandle> {
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!("Prometheus recorder not installed: {}", e);
                None
            }
        })
        .clone()
}

/// Count a handled request by endpoint and status code
pub fn record_request(endpoint: &'static str, status: u16) {
    counter!(
        "livereplay_requests_total",
        "endpoint" => endpoint,
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_duration(endpoint: &'static str, start: Instant) {
    histogram!("livereplay_request_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_error(status: u16) {
    counter!("livereplay_errors_total", "status" => status.to_string()).increment(1);
}

pub fn record_playlist_fetch_error() {
    counter!("livereplay_playlist_fetch_errors_total").increment(1);
}

/// ABR probe found nothing and the plain playlist was used
pub fn record_abr_fallback() {
    counter!("livereplay_abr_fallbacks_total").increment(1);
}

pub fn set_active_clips(count: usize) {
    gauge!("livereplay_active_clips").set(count as f64);
}
