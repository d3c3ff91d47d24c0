//! Prometheus request metrics for the HTTP surface.

use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry, Encoder,
    HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use tracing::error;

use crate::api::AppState;
use crate::errors::{Result, ThingsError};

/// Route label used when no route matched the request.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Request counter and latency histogram, labelled by method, route
/// template and status code.
pub struct HttpMetrics {
    registry: Registry,
    requests: IntCounterVec,
    latency: HistogramVec,
}

impl HttpMetrics {
    /// Registers the metrics on a registry owned by this instance.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let requests = register_int_counter_vec_with_registry!(
            Opts::new("http_requests_total", "HTTP requests served"),
            &["method", "route", "status"],
            registry
        )?;
        let latency = register_histogram_vec_with_registry!(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request latency in seconds"
            ),
            &["method", "route"],
            registry
        )?;
        Ok(Self {
            registry,
            requests,
            latency,
        })
    }

    pub fn observe(&self, method: &str, route: &str, status: u16, elapsed: Duration) {
        let status = status.to_string();
        self.requests
            .with_label_values(&[method, route, status.as_str()])
            .inc();
        self.latency
            .with_label_values(&[method, route])
            .observe(elapsed.as_secs_f64());
    }

    /// Number of requests counted for the given labels.
    pub fn requests(&self, method: &str, route: &str, status: u16) -> u64 {
        let status = status.to_string();
        self.requests
            .with_label_values(&[method, route, status.as_str()])
            .get()
    }

    /// Renders every registered family in the Prometheus text format.
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| ThingsError::Metrics(prometheus::Error::Msg(e.to_string())))
    }
}

/// `GET /__metrics`
pub async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
