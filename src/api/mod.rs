//! HTTP surface of the service.
//!
//! Routes single and batch lookups to the resolution layer and exposes the
//! operational endpoints. Handlers never touch the store directly: blocking
//! lookups run on the blocking pool through [`crate::source::ConceptSource`].

/// Lookup handlers.
pub mod handlers;

/// Health, good-to-go, ping and build-info endpoints.
pub mod health;

/// Request counters and latency histograms.
pub mod metrics;

/// JSON response helpers.
pub mod response;

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tracing::{debug, info};

use crate::errors::{Result, ThingsError};
use crate::source::ConceptSource;

pub use handlers::{get_thing, get_things, transaction_id, REQUEST_ID_HEADER};
pub use health::{BuildInfo, HealthCheckResult, HealthReport, HEALTH_CHECK_TIMEOUT};
pub use metrics::HttpMetrics;
pub use response::JSON_CONTENT_TYPE;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn ConceptSource>,
    pub cache_control: HeaderValue,
    pub metrics: Arc<HttpMetrics>,
}

impl AppState {
    pub fn new(source: Arc<dyn ConceptSource>, cache_control: &str) -> Result<Self> {
        let cache_control = HeaderValue::from_str(cache_control).map_err(|e| ThingsError::Config {
            message: format!("invalid cache control header '{}': {}", cache_control, e),
        })?;
        Ok(Self {
            source,
            cache_control,
            metrics: Arc::new(HttpMetrics::new()?),
        })
    }
}

/// Builds the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/things", get(get_things))
        .route("/things/{uuid}", get(get_thing))
        .route("/__health", get(health::health))
        .route("/__gtg", get(health::good_to_go))
        .route("/__ping", get(health::ping))
        .route("/ping", get(health::ping))
        .route("/__build-info", get(health::build_info))
        .route("/build-info", get(health::build_info))
        .route("/__metrics", get(metrics::metrics))
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .with_state(state)
}

/// Logs and counts each request, and pins its transaction id so handlers
/// and the response agree on it.
async fn log_requests(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| metrics::UNMATCHED_ROUTE.to_string());
    let transaction_id = transaction_id(request.headers());
    let header_value = HeaderValue::from_str(&transaction_id).ok();
    if let Some(value) = &header_value {
        request.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }
    let started = Instant::now();

    let mut response = next.run(request).await;
    if let Some(value) = header_value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let elapsed = started.elapsed();
    let elapsed_ms = elapsed.as_millis() as u64;
    let status = response.status().as_u16();
    state.metrics.observe(method.as_str(), &route, status, elapsed);
    if path.starts_with("/__") {
        debug!(method = %method, path = %path, status, elapsed_ms, "request served");
    } else {
        info!(
            method = %method,
            path = %path,
            status,
            elapsed_ms,
            transaction_id = %transaction_id,
            "request served"
        );
    }
    response
}
