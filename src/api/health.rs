//! Health, good-to-go, ping and build-info endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::warn;

use crate::api::response;
use crate::api::AppState;
use crate::source::ConceptSource;

/// Upper bound on a single connectivity check.
pub const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

const SYSTEM_CODE: &str = "public-things-api";
const APP_NAME: &str = "Public Things API";
const APP_DESCRIPTION: &str = "Public API for serving information on Things within the FT";

/// One entry of the health report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResult {
    pub id: String,
    pub name: String,
    pub ok: bool,
    pub severity: u8,
    pub business_impact: String,
    pub technical_summary: String,
    pub panic_guide: String,
    pub check_output: String,
}

/// Body of `/__health`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub schema_version: u8,
    pub system_code: String,
    pub name: String,
    pub description: String,
    pub checks: Vec<HealthCheckResult>,
    pub ok: bool,
}

/// Runs the source's connectivity check on the blocking pool, bounded by
/// [`HEALTH_CHECK_TIMEOUT`].
pub async fn check_source(source: Arc<dyn ConceptSource>) -> Result<(), String> {
    let check = tokio::task::spawn_blocking(move || source.check_connectivity());
    match tokio::time::timeout(HEALTH_CHECK_TIMEOUT, check).await {
        Ok(Ok(Ok(()))) => Ok(()),
        Ok(Ok(Err(e))) => Err(e.to_string()),
        Ok(Err(e)) => Err(format!("connectivity check failed: {}", e)),
        Err(_) => Err(format!(
            "connectivity check timed out after {}s",
            HEALTH_CHECK_TIMEOUT.as_secs()
        )),
    }
}

/// `GET /__health`
pub async fn health(State(state): State<AppState>) -> Response {
    let store = state.source.description();
    let outcome = check_source(Arc::clone(&state.source)).await;
    if let Err(e) = &outcome {
        warn!(store, error = %e, "connectivity check failed");
    }

    let check = HealthCheckResult {
        id: format!("{}-connectivity", store.replace(' ', "-")),
        name: format!("Check connectivity to {}", store),
        ok: outcome.is_ok(),
        severity: 1,
        business_impact: "Unable to respond to Public Things api requests".to_string(),
        technical_summary: format!("Cannot connect to {}", store),
        panic_guide: format!("https://runbooks.in.ft.com/{}", SYSTEM_CODE),
        check_output: match &outcome {
            Ok(()) => format!("Connectivity to {} is ok", store),
            Err(e) => e.clone(),
        },
    };
    let report = HealthReport {
        schema_version: 1,
        system_code: SYSTEM_CODE.to_string(),
        name: APP_NAME.to_string(),
        description: APP_DESCRIPTION.to_string(),
        ok: check.ok,
        checks: vec![check],
    };
    response::json(StatusCode::OK, &report)
}

/// `GET /__gtg`
pub async fn good_to_go(State(state): State<AppState>) -> Response {
    match check_source(Arc::clone(&state.source)).await {
        Ok(()) => plain(StatusCode::OK, "OK".to_string()),
        Err(e) => plain(StatusCode::SERVICE_UNAVAILABLE, e),
    }
}

/// Body of `/__build-info`.
#[derive(Debug, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            description: env!("CARGO_PKG_DESCRIPTION"),
        }
    }
}

/// `GET /__build-info` and `GET /build-info`
pub async fn build_info() -> Response {
    response::json(StatusCode::OK, &BuildInfo::current())
}

/// `GET /__ping` and `GET /ping`
pub async fn ping() -> Response {
    plain(StatusCode::OK, "pong".to_string())
}

fn plain(status: StatusCode, body: String) -> Response {
    (
        status,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=US-ASCII")),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
        ],
        body,
    )
        .into_response()
}
