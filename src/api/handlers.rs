//! Route handlers for single and batch thing lookups.

use std::borrow::Cow;
use std::sync::Arc;

use axum::extract::{OriginalUri, Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::Response;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::api::response;
use crate::api::AppState;
use crate::batch::resolve_batch;
use crate::errors::{Result, ThingsError};
use crate::resolution::{CanonicalResolver, Resolution};
use crate::types::{RelationshipSet, ThingsResponse};

/// Header carrying the caller's transaction id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const UUID_PARAM: &str = "uuid";
const RELATIONSHIP_PARAM: &str = "showRelationship";

/// Returns the request's transaction id, generating one when absent.
pub fn transaction_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("tid_{}", Uuid::new_v4().simple()))
}

/// All values of a repeated query parameter, in order.
fn query_values<'q>(query: Option<&'q str>, name: &str) -> Vec<Cow<'q, str>> {
    let Some(query) = query else {
        return Vec::new();
    };
    form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| key == name)
        .map(|(_, value)| value)
        .collect()
}

fn relationships_from(query: Option<&str>) -> RelationshipSet {
    RelationshipSet::from_names(query_values(query, RELATIONSHIP_PARAM))
}

/// Rejects a path identifier that is not a UUID.
fn validate_uuid(uuid: &str) -> Result<()> {
    Uuid::parse_str(uuid)
        .map(|_| ())
        .map_err(|_| ThingsError::Validation {
            message: "invalid/malformed uuid".to_string(),
        })
}

/// Collects the batch identifiers, rejecting the request before any lookup
/// starts if none is given or any is malformed.
fn batch_uuids(query: Option<&str>) -> Result<Vec<String>> {
    let uuids: Vec<String> = query_values(query, UUID_PARAM)
        .into_iter()
        .map(Cow::into_owned)
        .collect();
    if uuids.is_empty() {
        return Err(ThingsError::Validation {
            message: "at least one uuid query param should be provided for batch operations"
                .to_string(),
        });
    }
    for uuid in &uuids {
        if let Err(e) = Uuid::parse_str(uuid) {
            return Err(ThingsError::Validation {
                message: format!("Invalid uuid: {}, err: {}", uuid, e),
            });
        }
    }
    Ok(uuids)
}

/// The requested URL with its last path segment replaced by `canonical`.
///
/// Works on the raw path so a percent-encoded request segment is replaced
/// too, keeping the query string as sent.
fn redirect_location(uri: &Uri, canonical: &str) -> String {
    let prefix = uri
        .path()
        .rsplit_once('/')
        .map(|(prefix, _)| prefix)
        .unwrap_or_default();
    match uri.query() {
        Some(query) => format!("{}/{}?{}", prefix, canonical, query),
        None => format!("{}/{}", prefix, canonical),
    }
}

/// `GET /things/{uuid}`
pub async fn get_thing(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Response {
    let transaction_id = transaction_id(&headers);
    if let Err(e) = validate_uuid(&uuid) {
        return response::error(&e, e.to_string());
    }
    let relationships = relationships_from(uri.query());

    let source = Arc::clone(&state.source);
    let lookup_uuid = uuid.clone();
    let lookup_tid = transaction_id.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        CanonicalResolver::new(source.as_ref()).resolve(&lookup_uuid, &relationships, &lookup_tid)
    })
    .await;

    let resolution = match outcome {
        Ok(Ok(resolution)) => resolution,
        Ok(Err(e)) => {
            error!(
                uuid = %uuid,
                transaction_id = %transaction_id,
                error = %e,
                found = e.found(),
                "thing lookup failed"
            );
            let text = format!("Error getting thing with uuid {}, err={}", uuid, e);
            return response::error(&e, text);
        }
        Err(e) => {
            error!(
                uuid = %uuid,
                transaction_id = %transaction_id,
                error = %e,
                "thing lookup task failed"
            );
            return response::message(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Error getting thing with uuid {}, err={}", uuid, e),
            );
        }
    };

    match resolution {
        Resolution::Found(concept) => response::cached_json(&concept, &state.cache_control),
        Resolution::Redirect { canonical_uuid } => {
            let location = redirect_location(&uri, &canonical_uuid);
            debug!(
                uuid = %uuid,
                canonical_uuid = %canonical_uuid,
                transaction_id = %transaction_id,
                "redirecting to canonical thing"
            );
            response::moved_permanently(&location)
        }
        Resolution::NotFound => {
            info!(uuid = %uuid, transaction_id = %transaction_id, "thing not found");
            response::message(
                StatusCode::NOT_FOUND,
                format!("No thing found with uuid {}.", uuid),
            )
        }
    }
}

/// `GET /things?uuid=...&uuid=...`
pub async fn get_things(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let transaction_id = transaction_id(&headers);
    let uuids = match batch_uuids(query.as_deref()) {
        Ok(uuids) => uuids,
        Err(e) => return response::error(&e, e.to_string()),
    };
    let relationships = relationships_from(query.as_deref());

    let source = Arc::clone(&state.source);
    match resolve_batch(source, uuids, relationships, transaction_id.clone()).await {
        Ok(things) => response::cached_json(&ThingsResponse { things }, &state.cache_control),
        Err(e) => {
            error!(
                uuid = %e.uuid,
                transaction_id = %transaction_id,
                error = %e.source,
                "batch lookup failed"
            );
            response::error(&e.source, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_repeated_params_keep_order() {
        let values = query_values(Some("uuid=a&x=1&uuid=b%20c"), "uuid");
        assert_eq!(values, vec!["a", "b c"]);
    }

    #[test]
    fn test_missing_query_has_no_values() {
        assert!(query_values(None, "uuid").is_empty());
    }

    #[test]
    fn test_batch_uuids_rejects_before_lookup() {
        let err = batch_uuids(Some("showRelationship=broader")).unwrap_err();
        assert!(matches!(err, ThingsError::Validation { .. }));

        let query = "uuid=6773e864-78ab-4051-abc2-f4e9ab423ebb&uuid=x";
        let err = batch_uuids(Some(query)).unwrap_err();
        assert!(err.to_string().starts_with("Invalid uuid: x, err: "));
    }

    #[test]
    fn test_redirect_location_swaps_encoded_segment() {
        let uri: Uri = "/things/%36773e864-78ab-4051-abc2-f4e9ab423ebb?showRelationship=broader"
            .parse()
            .unwrap();
        assert_eq!(
            redirect_location(&uri, "3b4a1c3f-4d6a-3a4b-9f7e-64bf6d5a1c27"),
            "/things/3b4a1c3f-4d6a-3a4b-9f7e-64bf6d5a1c27?showRelationship=broader"
        );
    }

    #[test]
    fn test_redirect_location_without_query() {
        let uri: Uri = "/things/6773e864-78ab-4051-abc2-f4e9ab423ebb".parse().unwrap();
        assert_eq!(redirect_location(&uri, "abc"), "/things/abc");
    }

    #[test]
    fn test_transaction_id_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("tid_given"));
        assert_eq!(transaction_id(&headers), "tid_given");
    }

    #[test]
    fn test_transaction_id_is_generated_when_absent() {
        let tid = transaction_id(&HeaderMap::new());
        assert!(tid.starts_with("tid_"));
        assert!(tid.len() > 4);
    }
}
