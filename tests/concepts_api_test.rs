use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use things_api::concepts_api::{map_predicate, translate, ConceptsApiClient, ConceptsApiResponse};
use things_api::source::ConceptSource;
use things_api::types::RelationshipSet;

const BRUSSELS: &str = "6773e864-78ab-4051-abc2-f4e9ab423ebb";
const BROKEN: &str = "00000000-0000-4000-8000-000000000500";

fn brussels_blog() -> Value {
    json!({
        "id": "http://www.ft.com/thing/6773e864-78ab-4051-abc2-f4e9ab423ebb",
        "apiUrl": "http://api.ft.com/concepts/6773e864-78ab-4051-abc2-f4e9ab423ebb",
        "type": "http://www.ft.com/ontology/product/Brand",
        "prefLabel": "Brussels blog",
        "descriptionXML": "This blog covers everything",
        "imageURL": "http://im.ft-static.com/content/images/2f1be452.png",
        "account": [
            {"type": "http://www.ft.com/ontology/twitterHandle", "value": "@ftbrussels"},
            {"type": "http://www.ft.com/ontology/myspace", "value": "ignored"}
        ],
        "alternativeLabels": [
            {"type": "http://www.w3.org/2008/05/skos-xl#altLabel", "value": "Brussels Blog"},
            {"type": "http://www.ft.com/ontology/shortLabel", "value": "Brussels"},
            {"type": "http://www.ft.com/ontology/Alias", "value": "not an alias"}
        ],
        "strapline": "Archived",
        "broaderConcepts": [
            {
                "concept": {
                    "id": "http://www.ft.com/thing/dbb0bdae-1f0c-11e4-b0cb-b2227cce2b54",
                    "apiUrl": "http://api.ft.com/concepts/dbb0bdae-1f0c-11e4-b0cb-b2227cce2b54",
                    "type": "http://www.ft.com/ontology/product/Brand",
                    "prefLabel": "Financial Times"
                },
                "predicate": "http://www.ft.com/ontology/subBrandOf"
            }
        ]
    })
}

fn brussels_doc() -> ConceptsApiResponse {
    serde_json::from_value(brussels_blog()).unwrap()
}

#[test]
fn test_translate_brand() {
    let concept = translate(&brussels_doc(), "prod").unwrap();

    assert_eq!(concept.id, format!("http://api.ft.com/things/{}", BRUSSELS));
    assert_eq!(concept.api_url, format!("http://api.ft.com/brands/{}", BRUSSELS));
    assert_eq!(
        concept.types,
        vec![
            "http://www.ft.com/ontology/core/Thing",
            "http://www.ft.com/ontology/concept/Concept",
            "http://www.ft.com/ontology/classification/Classification",
            "http://www.ft.com/ontology/product/Brand",
        ]
    );
    assert_eq!(concept.direct_type, "http://www.ft.com/ontology/product/Brand");
    assert_eq!(concept.aliases, vec!["Brussels Blog"]);
    assert_eq!(concept.short_label, "Brussels");
    assert_eq!(concept.twitter_handle, "@ftbrussels");
    assert_eq!(concept.image_url, "http://im.ft-static.com/content/images/2f1be452.png");
    assert!(concept.narrower_concepts.is_none());
    assert!(concept.related_concepts.is_none());
}

#[test]
fn test_translate_relationships() {
    let concept = translate(&brussels_doc(), "test").unwrap();
    let broader = concept.broader_concepts.unwrap();

    assert_eq!(broader.len(), 1);
    assert_eq!(broader[0].id, "http://api.ft.com/things/dbb0bdae-1f0c-11e4-b0cb-b2227cce2b54");
    assert_eq!(
        broader[0].api_url,
        "http://test.api.ft.com/brands/dbb0bdae-1f0c-11e4-b0cb-b2227cce2b54"
    );
    assert_eq!(broader[0].predicate, "http://www.w3.org/2004/02/skos/core#broader");
    assert_eq!(broader[0].types.last(), Some(&broader[0].direct_type));
}

#[test]
fn test_translate_without_type_is_not_found() {
    let mut doc = brussels_doc();
    doc.basic.concept_type.clear();
    assert!(translate(&doc, "prod").is_none());
}

#[test]
fn test_predicate_mapping() {
    assert_eq!(
        map_predicate("http://www.ft.com/ontology/hasSubBrand"),
        "http://www.w3.org/2004/02/skos/core#narrower"
    );
    assert_eq!(
        map_predicate("http://www.w3.org/2004/02/skos/core#related"),
        "http://www.w3.org/2004/02/skos/core#related"
    );
}

#[derive(Clone, Default)]
struct Seen {
    requests: Arc<Mutex<Vec<(String, Option<String>, Option<String>)>>>,
}

async fn concept_route(
    State(seen): State<Seen>,
    Path(uuid): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> axum::response::Response {
    let request_id = headers
        .get("X-Request-Id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    seen.requests
        .lock()
        .unwrap()
        .push((uuid.clone(), query, request_id));
    match uuid.as_str() {
        BRUSSELS => Json(brussels_blog()).into_response(),
        BROKEN => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Serves a fake concept service on a random local port.
async fn spawn_upstream() -> (String, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/concepts/{uuid}", get(concept_route))
        .route("/__gtg", get(|| async { "OK" }))
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), seen)
}

#[tokio::test]
async fn test_client_reads_and_translates() {
    let (base_url, seen) = spawn_upstream().await;
    let client = ConceptsApiClient::new(&base_url, "prod", Duration::from_secs(5));

    let concept = tokio::task::spawn_blocking(move || {
        let rels = RelationshipSet::from_names(["broader", "related"]);
        client.read(BRUSSELS, &rels, "tid_upstream")
    })
    .await
    .unwrap()
    .unwrap()
    .unwrap();

    assert_eq!(concept.pref_label, "Brussels blog");
    let requests = seen.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    let (uuid, query, request_id) = &requests[0];
    assert_eq!(uuid, BRUSSELS);
    assert_eq!(
        query.as_deref(),
        Some("showRelationship=broader&showRelationship=related")
    );
    assert_eq!(request_id.as_deref(), Some("tid_upstream"));
}

#[tokio::test]
async fn test_client_not_found_and_error_status() {
    let (base_url, _seen) = spawn_upstream().await;
    let client = ConceptsApiClient::new(&base_url, "prod", Duration::from_secs(5));

    let (missing, broken, healthy) = tokio::task::spawn_blocking(move || {
        let rels = RelationshipSet::default();
        (
            client.read("11111111-2222-4333-8444-555555555555", &rels, "tid_1"),
            client.read(BROKEN, &rels, "tid_2"),
            client.check_connectivity(),
        )
    })
    .await
    .unwrap();

    assert!(missing.unwrap().is_none());
    let err = broken.unwrap_err();
    assert!(err.to_string().contains("500"));
    assert!(!err.found());
    assert!(healthy.is_ok());
}

#[tokio::test]
async fn test_client_unreachable_is_an_error() {
    let client = ConceptsApiClient::new("http://127.0.0.1:9", "prod", Duration::from_secs(2));
    let result = tokio::task::spawn_blocking(move || client.check_connectivity())
        .await
        .unwrap();
    assert!(result.is_err());
}
