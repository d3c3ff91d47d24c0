use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use things_api::db::{GraphConnection, HttpGraphConnection, Row};
use things_api::errors::Result;
use things_api::graph::{CypherDriver, CypherStatement};
use things_api::source::ConceptSource;
use things_api::types::RelationshipSet;

const UUID: &str = "6773e864-78ab-4051-abc2-f4e9ab423ebb";

/// Connection that replays canned rows and records what it was asked.
struct CannedConnection {
    rows: Vec<Value>,
    statements: Mutex<Vec<CypherStatement>>,
}

impl CannedConnection {
    fn new(rows: Vec<Value>) -> Self {
        Self {
            rows,
            statements: Mutex::new(Vec::new()),
        }
    }
}

impl GraphConnection for CannedConnection {
    fn run(&self, statement: &CypherStatement) -> Result<Vec<Row>> {
        self.statements.lock().unwrap().push(statement.clone());
        Ok(self
            .rows
            .iter()
            .filter_map(|r| r.as_object().cloned())
            .collect())
    }
}

fn person_row() -> Value {
    json!({
        "leaf": {"uuid": UUID, "prefLabel": "Jane Doe", "types": ["Thing", "Concept", "Person"]},
        "canonical": {"uuid": null, "prefLabel": null, "types": []},
        "relatedConcepts": [{"id": null, "prefLabel": null, "types": []}]
    })
}

#[test]
fn test_driver_reads_one_row() {
    let conn = Arc::new(CannedConnection::new(vec![person_row()]));
    let driver = CypherDriver::new(Arc::clone(&conn), "prod");

    let rels = RelationshipSet::from_names(["related"]);
    let concept = driver.read(UUID, &rels, "tid_1").unwrap().unwrap();

    assert_eq!(concept.pref_label, "Jane Doe");
    assert_eq!(concept.api_url, format!("http://api.ft.com/people/{}", UUID));
    assert!(concept.related_concepts.is_none());

    let statements = conn.statements.lock().unwrap();
    assert_eq!(statements.len(), 1);
    assert!(statements[0].query.contains("relatedConcepts"));
    assert_eq!(statements[0].parameters["thingUUID"], json!(UUID));
}

#[test]
fn test_driver_duplicate_rows() {
    let conn = CannedConnection::new(vec![person_row(), person_row()]);
    let driver = CypherDriver::new(conn, "prod");

    let err = driver.read(UUID, &RelationshipSet::default(), "tid_1").unwrap_err();
    assert!(err.found());
}

#[test]
fn test_driver_no_rows() {
    let driver = CypherDriver::new(CannedConnection::new(Vec::new()), "prod");
    assert!(driver.read(UUID, &RelationshipSet::default(), "tid_1").unwrap().is_none());
    assert!(driver.check_connectivity().is_ok());
    assert_eq!(driver.description(), "neo4j");
}

#[derive(Clone, Default)]
struct Captured {
    bodies: Arc<Mutex<Vec<Value>>>,
    auth: Arc<Mutex<Option<String>>>,
}

async fn commit(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    *captured.auth.lock().unwrap() = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let statement = body["statements"][0]["statement"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    captured.bodies.lock().unwrap().push(body);

    if statement.contains("LIMIT 1") {
        return Json(json!({
            "results": [{"columns": ["ID(x)"], "data": [{"row": [0]}]}],
            "errors": []
        }));
    }
    Json(json!({
        "results": [{
            "columns": ["leaf", "canonical"],
            "data": [{"row": [
                {"uuid": UUID, "prefLabel": "Jane Doe", "types": ["Thing", "Concept", "Person"]},
                {"uuid": null, "prefLabel": null, "types": []}
            ]}]
        }],
        "errors": []
    }))
}

#[tokio::test]
async fn test_http_connection_against_transactional_endpoint() {
    let captured = Captured::default();
    let app = Router::new()
        .route("/db/neo4j/tx/commit", post(commit))
        .with_state(captured.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let (concept, health) = tokio::task::spawn_blocking(move || {
        let conn = HttpGraphConnection::new(
            &base_url,
            "neo4j",
            Some(("neo4j", "secret")),
            Duration::from_secs(5),
        );
        let driver = CypherDriver::new(conn, "prod");
        (
            driver.read(UUID, &RelationshipSet::default(), "tid_1"),
            driver.check_connectivity(),
        )
    })
    .await
    .unwrap();

    let concept = concept.unwrap().unwrap();
    assert_eq!(concept.pref_label, "Jane Doe");
    assert!(health.is_ok());

    // "neo4j:secret"
    assert_eq!(
        captured.auth.lock().unwrap().as_deref(),
        Some("Basic bmVvNGo6c2VjcmV0")
    );
    let bodies = captured.bodies.lock().unwrap();
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0]["statements"][0]["parameters"]["thingUUID"], UUID);
}
