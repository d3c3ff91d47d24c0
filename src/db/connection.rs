use std::time::Duration;

use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::errors::{Result, ThingsError};
use crate::graph::statement::CypherStatement;

/// A result row keyed by column name.
pub type Row = Map<String, Value>;

/// Statement used to prove the store answers queries.
const CONNECTIVITY_QUERY: &str = "MATCH (x) RETURN ID(x) LIMIT 1";

/// Executes Cypher statements against a graph store.
///
/// Implementations are shared read-only across concurrent lookups.
pub trait GraphConnection: Send + Sync {
    /// Runs a single statement and returns its rows.
    fn run(&self, statement: &CypherStatement) -> Result<Vec<Row>>;

    /// Verifies the store is reachable.
    fn check(&self) -> Result<()> {
        self.run(&CypherStatement::new(CONNECTIVITY_QUERY)).map(|_| ())
    }
}

impl<T: GraphConnection + ?Sized> GraphConnection for std::sync::Arc<T> {
    fn run(&self, statement: &CypherStatement) -> Result<Vec<Row>> {
        (**self).run(statement)
    }

    fn check(&self) -> Result<()> {
        (**self).check()
    }
}

#[derive(Debug, Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Debug, Deserialize)]
struct TxResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<TxRow>,
}

#[derive(Debug, Deserialize)]
struct TxRow {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TxError {
    code: String,
    message: String,
}

/// Neo4j reached over its HTTP transactional endpoint.
pub struct HttpGraphConnection {
    agent: ureq::Agent,
    commit_url: String,
    authorization: Option<String>,
}

impl HttpGraphConnection {
    /// Creates a connection to `base_url` (e.g. `http://localhost:7474`).
    ///
    /// Statements are committed in a single request to
    /// `{base_url}/db/{database}/tx/commit`.
    pub fn new(
        base_url: &str,
        database: &str,
        credentials: Option<(&str, &str)>,
        timeout: Duration,
    ) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        let authorization = credentials.map(|(user, password)| {
            let token = base64::engine::general_purpose::STANDARD
                .encode(format!("{}:{}", user, password));
            format!("Basic {}", token)
        });
        Self {
            agent,
            commit_url: format!(
                "{}/db/{}/tx/commit",
                base_url.trim_end_matches('/'),
                database
            ),
            authorization,
        }
    }

    /// Endpoint statements are posted to.
    pub fn commit_url(&self) -> &str {
        &self.commit_url
    }
}

impl GraphConnection for HttpGraphConnection {
    fn run(&self, statement: &CypherStatement) -> Result<Vec<Row>> {
        let body = json!({ "statements": [statement] });
        let mut request = self
            .agent
            .post(&self.commit_url)
            .header("Accept", "application/json;charset=UTF-8");
        if let Some(auth) = &self.authorization {
            request = request.header("Authorization", auth);
        }

        let mut response = request.send_json(&body)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ThingsError::upstream(
                "neo4j_commit",
                format!("graph store returned status {}", status.as_u16()),
            ));
        }

        let tx: TxResponse = response.body_mut().read_json()?;
        decode_rows(tx)
    }
}

/// Flattens a transactional response into column-keyed rows.
fn decode_rows(tx: TxResponse) -> Result<Vec<Row>> {
    if let Some(err) = tx.errors.first() {
        return Err(ThingsError::upstream(
            "neo4j_commit",
            format!("{}: {}", err.code, err.message),
        ));
    }

    let Some(result) = tx.results.into_iter().next() else {
        return Ok(Vec::new());
    };
    debug!(rows = result.data.len(), "graph store answered");

    Ok(result
        .data
        .into_iter()
        .map(|r| result.columns.iter().cloned().zip(r.row).collect())
        .collect())
}
