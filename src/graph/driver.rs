use serde_json::Value;
use tracing::{debug, error};

use crate::db::GraphConnection;
use crate::errors::Result;
use crate::graph::assembler::{assemble, NeoConcept};
use crate::graph::statement::build_statement;
use crate::source::ConceptSource;
use crate::types::{Concept, RelationshipSet};

/// Resolves concepts with one traversal statement per lookup.
pub struct CypherDriver<C> {
    conn: C,
    env: String,
}

impl<C: GraphConnection> CypherDriver<C> {
    pub fn new(conn: C, env: impl Into<String>) -> Self {
        Self {
            conn,
            env: env.into(),
        }
    }
}

impl<C: GraphConnection> ConceptSource for CypherDriver<C> {
    fn read(
        &self,
        uuid: &str,
        relationships: &RelationshipSet,
        transaction_id: &str,
    ) -> Result<Option<Concept>> {
        let statement = build_statement(uuid, relationships);
        debug!(uuid, transaction_id, query = %statement.query, "running lookup statement");

        let rows = self.conn.run(&statement).inspect_err(|e| {
            error!(uuid, transaction_id, error = %e, "error accessing graph store");
        })?;
        let rows = rows
            .into_iter()
            .map(|row| serde_json::from_value::<NeoConcept>(Value::Object(row)))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        assemble(uuid, rows, &self.env)
    }

    fn check_connectivity(&self) -> Result<()> {
        self.conn.check()
    }

    fn description(&self) -> &'static str {
        "neo4j"
    }
}
