/// HTTP connection to the Neo4j transactional endpoint.
pub mod connection;

pub use connection::{GraphConnection, HttpGraphConnection, Row};
