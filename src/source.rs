use crate::errors::Result;
use crate::types::{Concept, RelationshipSet};

/// Backing store able to fetch the raw record for one concept.
///
/// Calls block on a remote store; async callers run them on the blocking
/// pool. A single instance is shared read-only by every in-flight lookup.
pub trait ConceptSource: Send + Sync {
    /// Looks up `uuid`, returning `Ok(None)` when no exposable concept exists.
    fn read(
        &self,
        uuid: &str,
        relationships: &RelationshipSet,
        transaction_id: &str,
    ) -> Result<Option<Concept>>;

    /// Verifies the store is reachable.
    fn check_connectivity(&self) -> Result<()>;

    /// Human-readable name of the store, used by health checks.
    fn description(&self) -> &'static str;
}
