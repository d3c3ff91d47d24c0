use tokio_util::sync::CancellationToken;
use tracing::{error, warn};
use uuid::Uuid;

use crate::errors::{Result, ThingsError};
use crate::source::ConceptSource;
use crate::types::{Concept, RelationshipSet};

/// Outcome of a single-item lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The requested id is the canonical one.
    Found(Concept),
    /// The requested id is an alias; callers should redirect permanently.
    Redirect { canonical_uuid: String },
    NotFound,
}

/// Extracts the trailing UUID of a public thing id.
pub fn canonical_uuid(thing_id: &str) -> Option<String> {
    let candidate = thing_id.rsplit('/').next()?;
    Uuid::parse_str(candidate).ok()?;
    Some(candidate.to_string())
}

/// Whether `concept` is the canonical record for `uuid`.
pub fn settles_on(concept: &Concept, uuid: &str) -> bool {
    concept.id.contains(uuid)
}

/// Applies canonical-identifier policies on top of a concept source.
///
/// The single-item path never follows a concordance itself: it reports a
/// redirect. The batch path follows exactly one extra hop and drops the
/// entry if that hop does not land on a canonical record.
pub struct CanonicalResolver<'a> {
    source: &'a dyn ConceptSource,
}

impl<'a> CanonicalResolver<'a> {
    pub fn new(source: &'a dyn ConceptSource) -> Self {
        Self { source }
    }

    /// Resolves `uuid` for a single-item request.
    pub fn resolve(
        &self,
        uuid: &str,
        relationships: &RelationshipSet,
        transaction_id: &str,
    ) -> Result<Resolution> {
        let Some(concept) = self.source.read(uuid, relationships, transaction_id)? else {
            return Ok(Resolution::NotFound);
        };
        if settles_on(&concept, uuid) {
            return Ok(Resolution::Found(concept));
        }

        match canonical_uuid(&concept.id) {
            Some(canonical_uuid) => Ok(Resolution::Redirect { canonical_uuid }),
            None => Err(ThingsError::upstream(
                "resolve",
                format!("cannot extract canonical uuid from {}", concept.id),
            )),
        }
    }

    /// Resolves `uuid` for a batch request, following at most one hop.
    ///
    /// Returns `Ok(None)` when the entry should be left out of the batch,
    /// including when `cancel` fires before a remote call is made.
    pub fn resolve_for_batch(
        &self,
        uuid: &str,
        relationships: &RelationshipSet,
        transaction_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<Concept>> {
        if cancel.is_cancelled() {
            return Ok(None);
        }
        let Some(concept) = self.source.read(uuid, relationships, transaction_id)? else {
            return Ok(None);
        };
        if settles_on(&concept, uuid) {
            return Ok(Some(concept));
        }

        let Some(canonical) = canonical_uuid(&concept.id) else {
            warn!(
                uuid,
                transaction_id,
                id = %concept.id,
                "cannot extract canonical uuid, dropping entry"
            );
            return Ok(None);
        };
        if cancel.is_cancelled() {
            return Ok(None);
        }

        let Some(concept) = self.source.read(&canonical, relationships, transaction_id)? else {
            error!(
                uuid,
                canonical_uuid = %canonical,
                transaction_id,
                "Referenced canonical uuid is missing in graph store, possible data inconsistency"
            );
            return Ok(None);
        };
        if !settles_on(&concept, &canonical) {
            warn!(
                uuid,
                transaction_id,
                "Multiple level of indirection to canonical node, giving up traversing"
            );
            return Ok(None);
        }
        Ok(Some(concept))
    }
}
