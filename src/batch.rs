//! Concurrent resolution of many identifiers.
//!
//! Every identifier gets its own task on the blocking pool. A task ends in
//! exactly one of three ways: it sends `(uuid, concept)` on the results
//! channel, sends a [`BatchError`] on the error channel, or sends nothing
//! (not found). The results channel closes once every task has dropped its
//! sender. [`aggregate`] drains it into a map, or stops at the first error.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::ThingsError;
use crate::resolution::CanonicalResolver;
use crate::source::ConceptSource;
use crate::types::{Concept, RelationshipSet};

/// The first failure observed while resolving a batch.
#[derive(Error, Debug)]
#[error("Error getting thing with uuid {uuid}, err={source}")]
pub struct BatchError {
    pub uuid: String,
    #[source]
    pub source: ThingsError,
}

/// Resolves `uuids` concurrently, keyed by the requested (not canonical) id.
///
/// Unresolvable ids are simply absent from the map. On the first error the
/// remaining tasks are told to stop before their next remote call and
/// whatever they produce is discarded.
pub async fn resolve_batch(
    source: Arc<dyn ConceptSource>,
    uuids: Vec<String>,
    relationships: RelationshipSet,
    transaction_id: String,
) -> Result<HashMap<String, Concept>, BatchError> {
    let (results_tx, results_rx) = mpsc::unbounded_channel();
    let (errors_tx, errors_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let relationships = Arc::new(relationships);
    let transaction_id: Arc<str> = Arc::from(transaction_id);

    debug!(count = uuids.len(), transaction_id = %transaction_id, "starting batch lookup");
    for uuid in uuids {
        let source = Arc::clone(&source);
        let relationships = Arc::clone(&relationships);
        let transaction_id = Arc::clone(&transaction_id);
        let cancel = cancel.clone();
        let results_tx = results_tx.clone();
        let errors_tx = errors_tx.clone();

        tokio::task::spawn_blocking(move || {
            let resolver = CanonicalResolver::new(source.as_ref());
            match resolver.resolve_for_batch(&uuid, &relationships, &transaction_id, &cancel) {
                Ok(Some(concept)) => {
                    let _ = results_tx.send((uuid, concept));
                }
                Ok(None) => {}
                Err(error) => {
                    let _ = errors_tx.send(BatchError {
                        uuid,
                        source: error,
                    });
                }
            }
            // results_tx drops here, after any error has been queued.
        });
    }
    drop(results_tx);
    drop(errors_tx);

    let outcome = aggregate(results_rx, errors_rx).await;
    if outcome.is_err() {
        cancel.cancel();
    }
    outcome
}

/// Collects batch results until the results channel closes.
///
/// Returns as soon as an error arrives, without waiting for tasks still in
/// flight. An error queued just before the last sender dropped is still
/// reported.
pub async fn aggregate(
    mut results: UnboundedReceiver<(String, Concept)>,
    mut errors: UnboundedReceiver<BatchError>,
) -> Result<HashMap<String, Concept>, BatchError> {
    let mut things = HashMap::new();
    loop {
        tokio::select! {
            biased;
            Some(err) = errors.recv() => return Err(err),
            item = results.recv() => match item {
                Some((uuid, concept)) => {
                    things.insert(uuid, concept);
                }
                None => break,
            },
        }
    }
    if let Ok(err) = errors.try_recv() {
        return Err(err);
    }
    Ok(things)
}
