#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use things_api::errors::{Result, ThingsError};
use things_api::ontology;
use things_api::source::ConceptSource;
use things_api::types::{Concept, RelationshipSet};

pub const A: &str = "6773e864-78ab-4051-abc2-f4e9ab423ebb";
pub const B: &str = "3b4a1c3f-4d6a-3a4b-9f7e-64bf6d5a1c27";
pub const C: &str = "a5f3c1d8-1a2b-4c3d-8e9f-0a1b2c3d4e5f";
pub const D: &str = "0f1e2d3c-4b5a-4978-8877-665544332211";

enum Entry {
    Concept(Concept),
    Fail(String),
}

/// In-memory concept source keyed by requested uuid.
#[derive(Default)]
pub struct FakeSource {
    entries: HashMap<String, Entry>,
    delays: HashMap<String, Duration>,
    unhealthy: Option<String>,
    calls: Mutex<Vec<String>>,
    reads: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// `uuid` reads as a concept whose id points at `canonical`.
    pub fn with(mut self, uuid: &str, canonical: &str, label: &str) -> Self {
        self.entries
            .insert(uuid.to_string(), Entry::Concept(concept(canonical, label)));
        self
    }

    pub fn with_concept(mut self, uuid: &str, concept: Concept) -> Self {
        self.entries.insert(uuid.to_string(), Entry::Concept(concept));
        self
    }

    pub fn failing(mut self, uuid: &str, message: &str) -> Self {
        self.entries
            .insert(uuid.to_string(), Entry::Fail(message.to_string()));
        self
    }

    pub fn delayed(mut self, uuid: &str, delay: Duration) -> Self {
        self.delays.insert(uuid.to_string(), delay);
        self
    }

    pub fn unhealthy(mut self, message: &str) -> Self {
        self.unhealthy = Some(message.to_string());
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ConceptSource for FakeSource {
    fn read(
        &self,
        uuid: &str,
        _relationships: &RelationshipSet,
        _transaction_id: &str,
    ) -> Result<Option<Concept>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(uuid.to_string());
        if let Some(delay) = self.delays.get(uuid) {
            std::thread::sleep(*delay);
        }
        match self.entries.get(uuid) {
            None => Ok(None),
            Some(Entry::Concept(c)) => Ok(Some(c.clone())),
            Some(Entry::Fail(message)) => Err(ThingsError::Upstream {
                message: message.clone(),
                operation: "read".to_string(),
            }),
        }
    }

    fn check_connectivity(&self) -> Result<()> {
        match &self.unhealthy {
            None => Ok(()),
            Some(message) => Err(ThingsError::Upstream {
                message: message.clone(),
                operation: "check_connectivity".to_string(),
            }),
        }
    }

    fn description(&self) -> &'static str {
        "fake store"
    }
}

/// A topic concept whose public id ends in `uuid`.
pub fn concept(uuid: &str, label: &str) -> Concept {
    let labels = ["Thing", "Concept", "Topic"];
    let types = ontology::type_uris(&labels).unwrap();
    Concept {
        id: ontology::id_url(uuid),
        api_url: ontology::api_url(uuid, &labels, "prod"),
        pref_label: label.to_string(),
        direct_type: types.last().unwrap().clone(),
        types,
        ..Concept::default()
    }
}
