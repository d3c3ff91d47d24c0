use std::collections::HashSet;

use serde::{Deserialize, Deserializer};
use tracing::{debug, error, warn};

use crate::errors::{Result, ThingsError};
use crate::graph::statement::EXCLUDED_LABELS;
use crate::ontology;
use crate::types::{Concept, Relationship, Thing};

/// Deserializes an explicit `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Scalar attributes of a leaf or canonical node as returned by the store.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NeoNode {
    #[serde(deserialize_with = "null_as_default")]
    pub uuid: String,
    #[serde(deserialize_with = "null_as_default")]
    pub pref_label: String,
    #[serde(deserialize_with = "null_as_default")]
    pub types: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub aliases: Vec<String>,
    #[serde(rename = "descriptionXML", deserialize_with = "null_as_default")]
    pub description_xml: String,
    #[serde(deserialize_with = "null_as_default")]
    pub image_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email_address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub facebook_page: String,
    #[serde(deserialize_with = "null_as_default")]
    pub twitter_handle: String,
    #[serde(deserialize_with = "null_as_default")]
    pub scope_note: String,
    #[serde(deserialize_with = "null_as_default")]
    pub short_label: String,
    #[serde(deserialize_with = "null_as_default")]
    pub is_deprecated: bool,
}

/// A related concept collected by a traversal step.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NeoThing {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub pref_label: String,
    #[serde(deserialize_with = "null_as_default")]
    pub types: Vec<String>,
}

/// One result row of the lookup statement.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NeoConcept {
    #[serde(deserialize_with = "null_as_default")]
    pub leaf: NeoNode,
    #[serde(deserialize_with = "null_as_default")]
    pub canonical: NeoNode,
    #[serde(deserialize_with = "null_as_default")]
    pub broader_concepts: Vec<NeoThing>,
    #[serde(deserialize_with = "null_as_default")]
    pub broader_transitive_concepts: Vec<NeoThing>,
    #[serde(deserialize_with = "null_as_default")]
    pub narrower_concepts: Vec<NeoThing>,
    #[serde(deserialize_with = "null_as_default")]
    pub related_concepts: Vec<NeoThing>,
}

/// Which node of a concordance pair supplies the public attributes.
#[derive(Debug, Clone, Copy)]
pub enum NodeSource<'a> {
    Canonical(&'a NeoNode),
    Leaf(&'a NeoNode),
}

impl<'a> NodeSource<'a> {
    /// Canonical attributes win whenever the canonical node has a label.
    pub fn select(row: &'a NeoConcept) -> Self {
        if row.canonical.pref_label.is_empty() {
            NodeSource::Leaf(&row.leaf)
        } else {
            NodeSource::Canonical(&row.canonical)
        }
    }

    pub fn node(&self) -> &'a NeoNode {
        match self {
            NodeSource::Canonical(n) | NodeSource::Leaf(n) => n,
        }
    }
}

/// Turns the rows returned for `uuid` into a concept.
///
/// Returns `Ok(None)` for every not-found outcome: no rows, an empty leaf,
/// an excluded leaf label, or labels that cannot be mapped to the ontology.
/// More than one row means the identifier is ambiguous and is an error.
pub fn assemble(uuid: &str, rows: Vec<NeoConcept>, env: &str) -> Result<Option<Concept>> {
    let Some(row) = rows.first() else {
        return Ok(None);
    };
    if row.leaf.uuid.is_empty() {
        return Ok(None);
    }
    if rows.len() > 1 {
        error!(uuid, rows = rows.len(), "Multiple Things found with the same UUID");
        return Err(ThingsError::DuplicateIdentifier {
            uuid: uuid.to_string(),
        });
    }

    if is_excluded(&row.leaf) {
        debug!(uuid, "leaf carries an excluded label");
        return Ok(None);
    }

    let Some(mut concept) = map_node(NodeSource::select(row), env) else {
        return Ok(None);
    };

    concept.broader_concepts = populate_relationships(
        &row.broader_concepts,
        Relationship::Broader,
        &row.broader_transitive_concepts,
        env,
    );
    concept.narrower_concepts =
        populate_relationships(&row.narrower_concepts, Relationship::Narrower, &[], env);
    concept.related_concepts =
        populate_relationships(&row.related_concepts, Relationship::Related, &[], env);

    Ok(Some(concept))
}

fn is_excluded(node: &NeoNode) -> bool {
    node.types
        .iter()
        .any(|label| EXCLUDED_LABELS.contains(&label.as_str()))
}

/// Maps the chosen node's scalar attributes; `None` when types are unmappable.
fn map_node(source: NodeSource<'_>, env: &str) -> Option<Concept> {
    let node = source.node();
    let Some(types) = ontology::type_uris(&node.types) else {
        warn!(
            uuid = %node.uuid,
            labels = ?node.types,
            "Could not map type URIs, treating concept as not found"
        );
        return None;
    };
    let direct_type = types.last()?.clone();

    Some(Concept {
        id: ontology::id_url(&node.uuid),
        api_url: ontology::api_url(&node.uuid, &node.types, env),
        pref_label: node.pref_label.clone(),
        types,
        direct_type,
        aliases: node.aliases.clone(),
        description_xml: node.description_xml.clone(),
        image_url: node.image_url.clone(),
        email_address: node.email_address.clone(),
        facebook_page: node.facebook_page.clone(),
        twitter_handle: node.twitter_handle.clone(),
        scope_note: node.scope_note.clone(),
        short_label: node.short_label.clone(),
        is_deprecated: node.is_deprecated,
        ..Concept::default()
    })
}

/// Builds one relationship slot.
///
/// The slot is omitted when the first direct entry has no id: an optional
/// match that found nothing still collects a single all-null entry.
/// Transitive entries only apply to `broader` and skip ids already present
/// in the direct list.
fn populate_relationships(
    direct: &[NeoThing],
    relationship: Relationship,
    transitive: &[NeoThing],
    env: &str,
) -> Option<Vec<Thing>> {
    let first = direct.first()?;
    if first.id.is_empty() {
        return None;
    }

    let predicate = relationship.predicate();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut things = Vec::with_capacity(direct.len() + transitive.len());
    for entry in direct {
        seen.insert(entry.id.as_str());
        things.extend(map_thing(entry, &predicate, env));
    }

    if transitive.first().is_some_and(|t| !t.id.is_empty()) {
        let transitive_predicate = Relationship::BroaderTransitive.predicate();
        for entry in transitive {
            if !seen.contains(entry.id.as_str()) {
                things.extend(map_thing(entry, &transitive_predicate, env));
            }
        }
    }
    Some(things)
}

fn map_thing(entry: &NeoThing, predicate: &str, env: &str) -> Option<Thing> {
    let Some(types) = ontology::type_uris(&entry.types) else {
        warn!(
            uuid = %entry.id,
            labels = ?entry.types,
            "Could not map type URIs for related thing, skipping it"
        );
        return None;
    };
    let direct_type = types.last()?.clone();
    Some(Thing {
        id: ontology::id_url(&entry.id),
        api_url: ontology::api_url(&entry.id, &entry.types, env),
        pref_label: entry.pref_label.clone(),
        types,
        direct_type,
        predicate: predicate.to_string(),
        is_deprecated: false,
    })
}
