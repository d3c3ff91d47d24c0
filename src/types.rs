use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Namespace shared by every relationship predicate.
pub const SKOS_PREFIX: &str = "http://www.w3.org/2004/02/skos/core#";

/// Kinds of taxonomic relationship a caller may ask for.
///
/// The declaration order is the order in which relationships are traversed
/// and rendered, so statements built from the same set are always identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Relationship {
    Broader,
    BroaderTransitive,
    Narrower,
    Related,
}

#[allow(clippy::should_implement_trait)]
impl Relationship {
    /// Returns the request token for this relationship.
    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Broader => "broader",
            Relationship::BroaderTransitive => "broaderTransitive",
            Relationship::Narrower => "narrower",
            Relationship::Related => "related",
        }
    }

    /// Parses a request token, returning `None` for unsupported names.
    pub fn from_str(s: &str) -> Option<Relationship> {
        match s {
            "broader" => Some(Relationship::Broader),
            "broaderTransitive" => Some(Relationship::BroaderTransitive),
            "narrower" => Some(Relationship::Narrower),
            "related" => Some(Relationship::Related),
            _ => None,
        }
    }

    /// The SKOS predicate URI tagged onto things reached via this relationship.
    pub fn predicate(&self) -> String {
        format!("{}{}", SKOS_PREFIX, self.as_str())
    }
}

/// The set of relationships requested by a caller.
///
/// Unsupported names are dropped on construction and `broaderTransitive`
/// always brings `broader` along with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipSet(BTreeSet<Relationship>);

impl RelationshipSet {
    /// Builds a set from raw request tokens.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set: BTreeSet<Relationship> = names
            .into_iter()
            .filter_map(|n| Relationship::from_str(n.as_ref()))
            .collect();
        if set.contains(&Relationship::BroaderTransitive) {
            set.insert(Relationship::Broader);
        }
        Self(set)
    }

    pub fn contains(&self, relationship: Relationship) -> bool {
        self.0.contains(&relationship)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates in traversal order.
    pub fn iter(&self) -> impl Iterator<Item = Relationship> + '_ {
        self.0.iter().copied()
    }

    /// Request tokens for the retained relationships.
    pub fn names(&self) -> Vec<&'static str> {
        self.iter().map(|r| r.as_str()).collect()
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// The public record for a resolved concept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    pub id: String,
    pub api_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pref_label: String,
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub direct_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(
        rename = "descriptionXML",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub description_xml: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email_address: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub facebook_page: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub twitter_handle: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scope_note: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub short_label: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_deprecated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broader_concepts: Option<Vec<Thing>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrower_concepts: Option<Vec<Thing>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_concepts: Option<Vec<Thing>>,
}

/// A reference to another concept inside a relationship list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thing {
    pub id: String,
    pub api_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pref_label: String,
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub direct_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub predicate: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_deprecated: bool,
}

/// Body of a successful batch lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThingsResponse {
    pub things: std::collections::HashMap<String, Concept>,
}
