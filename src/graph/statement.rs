use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::types::{Relationship, RelationshipSet};

/// Name of the statement parameter holding the subject identifier.
pub const SUBJECT_PARAM: &str = "thingUUID";

/// Labels on a leaf node that are never exposed as things.
pub const EXCLUDED_LABELS: &[&str] = &["Content"];

const MATCH_SUBJECT: &str = "MATCH (identifier:UPPIdentifier{value:$thingUUID})
MATCH (identifier)-[:IDENTIFIES]->(leaf:Concept)
OPTIONAL MATCH (leaf)-[:EQUIVALENT_TO]->(canonical:Concept)";

const BROADER_TYPES: &str = "HAS_BROADER|HAS_PARENT";
const RELATED_TYPES: &str = "IS_RELATED_TO";

/// Which way a traversal hop points relative to the leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
    Undirected,
}

/// How many hops a traversal spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    One,
    AtLeast(u32),
}

/// Graph pattern reached by one requested relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalPattern {
    pub rel_types: &'static str,
    pub direction: Direction,
    pub depth: Depth,
}

impl TraversalPattern {
    /// The fixed pattern table for supported relationships.
    pub fn for_relationship(relationship: Relationship) -> Self {
        match relationship {
            Relationship::Broader => Self {
                rel_types: BROADER_TYPES,
                direction: Direction::Outgoing,
                depth: Depth::One,
            },
            Relationship::BroaderTransitive => Self {
                rel_types: BROADER_TYPES,
                direction: Direction::Outgoing,
                depth: Depth::AtLeast(2),
            },
            Relationship::Narrower => Self {
                rel_types: BROADER_TYPES,
                direction: Direction::Incoming,
                depth: Depth::One,
            },
            Relationship::Related => Self {
                rel_types: RELATED_TYPES,
                direction: Direction::Undirected,
                depth: Depth::One,
            },
        }
    }

    /// Renders the relationship part of a path, e.g. `-[:HAS_BROADER*2..]->`.
    pub fn render(&self) -> String {
        let hops = match self.depth {
            Depth::One => String::new(),
            Depth::AtLeast(n) => format!("*{}..", n),
        };
        let rel = format!("[:{}{}]", self.rel_types, hops);
        match self.direction {
            Direction::Outgoing => format!("-{}->", rel),
            Direction::Incoming => format!("<-{}-", rel),
            Direction::Undirected => format!("-{}-", rel),
        }
    }
}

/// One relationship fragment of the traversal statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalStep {
    pub relationship: Relationship,
    pub pattern: TraversalPattern,
    /// Variable the collected things are bound to, e.g. `broaderConcepts`.
    pub collection: String,
}

impl TraversalStep {
    fn new(relationship: Relationship) -> Self {
        Self {
            relationship,
            pattern: TraversalPattern::for_relationship(relationship),
            collection: collection_var(relationship),
        }
    }
}

/// Result column name holding the things reached via `relationship`.
pub fn collection_var(relationship: Relationship) -> String {
    format!("{}Concepts", relationship.as_str())
}

/// A parameterized Cypher statement ready to send to the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CypherStatement {
    #[serde(rename = "statement")]
    pub query: String,
    pub parameters: BTreeMap<String, Value>,
}

impl CypherStatement {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

/// Ordered traversal plan for a subject lookup.
///
/// Rendering walks the steps once; each `WITH` re-lists every collection
/// materialized by earlier steps so aggregation never drops them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalPlan {
    steps: Vec<TraversalStep>,
}

impl TraversalPlan {
    pub fn new(relationships: &RelationshipSet) -> Self {
        Self {
            steps: relationships.iter().map(TraversalStep::new).collect(),
        }
    }

    pub fn steps(&self) -> &[TraversalStep] {
        &self.steps
    }

    /// Renders the plan into a single statement bound to `subject`.
    pub fn build(&self, subject: &str) -> CypherStatement {
        let mut clauses = vec![MATCH_SUBJECT.to_string()];
        let mut carried = vec!["leaf".to_string(), "canonical".to_string()];

        for (i, step) in self.steps.iter().enumerate() {
            let hop = format!("c{}", i);
            let target = format!("{}Canonical", step.relationship.as_str());
            clauses.push(format!(
                "OPTIONAL MATCH (leaf){}({}:Concept)",
                step.pattern.render(),
                hop
            ));
            clauses.push(format!(
                "OPTIONAL MATCH ({})-[:EQUIVALENT_TO]->({}:Concept)",
                hop, target
            ));
            clauses.push(format!(
                "WITH {}, collect(DISTINCT {{id: {t}.prefUUID, prefLabel: {t}.prefLabel, types: labels({t})}}) as {}",
                carried.join(", "),
                step.collection,
                t = target
            ));
            carried.push(step.collection.clone());
        }

        let mut returns = vec![
            node_projection("leaf", "uuid"),
            node_projection("canonical", "prefUUID"),
        ];
        returns.extend(self.steps.iter().map(|s| s.collection.clone()));
        clauses.push(format!("RETURN {}", returns.join(", ")));

        CypherStatement::new(clauses.join("\n")).with_param(SUBJECT_PARAM, subject)
    }
}

/// Projects the scalar attributes of `var` into a map bound to `var`.
fn node_projection(var: &str, uuid_property: &str) -> String {
    format!(
        "{{uuid: {v}.{id}, prefLabel: {v}.prefLabel, types: labels({v}), aliases: {v}.aliases, \
descriptionXML: {v}.descriptionXML, imageUrl: {v}.imageUrl, emailAddress: {v}.emailAddress, \
facebookPage: {v}.facebookPage, twitterHandle: {v}.twitterHandle, scopeNote: {v}.scopeNote, \
shortLabel: {v}.shortLabel, isDeprecated: {v}.isDeprecated}} as {v}",
        v = var,
        id = uuid_property
    )
}

/// Builds the lookup statement for `subject` with the requested relationships.
pub fn build_statement(subject: &str, relationships: &RelationshipSet) -> CypherStatement {
    TraversalPlan::new(relationships).build(subject)
}
