//! `ConceptSource` backed by an upstream HTTP concept service.
//!
//! The service answers `GET /concepts/{uuid}` with a single JSON document
//! whose shape differs from the public thing: the type is a single URI,
//! labels and social accounts are typed key/value lists, and relationships
//! are nested `{concept, predicate}` pairs. [`translate`] folds that
//! document into the same [`Concept`] model the graph backend produces.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, warn};

use crate::errors::{Result, ThingsError};
use crate::ontology;
use crate::source::ConceptSource;
use crate::types::{Concept, RelationshipSet, Thing, SKOS_PREFIX};

const SHORT_LABEL_URI: &str = "http://www.ft.com/ontology/shortLabel";
const ALIAS_LABEL_URI: &str = "http://www.w3.org/2008/05/skos-xl#altLabel";
const EMAIL_ADDRESS_URI: &str = "http://www.ft.com/ontology/emailAddress";
const FACEBOOK_PAGE_URI: &str = "http://www.ft.com/ontology/facebookPage";
const TWITTER_URI: &str = "http://www.ft.com/ontology/twitterHandle";
const UPSTREAM_THING_URL: &str = "http://www.ft.com/thing/";

const USER_AGENT: &str = "things-api";

/// A typed value such as an alternative label or a social account.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TypedValue {
    #[serde(rename = "type")]
    pub value_type: String,
    pub value: String,
}

/// Minimal concept description nested inside relationships.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BasicConcept {
    pub id: String,
    pub api_url: String,
    #[serde(rename = "type")]
    pub concept_type: String,
    pub pref_label: String,
    pub is_deprecated: bool,
}

/// A relationship entry of an upstream concept document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiRelationship {
    pub concept: BasicConcept,
    pub predicate: String,
}

/// Concept document returned by the upstream service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConceptsApiResponse {
    #[serde(flatten)]
    pub basic: BasicConcept,
    #[serde(rename = "descriptionXML")]
    pub description_xml: String,
    #[serde(alias = "imageURL")]
    pub image_url: String,
    pub account: Vec<TypedValue>,
    pub alternative_labels: Vec<TypedValue>,
    pub scope_note: String,
    pub short_label: String,
    #[serde(rename = "broaderConcepts")]
    pub broader: Vec<ApiRelationship>,
    #[serde(rename = "narrowerConcepts")]
    pub narrower: Vec<ApiRelationship>,
    #[serde(rename = "relatedConcepts")]
    pub related: Vec<ApiRelationship>,
}

/// Rewrites an upstream thing id into the public thing id.
pub fn convert_id(upstream_id: &str) -> String {
    upstream_id.replacen(UPSTREAM_THING_URL, ontology::THINGS_API_URL, 1)
}

/// Brand predicates are exposed as their SKOS equivalents.
pub fn map_predicate(predicate: &str) -> String {
    match predicate {
        "http://www.ft.com/ontology/subBrandOf" => format!("{}broader", SKOS_PREFIX),
        "http://www.ft.com/ontology/hasSubBrand" => format!("{}narrower", SKOS_PREFIX),
        other => other.to_string(),
    }
}

fn api_url_for(id: &str, type_uri: &str, env: &str) -> String {
    let label =
        ontology::label_for_uri(type_uri).unwrap_or_else(|| ontology::last_segment(type_uri));
    ontology::api_url(ontology::last_segment(id), &[label], env)
}

fn convert_relationships(relationships: &[ApiRelationship], env: &str) -> Option<Vec<Thing>> {
    if relationships.is_empty() {
        return None;
    }
    Some(
        relationships
            .iter()
            .map(|rel| Thing {
                id: convert_id(&rel.concept.id),
                api_url: api_url_for(&rel.concept.id, &rel.concept.concept_type, env),
                pref_label: rel.concept.pref_label.clone(),
                types: ontology::full_type_hierarchy(&rel.concept.concept_type),
                direct_type: rel.concept.concept_type.clone(),
                predicate: map_predicate(&rel.predicate),
                is_deprecated: rel.concept.is_deprecated,
            })
            .collect(),
    )
}

/// Folds an upstream concept document into the public concept model.
///
/// Returns `None` when the document carries no type, since a concept
/// without a type hierarchy is never exposed.
pub fn translate(doc: &ConceptsApiResponse, env: &str) -> Option<Concept> {
    if doc.basic.concept_type.is_empty() {
        warn!(id = %doc.basic.id, "upstream concept has no type, treating as not found");
        return None;
    }

    let mut concept = Concept {
        id: convert_id(&doc.basic.id),
        api_url: api_url_for(&doc.basic.id, &doc.basic.concept_type, env),
        pref_label: doc.basic.pref_label.clone(),
        types: ontology::full_type_hierarchy(&doc.basic.concept_type),
        direct_type: doc.basic.concept_type.clone(),
        description_xml: doc.description_xml.clone(),
        image_url: doc.image_url.clone(),
        scope_note: doc.scope_note.clone(),
        short_label: doc.short_label.clone(),
        is_deprecated: doc.basic.is_deprecated,
        ..Concept::default()
    };

    for label in &doc.alternative_labels {
        match label.value_type.as_str() {
            ALIAS_LABEL_URI => concept.aliases.push(label.value.clone()),
            SHORT_LABEL_URI => concept.short_label = label.value.clone(),
            _ => {}
        }
    }
    for account in &doc.account {
        match account.value_type.as_str() {
            EMAIL_ADDRESS_URI => concept.email_address = account.value.clone(),
            FACEBOOK_PAGE_URI => concept.facebook_page = account.value.clone(),
            TWITTER_URI => concept.twitter_handle = account.value.clone(),
            other => warn!(account_type = other, "account type not currently supported"),
        }
    }

    concept.broader_concepts = convert_relationships(&doc.broader, env);
    concept.narrower_concepts = convert_relationships(&doc.narrower, env);
    concept.related_concepts = convert_relationships(&doc.related, env);
    Some(concept)
}

/// Client for the upstream concept service.
pub struct ConceptsApiClient {
    agent: ureq::Agent,
    base_url: String,
    env: String,
}

impl ConceptsApiClient {
    pub fn new(base_url: &str, env: impl Into<String>, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            env: env.into(),
        }
    }
}

impl ConceptSource for ConceptsApiClient {
    fn read(
        &self,
        uuid: &str,
        relationships: &RelationshipSet,
        transaction_id: &str,
    ) -> Result<Option<Concept>> {
        let url = format!("{}/concepts/{}", self.base_url, uuid);
        let mut request = self
            .agent
            .get(&url)
            .header("X-Request-Id", transaction_id)
            .header("User-Agent", USER_AGENT);
        for name in relationships.names() {
            request = request.query("showRelationship", name);
        }

        let mut response = request.call().inspect_err(|e| {
            error!(
                uuid,
                transaction_id,
                url = %url,
                error = %e,
                "request to concept service was unsuccessful"
            );
        })?;
        let status = response.status();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            error!(
                uuid,
                transaction_id,
                status = status.as_u16(),
                "concept service returned an error status"
            );
            return Err(ThingsError::upstream(
                "get_concept",
                format!("request to {} returned status: {}", url, status.as_u16()),
            ));
        }

        let doc: ConceptsApiResponse = response.body_mut().read_json().inspect_err(|e| {
            error!(uuid, transaction_id, error = %e, "failed to decode concept service response");
        })?;
        Ok(translate(&doc, &self.env))
    }

    fn check_connectivity(&self) -> Result<()> {
        let response = self
            .agent
            .get(format!("{}/__gtg", self.base_url))
            .header("User-Agent", USER_AGENT)
            .call()?;
        if response.status().as_u16() != 200 {
            return Err(ThingsError::upstream(
                "check_connectivity",
                format!(
                    "health check returned a non-200 HTTP status: {}",
                    response.status().as_u16()
                ),
            ));
        }
        Ok(())
    }

    fn description(&self) -> &'static str {
        "public concepts api"
    }
}
