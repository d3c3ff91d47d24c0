//! Mapping between raw graph labels and public ontology identifiers.
//!
//! Every label a node may carry is registered with its ontology URI and its
//! parent label. The parent links form a tree rooted at `Thing`, which is
//! what lets an unordered label set be laid out generic → specific.

/// Base of public thing identifiers.
pub const THINGS_API_URL: &str = "http://api.ft.com/things/";

const PROD_API_BASE: &str = "http://api.ft.com/";
const TEST_API_BASE: &str = "http://test.api.ft.com/";

struct LabelInfo {
    label: &'static str,
    uri: &'static str,
    parent: Option<&'static str>,
    api_path: Option<&'static str>,
}

const LABELS: &[LabelInfo] = &[
    LabelInfo {
        label: "Thing",
        uri: "http://www.ft.com/ontology/core/Thing",
        parent: None,
        api_path: Some("things"),
    },
    LabelInfo {
        label: "Concept",
        uri: "http://www.ft.com/ontology/concept/Concept",
        parent: Some("Thing"),
        api_path: None,
    },
    LabelInfo {
        label: "Content",
        uri: "http://www.ft.com/ontology/content/Content",
        parent: Some("Thing"),
        api_path: Some("content"),
    },
    LabelInfo {
        label: "Role",
        uri: "http://www.ft.com/ontology/organisation/Role",
        parent: Some("Thing"),
        api_path: None,
    },
    LabelInfo {
        label: "BoardRole",
        uri: "http://www.ft.com/ontology/organisation/BoardRole",
        parent: Some("Role"),
        api_path: None,
    },
    LabelInfo {
        label: "Classification",
        uri: "http://www.ft.com/ontology/classification/Classification",
        parent: Some("Concept"),
        api_path: None,
    },
    LabelInfo {
        label: "IndustryClassification",
        uri: "http://www.ft.com/ontology/industry/IndustryClassification",
        parent: Some("Classification"),
        api_path: None,
    },
    LabelInfo {
        label: "Brand",
        uri: "http://www.ft.com/ontology/product/Brand",
        parent: Some("Classification"),
        api_path: Some("brands"),
    },
    LabelInfo {
        label: "Subject",
        uri: "http://www.ft.com/ontology/Subject",
        parent: Some("Classification"),
        api_path: None,
    },
    LabelInfo {
        label: "Section",
        uri: "http://www.ft.com/ontology/Section",
        parent: Some("Classification"),
        api_path: None,
    },
    LabelInfo {
        label: "Genre",
        uri: "http://www.ft.com/ontology/Genre",
        parent: Some("Classification"),
        api_path: None,
    },
    LabelInfo {
        label: "SpecialReport",
        uri: "http://www.ft.com/ontology/SpecialReport",
        parent: Some("Classification"),
        api_path: None,
    },
    LabelInfo {
        label: "AlphavilleSeries",
        uri: "http://www.ft.com/ontology/AlphavilleSeries",
        parent: Some("Classification"),
        api_path: None,
    },
    LabelInfo {
        label: "Location",
        uri: "http://www.ft.com/ontology/Location",
        parent: Some("Concept"),
        api_path: None,
    },
    LabelInfo {
        label: "Topic",
        uri: "http://www.ft.com/ontology/Topic",
        parent: Some("Concept"),
        api_path: None,
    },
    LabelInfo {
        label: "Person",
        uri: "http://www.ft.com/ontology/person/Person",
        parent: Some("Concept"),
        api_path: Some("people"),
    },
    LabelInfo {
        label: "Organisation",
        uri: "http://www.ft.com/ontology/organisation/Organisation",
        parent: Some("Concept"),
        api_path: Some("organisations"),
    },
    LabelInfo {
        label: "Company",
        uri: "http://www.ft.com/ontology/company/Company",
        parent: Some("Organisation"),
        api_path: None,
    },
    LabelInfo {
        label: "PublicCompany",
        uri: "http://www.ft.com/ontology/company/PublicCompany",
        parent: Some("Company"),
        api_path: None,
    },
    LabelInfo {
        label: "PrivateCompany",
        uri: "http://www.ft.com/ontology/company/PrivateCompany",
        parent: Some("Company"),
        api_path: None,
    },
    LabelInfo {
        label: "Membership",
        uri: "http://www.ft.com/ontology/organisation/Membership",
        parent: Some("Concept"),
        api_path: None,
    },
    LabelInfo {
        label: "FinancialInstrument",
        uri: "http://www.ft.com/ontology/FinancialInstrument",
        parent: Some("Concept"),
        api_path: None,
    },
];

fn info(label: &str) -> Option<&'static LabelInfo> {
    LABELS.iter().find(|l| l.label == label)
}

fn info_by_uri(uri: &str) -> Option<&'static LabelInfo> {
    LABELS.iter().find(|l| l.uri == uri)
}

/// Labels from `label` up to the root, most specific first.
fn ancestry(label: &str) -> Vec<&'static LabelInfo> {
    let mut chain = Vec::new();
    let mut current = info(label);
    while let Some(node) = current {
        chain.push(node);
        current = node.parent.and_then(info);
    }
    chain
}

/// Orders `labels` generic → specific.
///
/// Returns `None` if any label is unknown or if the labels do not sit on a
/// single ancestry line (e.g. both `Person` and `Organisation`).
fn sort_labels<S: AsRef<str>>(labels: &[S]) -> Option<Vec<&'static LabelInfo>> {
    let mut known = Vec::with_capacity(labels.len());
    for label in labels {
        let node = info(label.as_ref())?;
        if !known.iter().any(|k: &&LabelInfo| k.label == node.label) {
            known.push(node);
        }
    }
    if known.is_empty() {
        return None;
    }

    known.sort_by_key(|n| ancestry(n.label).len());
    for pair in known.windows(2) {
        let descends = ancestry(pair[1].label)
            .iter()
            .any(|a| a.label == pair[0].label);
        if !descends {
            return None;
        }
    }
    Some(known)
}

/// Maps raw labels to ontology URIs, generic → specific.
///
/// `None` signals a mapping failure; callers treat that as "not found".
pub fn type_uris<S: AsRef<str>>(labels: &[S]) -> Option<Vec<String>> {
    sort_labels(labels).map(|sorted| sorted.iter().map(|n| n.uri.to_string()).collect())
}

/// Expands a direct type URI into its full hierarchy, generic → specific.
///
/// Unknown URIs yield just the URI itself so the direct type is never lost.
pub fn full_type_hierarchy(type_uri: &str) -> Vec<String> {
    match info_by_uri(type_uri) {
        Some(node) => ancestry(node.label)
            .iter()
            .rev()
            .map(|n| n.uri.to_string())
            .collect(),
        None if type_uri.is_empty() => Vec::new(),
        None => vec![type_uri.to_string()],
    }
}

/// Public identifier URL of a thing.
pub fn id_url(uuid: &str) -> String {
    format!("{}{}", THINGS_API_URL, uuid)
}

/// API URL of a thing, routed by its most specific label.
pub fn api_url<S: AsRef<str>>(uuid: &str, labels: &[S], env: &str) -> String {
    let base = if env == "test" {
        TEST_API_BASE
    } else {
        PROD_API_BASE
    };
    let path = sort_labels(labels)
        .and_then(|sorted| sorted.last().copied())
        .and_then(|most_specific| ancestry(most_specific.label).iter().find_map(|n| n.api_path))
        .unwrap_or("things");
    format!("{}{}/{}", base, path, uuid)
}

/// Final path segment of a URI (`http://x/y/Brand` → `Brand`).
pub fn last_segment(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

/// Graph label for a direct type URI, if registered.
pub fn label_for_uri(uri: &str) -> Option<&'static str> {
    info_by_uri(uri).map(|n| n.label)
}
