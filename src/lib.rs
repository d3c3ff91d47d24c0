pub mod api;
pub mod batch;
pub mod concepts_api;
pub mod config;
pub mod db;
pub mod errors;
pub mod graph;
pub mod logging;
pub mod ontology;
pub mod resolution;
pub mod source;
pub mod types;
