use std::time::Duration;

use things_api::config::*;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = ThingsConfig::default();
    assert_eq!(config.app_port, 8080);
    assert_eq!(config.backend, Backend::Neo4j);
    assert_eq!(config.cache_control_header(), "max-age=30, public");
    assert_eq!(config.request_timeout(), Duration::from_secs(60));
    assert!(config.neo_credentials().is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_missing_file_yields_default() {
    let dir = TempDir::new().unwrap();
    let config = load_config(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, ThingsConfig::default());
}

#[test]
fn test_partial_file_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("things-api.toml");
    std::fs::write(
        &path,
        r#"
backend = "concepts-api"
concepts_api_url = "http://concepts.internal:8080"
cache_max_age_secs = 120
log_format = "text"
"#,
    )
    .unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.backend, Backend::ConceptsApi);
    assert_eq!(config.concepts_api_url, "http://concepts.internal:8080");
    assert_eq!(config.cache_control_header(), "max-age=120, public");
    assert_eq!(config.log_format, LogFormat::Text);
    assert_eq!(config.app_port, 8080);
    assert_eq!(config.neo_database, "neo4j");
}

#[test]
fn test_credentials_need_user_and_password() {
    let mut config = ThingsConfig {
        neo_user: Some("neo4j".to_string()),
        ..ThingsConfig::default()
    };
    assert!(config.neo_credentials().is_none());

    config.neo_password = Some("secret".to_string());
    assert_eq!(config.neo_credentials(), Some(("neo4j", "secret")));
}

#[test]
fn test_malformed_file_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("things-api.toml");
    std::fs::write(&path, "app_port = \"not a number\"").unwrap();

    let err = load_config(&path).unwrap_err();
    assert!(err.to_string().starts_with("config error:"));
}

#[test]
fn test_validate_checks_selected_backend_url() {
    let config = ThingsConfig {
        neo_url: "bolt://localhost:7687".to_string(),
        ..ThingsConfig::default()
    };
    assert!(config.validate().is_err());

    let config = ThingsConfig {
        backend: Backend::ConceptsApi,
        neo_url: "bolt://localhost:7687".to_string(),
        ..ThingsConfig::default()
    };
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_rejects_zero_timeout() {
    let config = ThingsConfig {
        request_timeout_secs: 0,
        ..ThingsConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_backend_names() {
    assert_eq!(Backend::from_str("concepts-api"), Some(Backend::ConceptsApi));
    assert_eq!(Backend::from_str("neo4j").map(|b| b.as_str()), Some("neo4j"));
    assert_eq!(Backend::from_str("bolt"), None);
}

#[test]
fn test_parse_duration_compound_values() {
    assert_eq!(parse_duration_secs("30s").unwrap(), 30);
    assert_eq!(parse_duration_secs("2h45m").unwrap(), 9900);
    assert_eq!(parse_duration_secs("1.5m").unwrap(), 90);
    assert_eq!(parse_duration_secs("0").unwrap(), 0);
    assert_eq!(parse_duration_secs("1500ms").unwrap(), 1);
}

#[test]
fn test_parse_duration_rejects_missing_units() {
    for bad in ["", "30", "s", "10x", "1h-5m"] {
        let err = parse_duration_secs(bad).unwrap_err();
        assert!(err.to_string().contains("invalid duration"), "{}", bad);
    }
}
