use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use tracing::{error, info};

use things_api::api::{self, AppState};
use things_api::concepts_api::ConceptsApiClient;
use things_api::config::{load_config, parse_duration_secs, Backend, LogFormat, ThingsConfig};
use things_api::db::HttpGraphConnection;
use things_api::errors::{Result, ThingsError};
use things_api::graph::CypherDriver;
use things_api::logging;
use things_api::source::ConceptSource;

/// Public API for serving information on Things.
#[derive(Parser)]
#[command(name = "things-api", about = "Public API for serving information on Things")]
struct Cli {
    /// Path of an optional TOML configuration file
    #[arg(long, env = "CONFIG_FILE", default_value = "things-api.toml")]
    config: PathBuf,
    /// Port to listen on
    #[arg(long, env = "APP_PORT")]
    port: Option<u16>,
    /// Port to listen on when APP_PORT is unset
    #[arg(long = "legacy-port", env = "PORT", hide = true)]
    legacy_port: Option<u16>,
    /// Store to read concepts from (neo4j or concepts-api)
    #[arg(long, env = "BACKEND")]
    backend: Option<String>,
    /// Neo4j HTTP endpoint
    #[arg(long, env = "NEO_URL")]
    neo_url: Option<String>,
    /// Neo4j database name
    #[arg(long, env = "NEO_DATABASE")]
    neo_database: Option<String>,
    /// Neo4j user for basic auth
    #[arg(long, env = "NEO_USER")]
    neo_user: Option<String>,
    /// Neo4j password for basic auth
    #[arg(long, env = "NEO_PASSWORD", hide_env_values = true)]
    neo_password: Option<String>,
    /// Base URL of the upstream concept service
    #[arg(long, env = "CONCEPTS_API_URL")]
    concepts_api_url: Option<String>,
    /// Environment name; "test" switches API URLs to the test host
    #[arg(long, env = "ENV")]
    env: Option<String>,
    /// Cache-Control max-age in seconds
    #[arg(long, env = "CACHE_MAX_AGE")]
    cache_max_age: Option<u64>,
    /// Cache-Control max-age as a duration such as 30s or 2h45m
    #[arg(long, env = "CACHE_DURATION")]
    cache_duration: Option<String>,
    /// Outbound request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT")]
    request_timeout: Option<u64>,
    /// Log filter directive, e.g. info or things_api=debug
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,
    /// Log output format (json or text)
    #[arg(long, env = "LOG_FORMAT")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!(error = %e, "things-api stopped");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(cli)?;
    config.validate()?;
    logging::init(&config.log_level, config.log_format);

    let source = build_source(&config);
    let state = AppState::new(Arc::clone(&source), &config.cache_control_header())?;
    let router = api::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.app_port)).await?;
    info!(
        port = config.app_port,
        backend = config.backend.as_str(),
        store = source.description(),
        env = %config.env,
        "starting things-api"
    );
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("things-api shut down");
    Ok(())
}

/// Loads the config file, then applies flag and environment overrides.
fn resolve_config(cli: Cli) -> Result<ThingsConfig> {
    let mut config = load_config(&cli.config)?;
    if let Some(port) = cli.port.or(cli.legacy_port) {
        config.app_port = port;
    }
    if let Some(name) = cli.backend {
        config.backend = Backend::from_str(&name).ok_or_else(|| ThingsError::Config {
            message: format!("unknown backend '{}', expected neo4j or concepts-api", name),
        })?;
    }
    if let Some(url) = cli.neo_url {
        config.neo_url = url;
    }
    if let Some(database) = cli.neo_database {
        config.neo_database = database;
    }
    if cli.neo_user.is_some() {
        config.neo_user = cli.neo_user;
    }
    if cli.neo_password.is_some() {
        config.neo_password = cli.neo_password;
    }
    if let Some(url) = cli.concepts_api_url {
        config.concepts_api_url = url;
    }
    if let Some(env) = cli.env {
        config.env = env;
    }
    if let Some(secs) = cli.cache_max_age {
        config.cache_max_age_secs = secs;
    } else if let Some(duration) = cli.cache_duration {
        config.cache_max_age_secs = parse_duration_secs(&duration)?;
    }
    if let Some(secs) = cli.request_timeout {
        config.request_timeout_secs = secs;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = match format.as_str() {
            "json" => LogFormat::Json,
            "text" => LogFormat::Text,
            other => {
                return Err(ThingsError::Config {
                    message: format!("unknown log format '{}', expected json or text", other),
                })
            }
        };
    }
    Ok(config)
}

fn build_source(config: &ThingsConfig) -> Arc<dyn ConceptSource> {
    match config.backend {
        Backend::Neo4j => {
            let conn = HttpGraphConnection::new(
                &config.neo_url,
                &config.neo_database,
                config.neo_credentials(),
                config.request_timeout(),
            );
            Arc::new(CypherDriver::new(conn, config.env.clone()))
        }
        Backend::ConceptsApi => Arc::new(ConceptsApiClient::new(
            &config.concepts_api_url,
            config.env.clone(),
            config.request_timeout(),
        )),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
}
