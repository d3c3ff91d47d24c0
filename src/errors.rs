use thiserror::Error;

/// Errors that can occur while resolving things.
///
/// Not-found is never an error: lookups return `Ok(None)` for absent,
/// excluded, or unmappable concepts.
#[derive(Error, Debug)]
pub enum ThingsError {
    #[error("{message}")]
    Validation { message: String },

    #[error("upstream error: {message} (operation: {operation})")]
    Upstream { message: String, operation: String },

    #[error("Multiple Things found with the same UUID:{uuid} !")]
    DuplicateIdentifier { uuid: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http error: {0}")]
    Http(#[from] ureq::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl ThingsError {
    /// Whether a node was reached before the error surfaced.
    ///
    /// Only true for duplicate identifiers, which signal an inconsistent
    /// graph rather than a missing or unreachable one.
    pub fn found(&self) -> bool {
        matches!(self, Self::DuplicateIdentifier { .. })
    }

    pub(crate) fn upstream(operation: &str, message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
            operation: operation.to_string(),
        }
    }
}

/// Convenience alias for results using `ThingsError`.
pub type Result<T> = std::result::Result<T, ThingsError>;
