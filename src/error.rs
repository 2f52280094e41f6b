//! Error types for vsrelay.

use std::time::Duration;
use thiserror::Error;

/// Reasons an incoming relay request cannot be served.
///
/// The display text is returned to the caller verbatim, so it only ever
/// names the offending field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing 'query'")]
    MissingQuery,

    #[error("Missing 'vector_store_id'")]
    MissingVectorStore,
}

/// Library-level error type for relay operations.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The provider answered with a failure or the call never completed.
    ///
    /// `message` may contain provider text and is only meant for logs.
    #[error("Upstream error: {message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    #[error("Upstream request timed out after {0:?}")]
    UpstreamTimeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl RelayError {
    /// Build an upstream error from a provider HTTP status.
    pub fn upstream_status(status: u16, message: impl Into<String>) -> Self {
        RelayError::Upstream {
            status: Some(status),
            message: message.into(),
        }
    }

    /// HTTP status used when this error reaches a client.
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::Validation(_) => 400,
            _ => 500,
        }
    }

    /// Generic, client-safe error message.
    pub fn client_message(&self) -> String {
        match self {
            RelayError::Validation(e) => e.to_string(),
            RelayError::Config(_) => "Server misconfigured".to_string(),
            _ => "Vector search failed".to_string(),
        }
    }

    /// Client-safe detail string. Never carries provider or transport text.
    pub fn client_detail(&self) -> Option<String> {
        match self {
            RelayError::Validation(_) => None,
            RelayError::Config(msg) => Some(msg.clone()),
            RelayError::Upstream {
                status: Some(status),
                ..
            } => Some(format!("upstream returned HTTP {}", status)),
            RelayError::Upstream { status: None, .. } => {
                Some("upstream request failed".to_string())
            }
            RelayError::UpstreamTimeout(after) => Some(format!(
                "upstream request timed out after {}s",
                after.as_secs()
            )),
            RelayError::Http(e) if e.is_timeout() => {
                Some("upstream request timed out".to_string())
            }
            RelayError::Http(_) => Some("upstream request failed".to_string()),
            RelayError::Json(_) => Some("upstream response was not valid JSON".to_string()),
            RelayError::Io(_) | RelayError::TomlParse(_) => Some("internal error".to_string()),
        }
    }
}

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages_name_the_field() {
        assert_eq!(ValidationError::MissingQuery.to_string(), "Missing 'query'");
        assert_eq!(
            ValidationError::MissingVectorStore.to_string(),
            "Missing 'vector_store_id'"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(RelayError::from(ValidationError::MissingQuery).status_code(), 400);
        assert_eq!(RelayError::Config("x".into()).status_code(), 500);
        assert_eq!(
            RelayError::UpstreamTimeout(Duration::from_secs(5)).status_code(),
            500
        );
    }

    #[test]
    fn test_upstream_detail_does_not_leak_message() {
        let err = RelayError::upstream_status(401, "Incorrect API key provided: sk-abc123");
        let detail = err.client_detail().unwrap();
        assert_eq!(detail, "upstream returned HTTP 401");
        assert!(!detail.contains("sk-"));
        assert_eq!(err.client_message(), "Vector search failed");
    }

    #[test]
    fn test_validation_has_no_detail() {
        let err = RelayError::from(ValidationError::MissingVectorStore);
        assert!(err.client_detail().is_none());
        assert_eq!(err.client_message(), "Missing 'vector_store_id'");
    }
}
