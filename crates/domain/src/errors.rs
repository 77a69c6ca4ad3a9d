//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Bodylog
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum BodylogError {
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Authentication expired: {0}")]
    AuthExpired(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Remote rejected request: {0}")]
    RemoteRejected(String),

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Bodylog operations
pub type Result<T> = std::result::Result<T, BodylogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_serialize_with_type_tag() {
        let err = BodylogError::Transport("connection refused".into());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "Transport");
        assert_eq!(json["message"], "connection refused");
    }

    #[test]
    fn display_includes_variant_context() {
        let err = BodylogError::Persistence("disk full".into());
        assert_eq!(err.to_string(), "Persistence failure: disk full");
    }
}
