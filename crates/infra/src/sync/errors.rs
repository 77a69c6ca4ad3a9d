//! Sync-specific error types
//!
//! Provides error classification for sync operations with retry metadata.

use bodylog_domain::BodylogError;
use thiserror::Error;

/// Categories of sync errors for retry logic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncErrorCategory {
    /// Authentication errors (401, 403) - retry after token refresh
    Authentication,
    /// Rate limiting errors (429) - retry with backoff
    RateLimit,
    /// Server errors (5xx) - retryable
    Server,
    /// Client errors (4xx except auth) - non-retryable
    Client,
    /// Network/connection errors - retryable
    Network,
    /// Database errors - may be retryable
    Database,
    /// Configuration errors - non-retryable
    Config,
}

/// Sync operation errors
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout after {0:?}")]
    Timeout(std::time::Duration),
}

impl SyncError {
    /// Get the error category for this error
    pub fn category(&self) -> SyncErrorCategory {
        match self {
            Self::Auth(_) => SyncErrorCategory::Authentication,
            Self::RateLimit(_) => SyncErrorCategory::RateLimit,
            Self::Server(_) => SyncErrorCategory::Server,
            Self::Client(_) => SyncErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => SyncErrorCategory::Network,
            Self::Database(_) => SyncErrorCategory::Database,
            Self::Config(_) => SyncErrorCategory::Config,
        }
    }

    /// Check if this error should be retried
    pub fn should_retry(&self) -> bool {
        matches!(
            self.category(),
            SyncErrorCategory::Authentication
                | SyncErrorCategory::RateLimit
                | SyncErrorCategory::Server
                | SyncErrorCategory::Network
                | SyncErrorCategory::Database
        )
    }
}

impl From<BodylogError> for SyncError {
    fn from(err: BodylogError) -> Self {
        match err {
            BodylogError::Transport(message) => Self::Network(message),
            BodylogError::AuthExpired(message) => Self::Auth(message),
            BodylogError::MalformedResponse(message) | BodylogError::RemoteRejected(message) => {
                Self::Client(message)
            }
            BodylogError::Persistence(message) => Self::Database(message),
            BodylogError::Config(message) | BodylogError::InvalidEndpoint(message) => {
                Self::Config(message)
            }
            BodylogError::NotFound(message) | BodylogError::InvalidInput(message) => {
                Self::Client(message)
            }
            BodylogError::Internal(message) => Self::Server(message),
        }
    }
}

impl From<SyncError> for BodylogError {
    fn from(err: SyncError) -> Self {
        match &err {
            SyncError::Auth(message) => BodylogError::AuthExpired(message.clone()),
            SyncError::Client(message) => BodylogError::RemoteRejected(message.clone()),
            SyncError::Database(message) => BodylogError::Persistence(message.clone()),
            SyncError::Config(message) => BodylogError::Config(message.clone()),
            SyncError::RateLimit(_)
            | SyncError::Server(_)
            | SyncError::Network(_)
            | SyncError::Timeout(_) => BodylogError::Transport(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_categories() {
        assert_eq!(SyncError::Auth("test".into()).category(), SyncErrorCategory::Authentication);
        assert_eq!(SyncError::RateLimit("test".into()).category(), SyncErrorCategory::RateLimit);
        assert_eq!(SyncError::Server("test".into()).category(), SyncErrorCategory::Server);
        assert_eq!(SyncError::Network("test".into()).category(), SyncErrorCategory::Network);
        assert_eq!(
            SyncError::Timeout(std::time::Duration::from_secs(8)).category(),
            SyncErrorCategory::Network
        );
    }

    #[test]
    fn should_retry_matches_category() {
        assert!(SyncError::Auth("test".into()).should_retry());
        assert!(SyncError::RateLimit("test".into()).should_retry());
        assert!(SyncError::Server("test".into()).should_retry());
        assert!(SyncError::Network("test".into()).should_retry());
        assert!(!SyncError::Client("test".into()).should_retry());
        assert!(!SyncError::Config("test".into()).should_retry());
    }

    #[test]
    fn domain_errors_map_to_categories() {
        let err: SyncError = BodylogError::Transport("offline".into()).into();
        assert_eq!(err.category(), SyncErrorCategory::Network);

        let err: SyncError = BodylogError::RemoteRejected("bad payload".into()).into();
        assert_eq!(err.category(), SyncErrorCategory::Client);
    }
}
