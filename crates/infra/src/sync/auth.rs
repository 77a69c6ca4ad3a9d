//! Backend authentication with keychain-stored tokens
//!
//! Access and refresh tokens live in the OS keychain. When the backend
//! rejects a request with 401, the client asks this provider for one
//! refresh; a failed refresh surfaces as an auth error and the operation
//! stays queued.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::errors::SyncError;

const ACCESS_TOKEN_ACCOUNT: &str = "access_token";
const REFRESH_TOKEN_ACCOUNT: &str = "refresh_token";

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Get the current access token
    async fn access_token(&self) -> Result<String, SyncError>;

    /// Exchange the refresh token for a new access token and return it
    async fn refresh(&self) -> Result<String, SyncError>;
}

#[derive(Debug, Clone, Serialize)]
struct RefreshRequest {
    refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RefreshResponse {
    access_token: String,
    refresh_token: Option<String>,
}

/// Token provider backed by the OS keychain and the backend refresh
/// endpoint.
pub struct KeyringTokenProvider {
    service: String,
    refresh_url: String,
    http: reqwest::Client,
    timeout: Duration,
}

impl KeyringTokenProvider {
    /// Create a provider for the given keychain service name and backend
    /// base URL.
    pub fn new(service: &str, base_url: &str, timeout: Duration) -> Result<Arc<Self>, SyncError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Config(format!("failed to build http client: {e}")))?;

        Ok(Arc::new(Self {
            service: service.to_string(),
            refresh_url: format!("{}/auth/refresh", base_url.trim_end_matches('/')),
            http,
            timeout,
        }))
    }

    /// Store both tokens, e.g. after an interactive login.
    pub fn set_tokens(&self, access: &str, refresh: &str) -> Result<(), SyncError> {
        self.store_secret(ACCESS_TOKEN_ACCOUNT, access)?;
        self.store_secret(REFRESH_TOKEN_ACCOUNT, refresh)?;
        info!("backend tokens stored");
        Ok(())
    }

    /// Remove both tokens, e.g. on sign-out.
    pub fn clear_tokens(&self) -> Result<(), SyncError> {
        self.delete_secret(ACCESS_TOKEN_ACCOUNT)?;
        self.delete_secret(REFRESH_TOKEN_ACCOUNT)?;
        Ok(())
    }

    fn get_secret(&self, account: &str) -> Result<String, SyncError> {
        let entry = keyring::Entry::new(&self.service, account)
            .map_err(|e| SyncError::Config(format!("keychain unavailable: {e}")))?;
        entry.get_password().map_err(|e| SyncError::Auth(format!("no {account} in keychain: {e}")))
    }

    fn store_secret(&self, account: &str, value: &str) -> Result<(), SyncError> {
        let entry = keyring::Entry::new(&self.service, account)
            .map_err(|e| SyncError::Config(format!("keychain unavailable: {e}")))?;
        entry
            .set_password(value)
            .map_err(|e| SyncError::Config(format!("failed to store {account}: {e}")))
    }

    fn delete_secret(&self, account: &str) -> Result<(), SyncError> {
        let entry = keyring::Entry::new(&self.service, account)
            .map_err(|e| SyncError::Config(format!("keychain unavailable: {e}")))?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(SyncError::Config(format!("failed to delete {account}: {e}"))),
        }
    }
}

#[async_trait]
impl AccessTokenProvider for KeyringTokenProvider {
    async fn access_token(&self) -> Result<String, SyncError> {
        self.get_secret(ACCESS_TOKEN_ACCOUNT)
    }

    async fn refresh(&self) -> Result<String, SyncError> {
        let refresh_token = self.get_secret(REFRESH_TOKEN_ACCOUNT)?;

        debug!(url = %self.refresh_url, "refreshing access token");

        let request = self.http.post(&self.refresh_url).json(&RefreshRequest { refresh_token });

        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| SyncError::Timeout(self.timeout))?
            .map_err(|e| SyncError::Network(format!("refresh request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(SyncError::Auth(format!(
                "token refresh rejected with status {}",
                response.status()
            )));
        }

        let tokens: RefreshResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Client(format!("malformed refresh response: {e}")))?;

        self.store_secret(ACCESS_TOKEN_ACCOUNT, &tokens.access_token)?;
        if let Some(rotated) = &tokens.refresh_token {
            self.store_secret(REFRESH_TOKEN_ACCOUNT, rotated)?;
        }

        info!("access token refreshed");
        Ok(tokens.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockTokenProvider {
        token: String,
    }

    #[async_trait]
    impl AccessTokenProvider for MockTokenProvider {
        async fn access_token(&self) -> Result<String, SyncError> {
            Ok(self.token.clone())
        }

        async fn refresh(&self) -> Result<String, SyncError> {
            Ok(format!("{}-refreshed", self.token))
        }
    }

    #[tokio::test]
    async fn mock_token_provider_round_trip() {
        let provider = MockTokenProvider { token: "test-token".to_string() };

        assert_eq!(provider.access_token().await.unwrap(), "test-token");
        assert_eq!(provider.refresh().await.unwrap(), "test-token-refreshed");
    }
}
