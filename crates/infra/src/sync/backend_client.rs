//! HTTP client for the remote metrics backend
//!
//! Translates queued entry snapshots into REST calls against the backend
//! metrics API. Every call carries a bearer token and is wrapped in a
//! timeout. A 401 response triggers exactly one inline token refresh and
//! retry; a second 401 surfaces as an auth error so the operation stays
//! queued for a later drain.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bodylog_domain::constants::REQUEST_TIMEOUT_SECS;
use bodylog_domain::EntrySnapshot;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::auth::AccessTokenProvider;
use super::errors::SyncError;

/// Configuration for the backend client
#[derive(Debug, Clone)]
pub struct BackendClientConfig {
    /// Base URL for the metrics API (e.g. "https://api.bodylog.app/v1")
    pub base_url: String,
    /// Timeout for API requests
    pub timeout: Duration,
}

impl Default for BackendClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.bodylog.app/v1".to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Interface for delivering entry mutations to the remote backend.
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Create the entry remotely, returning the backend-assigned id
    async fn create_entry(&self, snapshot: &EntrySnapshot) -> Result<String, SyncError>;

    /// Replace the remote entry's value and date
    async fn update_entry(&self, snapshot: &EntrySnapshot) -> Result<(), SyncError>;

    /// Delete the remote entry
    async fn delete_entry(&self, snapshot: &EntrySnapshot) -> Result<(), SyncError>;
}

/// HTTP backend client for the metrics API.
pub struct BackendClient {
    http: reqwest::Client,
    config: BackendClientConfig,
    auth: Arc<dyn AccessTokenProvider>,
}

#[derive(Debug, Clone, Serialize)]
struct EntryPayload {
    client_id: String,
    kind: String,
    recorded_at: String,
    value: f64,
    source: String,
}

impl EntryPayload {
    fn from_snapshot(snapshot: &EntrySnapshot) -> Self {
        Self {
            client_id: snapshot.entry_id.to_string(),
            kind: snapshot.kind.as_str().to_string(),
            recorded_at: snapshot.date.to_rfc3339(),
            value: snapshot.value,
            source: snapshot.source.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct CreateEntryResponse {
    id: String,
}

impl BackendClient {
    /// Create a new backend client.
    pub fn new(
        config: BackendClientConfig,
        auth: Arc<dyn AccessTokenProvider>,
    ) -> Result<Self, SyncError> {
        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(SyncError::Config(format!("invalid base url: {}", config.base_url)));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SyncError::Config(format!("failed to build http client: {e}")))?;

        Ok(Self { http, config, auth })
    }

    fn metrics_url(&self) -> String {
        format!("{}/metrics", self.config.base_url.trim_end_matches('/'))
    }

    fn entry_url(&self, remote_id: &str) -> String {
        format!("{}/{}", self.metrics_url(), remote_id)
    }

    /// Send a request built by `build`, refreshing the token once on 401.
    async fn send_authorized<F>(&self, build: F) -> Result<Response, SyncError>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let token = self.auth.access_token().await?;
        let response = self.execute(build(&token)).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!("backend returned 401, attempting token refresh");
        let token = self.auth.refresh().await?;
        let response = self.execute(build(&token)).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(SyncError::Auth("still unauthorized after token refresh".into()));
        }
        Ok(response)
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response, SyncError> {
        tokio::time::timeout(self.config.timeout, builder.send())
            .await
            .map_err(|_| SyncError::Timeout(self.config.timeout))?
            .map_err(|e| SyncError::Network(e.to_string()))
    }

    fn check_status(response: &Response) -> Result<(), SyncError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SyncError::RateLimit(format!("backend returned {status}")));
        }
        if status.is_server_error() {
            return Err(SyncError::Server(format!("backend returned {status}")));
        }
        Err(SyncError::Client(format!("backend returned {status}")))
    }
}

#[async_trait]
impl BackendApi for BackendClient {
    async fn create_entry(&self, snapshot: &EntrySnapshot) -> Result<String, SyncError> {
        let url = self.metrics_url();
        let payload = EntryPayload::from_snapshot(snapshot);

        debug!(url = %url, kind = %snapshot.kind, "creating backend entry");

        let response = self
            .send_authorized(|token| self.http.post(&url).bearer_auth(token).json(&payload))
            .await?;
        Self::check_status(&response)?;

        let created: CreateEntryResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Client(format!("malformed create response: {e}")))?;

        debug!(backend_id = %created.id, "backend entry created");
        Ok(created.id)
    }

    async fn update_entry(&self, snapshot: &EntrySnapshot) -> Result<(), SyncError> {
        let url = self.entry_url(&snapshot.remote_id());
        let payload = EntryPayload::from_snapshot(snapshot);

        debug!(url = %url, kind = %snapshot.kind, "updating backend entry");

        let response = self
            .send_authorized(|token| self.http.put(&url).bearer_auth(token).json(&payload))
            .await?;
        Self::check_status(&response)
    }

    async fn delete_entry(&self, snapshot: &EntrySnapshot) -> Result<(), SyncError> {
        let url = self.entry_url(&snapshot.remote_id());

        debug!(url = %url, kind = %snapshot.kind, "deleting backend entry");

        let response =
            self.send_authorized(|token| self.http.delete(&url).bearer_auth(token)).await?;

        // The entry being gone is the desired end state.
        if response.status() == StatusCode::NOT_FOUND {
            warn!(url = %url, "backend entry already deleted");
            return Ok(());
        }
        Self::check_status(&response)
    }
}
