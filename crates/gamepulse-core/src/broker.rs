//! OAuth client-credentials token acquisition and renewal.
//!
//! [`CredentialBroker::get_token`] returns a cached bearer token while it is
//! still valid for at least the safety margin, and asks its [`TokenSource`]
//! for a new one otherwise. No lock is held across the upstream call, so
//! concurrent callers that both find the token expired each request a new
//! one; the later write wins.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use tokio::time::Instant;

use crate::error::{Error, Result, UpstreamFailure};
use crate::request::UpstreamRequest;

/// Time subtracted from the upstream-reported lifetime before a token is
/// considered expired.
pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::from_secs(60);

/// Token as reported by the identity endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuedToken {
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
}

/// Something that can mint a fresh bearer token.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn request_token(&self) -> std::result::Result<IssuedToken, UpstreamFailure>;
}

/// Client-credentials grant against an OAuth token endpoint.
///
/// Twitch expects the credentials as query parameters on a `POST`.
pub struct ClientCredentials {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl ClientCredentials {
    pub fn new(
        http: reqwest::Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

#[async_trait]
impl TokenSource for ClientCredentials {
    async fn request_token(&self) -> std::result::Result<IssuedToken, UpstreamFailure> {
        UpstreamRequest::post(&self.token_url)
            .query("client_id", &self.client_id)
            .query("client_secret", &self.client_secret)
            .query("grant_type", "client_credentials")
            .send_json(&self.http)
            .await
    }
}

#[derive(Debug, Clone)]
struct CredentialToken {
    token: String,
    expires_at: Instant,
}

/// Caches one bearer token and refreshes it shortly before it expires.
pub struct CredentialBroker {
    source: Arc<dyn TokenSource>,
    safety_margin: Duration,
    current: RwLock<Option<CredentialToken>>,
}

impl CredentialBroker {
    pub fn new(source: impl TokenSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
            safety_margin: DEFAULT_SAFETY_MARGIN,
            current: RwLock::new(None),
        }
    }

    pub fn with_safety_margin(mut self, margin: Duration) -> Self {
        self.safety_margin = margin;
        self
    }

    /// The cached token, if it has not reached its recorded expiry.
    pub fn cached(&self) -> Option<String> {
        self.current
            .read()
            .as_ref()
            .filter(|t| Instant::now() < t.expires_at)
            .map(|t| t.token.clone())
    }

    /// Return a valid bearer token, requesting a new one if needed.
    ///
    /// On failure the previously stored token (if any) is left in place and
    /// nothing is retried; the next call tries the upstream again.
    pub async fn get_token(&self) -> Result<String> {
        if let Some(token) = self.cached() {
            return Ok(token);
        }

        tracing::debug!("no valid credential cached, requesting a new one");

        let issued = self.source.request_token().await.map_err(|failure| {
            metrics::counter!("credential_refresh_errors_total").increment(1);
            tracing::error!(error = %failure, "credential request failed");
            Error::UpstreamAuth(failure)
        })?;

        if issued.access_token.is_empty() {
            metrics::counter!("credential_refresh_errors_total").increment(1);
            return Err(Error::UpstreamAuth(UpstreamFailure::transport(
                "identity endpoint returned an empty access token",
            )));
        }

        let lifetime = Duration::from_secs(issued.expires_in);
        let expires_at = Instant::now() + lifetime.saturating_sub(self.safety_margin);

        *self.current.write() = Some(CredentialToken {
            token: issued.access_token.clone(),
            expires_at,
        });

        metrics::counter!("credential_refreshes_total").increment(1);
        tracing::info!(lifetime_secs = issued.expires_in, "obtained new upstream credential");

        Ok(issued.access_token)
    }
}
