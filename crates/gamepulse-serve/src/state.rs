//! Application state shared across all request handlers.

use std::sync::Arc;

use gamepulse_core::{CachedFetcher, ClientCredentials, CredentialBroker};

use crate::config::Config;
use crate::rate_limit::ClientRateLimiter;
use crate::session::{GoogleVerifier, SessionIssuer};

/// Shared application state available to all request handlers.
///
/// Built once at startup; every handle is shared by all clones.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,

    /// HTTP client for all upstream calls.
    pub http: reqwest::Client,

    /// Response cache in front of the upstream APIs.
    pub fetcher: CachedFetcher,

    /// Twitch app access token broker.
    pub broker: Arc<CredentialBroker>,

    /// Session JWT issuer/verifier.
    pub sessions: Arc<SessionIssuer>,

    /// Google ID token verifier.
    pub google: Arc<GoogleVerifier>,

    /// Per-client limiter for `/api/*`.
    pub limiter: Arc<ClientRateLimiter>,
}

impl AppState {
    /// Create a new application state from configuration.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .user_agent(concat!("gamepulse/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let (client_id, client_secret) = config.twitch_credentials().unwrap_or_default();
        let broker = CredentialBroker::new(ClientCredentials::new(
            http.clone(),
            config.twitch_token_url.clone(),
            client_id,
            client_secret,
        ));

        let fetcher = CachedFetcher::new(config.cache_capacity);
        let sessions = SessionIssuer::new(&config);
        let google = GoogleVerifier::new(http.clone(), &config);
        let limiter = ClientRateLimiter::new(config.rate_limit_max, config.rate_limit_window);

        tracing::info!(
            cache_capacity = config.cache_capacity,
            upstream_timeout_secs = config.upstream_timeout.as_secs(),
            "application state initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            http,
            fetcher,
            broker: Arc::new(broker),
            sessions: Arc::new(sessions),
            google: Arc::new(google),
            limiter: Arc::new(limiter),
        })
    }
}
