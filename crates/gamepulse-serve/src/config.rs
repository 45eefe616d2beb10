//! Application configuration loaded from environment variables.

use std::time::Duration;

use gamepulse_core::Error;

/// Default signing secrets; accepted but warned about at startup.
const DEFAULT_JWT_SECRET: &str = "your_jwt_secret_key_change_this";
const DEFAULT_REFRESH_SECRET: &str = "your_refresh_token_secret_change_this";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:3001").
    pub bind_addr: String,

    /// RAWG API key. Validated per request, not at startup.
    pub rawg_api_key: Option<String>,
    /// RAWG API base URL.
    pub rawg_base_url: String,
    /// `dates` filter used for the trending list.
    pub trending_dates: String,

    /// Twitch application client id.
    pub twitch_client_id: Option<String>,
    /// Twitch application client secret.
    pub twitch_client_secret: Option<String>,
    /// Twitch Helix base URL.
    pub twitch_api_url: String,
    /// Twitch OAuth token endpoint.
    pub twitch_token_url: String,

    /// Google OAuth client id expected as the ID token audience.
    pub google_client_id: Option<String>,
    /// Google `tokeninfo` endpoint used to verify ID tokens.
    pub google_tokeninfo_url: String,

    /// Secret for signing access tokens.
    pub jwt_secret: String,
    /// Secret for signing refresh tokens.
    pub refresh_token_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,

    /// Requests allowed per client IP per window on `/api/*`.
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,

    /// Maximum number of cached upstream responses.
    pub cache_capacity: u64,
    /// Timeout applied to every upstream HTTP call.
    pub upstream_timeout: Duration,

    /// Port for the Prometheus `/metrics` listener (disabled when unset).
    pub metrics_port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3001".to_string(),
            rawg_api_key: None,
            rawg_base_url: "https://api.rawg.io/api".to_string(),
            trending_dates: "2020-01-01,2025-12-31".to_string(),
            twitch_client_id: None,
            twitch_client_secret: None,
            twitch_api_url: "https://api.twitch.tv/helix".to_string(),
            twitch_token_url: "https://id.twitch.tv/oauth2/token".to_string(),
            google_client_id: None,
            google_tokeninfo_url: "https://oauth2.googleapis.com/tokeninfo".to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            refresh_token_secret: DEFAULT_REFRESH_SECRET.to_string(),
            access_token_ttl: Duration::from_secs(15 * 60),
            refresh_token_ttl: Duration::from_secs(7 * 24 * 3600),
            rate_limit_max: 100,
            rate_limit_window: Duration::from_secs(15 * 60),
            cache_capacity: gamepulse_core::cache::DEFAULT_CACHE_CAPACITY,
            upstream_timeout: Duration::from_secs(10),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Nothing is required at startup; endpoints whose upstream secrets are
    /// missing answer 503 instead.
    ///
    /// - `BIND_ADDR` (default: `0.0.0.0:$PORT`, `PORT` default 3001)
    /// - `RAWG_API_KEY`, `RAWG_BASE_URL`, `TRENDING_DATES`
    /// - `TWITCH_CLIENT_ID`, `TWITCH_CLIENT_SECRET`, `TWITCH_API_URL`, `TWITCH_TOKEN_URL`
    /// - `GOOGLE_CLIENT_ID`, `GOOGLE_TOKENINFO_URL`
    /// - `JWT_SECRET`, `REFRESH_TOKEN_SECRET`, `ACCESS_TOKEN_EXPIRY`, `REFRESH_TOKEN_EXPIRY`
    /// - `RATE_LIMIT_MAX`, `RATE_LIMIT_WINDOW_SECS`
    /// - `CACHE_CAPACITY`, `UPSTREAM_TIMEOUT_SECS`, `METRICS_PORT`
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = match env("BIND_ADDR") {
            Some(addr) => addr,
            None => format!("0.0.0.0:{}", env("PORT").as_deref().unwrap_or("3001")),
        };

        let access_token_ttl = match env("ACCESS_TOKEN_EXPIRY") {
            Some(raw) => parse_expiry(&raw)?,
            None => defaults.access_token_ttl,
        };
        let refresh_token_ttl = match env("REFRESH_TOKEN_EXPIRY") {
            Some(raw) => parse_expiry(&raw)?,
            None => defaults.refresh_token_ttl,
        };

        let rate_limit_max = parse_env("RATE_LIMIT_MAX")?.unwrap_or(defaults.rate_limit_max);
        if rate_limit_max == 0 {
            anyhow::bail!("RATE_LIMIT_MAX must be greater than zero");
        }
        let rate_limit_window = parse_env("RATE_LIMIT_WINDOW_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.rate_limit_window);
        if rate_limit_window.is_zero() {
            anyhow::bail!("RATE_LIMIT_WINDOW_SECS must be greater than zero");
        }

        let config = Self {
            bind_addr,
            rawg_api_key: env("RAWG_API_KEY"),
            rawg_base_url: env_url("RAWG_BASE_URL").unwrap_or(defaults.rawg_base_url),
            trending_dates: env("TRENDING_DATES").unwrap_or(defaults.trending_dates),
            twitch_client_id: env("TWITCH_CLIENT_ID"),
            twitch_client_secret: env("TWITCH_CLIENT_SECRET"),
            twitch_api_url: env_url("TWITCH_API_URL").unwrap_or(defaults.twitch_api_url),
            twitch_token_url: env_url("TWITCH_TOKEN_URL").unwrap_or(defaults.twitch_token_url),
            google_client_id: env("GOOGLE_CLIENT_ID"),
            google_tokeninfo_url: env_url("GOOGLE_TOKENINFO_URL")
                .unwrap_or(defaults.google_tokeninfo_url),
            jwt_secret: env("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            refresh_token_secret: env("REFRESH_TOKEN_SECRET")
                .unwrap_or(defaults.refresh_token_secret),
            access_token_ttl,
            refresh_token_ttl,
            rate_limit_max,
            rate_limit_window,
            cache_capacity: parse_env("CACHE_CAPACITY")?.unwrap_or(defaults.cache_capacity),
            upstream_timeout: parse_env("UPSTREAM_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.upstream_timeout),
            metrics_port: parse_env("METRICS_PORT")?,
        };

        tracing::info!(
            bind_addr = %config.bind_addr,
            rawg_api_key = status(config.rawg_api_key()),
            twitch_credentials = status(config.twitch_credentials()),
            google_auth = status(config.google_client_id()),
            rate_limit_max = config.rate_limit_max,
            rate_limit_window_secs = config.rate_limit_window.as_secs(),
            cache_capacity = config.cache_capacity,
            "configuration loaded"
        );

        if is_placeholder(&config.jwt_secret) || is_placeholder(&config.refresh_token_secret) {
            tracing::warn!("JWT signing secrets are set to placeholder values");
        }

        Ok(config)
    }

    /// RAWG API key, if configured.
    pub fn rawg_api_key(&self) -> Result<&str, Error> {
        require(self.rawg_api_key.as_deref(), "RAWG API key not configured")
    }

    /// Twitch client id and secret, if both are configured.
    pub fn twitch_credentials(&self) -> Result<(&str, &str), Error> {
        const MISSING: &str = "Twitch credentials not configured";
        let id = require(self.twitch_client_id.as_deref(), MISSING)?;
        let secret = require(self.twitch_client_secret.as_deref(), MISSING)?;
        Ok((id, secret))
    }

    /// Google OAuth client id, if configured.
    pub fn google_client_id(&self) -> Result<&str, Error> {
        require(
            self.google_client_id.as_deref(),
            "Google Auth not initialized. Please configure GOOGLE_CLIENT_ID",
        )
    }
}

/// Whether a secret is still set to an example value.
pub fn is_placeholder(value: &str) -> bool {
    let lower = value.trim().to_ascii_lowercase();
    lower.is_empty()
        || lower.starts_with("your_")
        || lower.starts_with("your-")
        || lower.ends_with("_here")
        || lower.contains("change_this")
        || lower == "changeme"
        || lower == "placeholder"
}

fn require<'a>(value: Option<&'a str>, missing: &str) -> Result<&'a str, Error> {
    match value.map(str::trim) {
        Some(v) if !is_placeholder(v) => Ok(v),
        _ => Err(Error::Configuration(missing.to_string())),
    }
}

fn status<T>(check: Result<T, Error>) -> &'static str {
    if check.is_ok() { "configured" } else { "missing" }
}

/// Parse a token lifetime such as `15m`, `7d`, `12h`, `30s` or `3600`.
pub fn parse_expiry(raw: &str) -> anyhow::Result<Duration> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        Some((idx, _)) => raw.split_at(idx),
        None => (raw, "s"),
    };

    let value: u64 = digits
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid duration '{raw}'"))?;

    let multiplier = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86_400,
        other => anyhow::bail!("invalid duration unit '{other}' in '{raw}'"),
    };

    if value == 0 {
        anyhow::bail!("duration '{raw}' must be greater than zero");
    }

    Ok(Duration::from_secs(value * multiplier))
}

fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_url(key: &str) -> Option<String> {
    env(key).map(|v| v.trim_end_matches('/').to_string())
}

fn parse_env<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| anyhow::anyhow!("invalid {key} '{raw}': {e}"))
        })
        .transpose()
}
