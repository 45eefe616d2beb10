//! Session tokens and Google sign-in verification.
//!
//! Users sign in with a Google ID token. Once verified, the server issues
//! its own pair of HS256 JWTs: a short-lived access token and a long-lived
//! refresh token, each signed with its own secret.

use std::time::Duration;

use gamepulse_core::UpstreamRequest;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::ApiError;

/// Claims carried by session tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub user_id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Issued at (Unix seconds).
    pub iat: u64,
    /// Expiry (Unix seconds).
    pub exp: u64,
}

/// Access/refresh token pair returned after sign-in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Issues and verifies session JWTs.
pub struct SessionIssuer {
    access: Keys,
    refresh: Keys,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl SessionIssuer {
    pub fn new(config: &Config) -> Self {
        Self {
            access: Keys::new(&config.jwt_secret),
            refresh: Keys::new(&config.refresh_token_secret),
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
        }
    }

    /// Issue an access/refresh pair for a verified user.
    pub fn issue(&self, user: &GoogleUser) -> Result<TokenPair, ApiError> {
        let access_token = sign(
            &self.access,
            user.user_id.clone(),
            user.email.clone(),
            user.name.clone(),
            self.access_ttl,
        )?;
        let refresh_token = sign(
            &self.refresh,
            user.user_id.clone(),
            user.email.clone(),
            None,
            self.refresh_ttl,
        )?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Verify an access token.
    pub fn verify_access(&self, token: &str) -> Result<SessionClaims, ApiError> {
        verify(&self.access, token).map_err(|e| {
            tracing::debug!(error = %e, "access token rejected");
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })
    }

    /// Exchange a refresh token for a new access token.
    pub fn refresh(&self, refresh_token: &str) -> Result<String, ApiError> {
        let claims = verify(&self.refresh, refresh_token).map_err(|e| {
            tracing::debug!(error = %e, "refresh token rejected");
            ApiError::Unauthorized("Invalid refresh token".to_string())
        })?;

        sign(&self.access, claims.user_id, claims.email, None, self.access_ttl)
    }
}

fn sign(
    keys: &Keys,
    user_id: String,
    email: String,
    name: Option<String>,
    ttl: Duration,
) -> Result<String, ApiError> {
    let iat = chrono::Utc::now().timestamp().max(0) as u64;
    let claims = SessionClaims {
        user_id,
        email,
        name,
        iat,
        exp: iat + ttl.as_secs(),
    };

    jsonwebtoken::encode(&Header::default(), &claims, &keys.encoding)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed to sign session token: {e}")))
}

fn verify(keys: &Keys, token: &str) -> jsonwebtoken::errors::Result<SessionClaims> {
    jsonwebtoken::decode::<SessionClaims>(token, &keys.decoding, &Validation::default())
        .map(|data| data.claims)
}

/// Identity asserted by a verified Google ID token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoogleUser {
    #[serde(rename = "id")]
    pub user_id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    #[serde(skip)]
    pub email_verified: bool,
}

/// Subset of Google's `tokeninfo` response.
#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
    /// Sent as the string "true"/"false".
    #[serde(default)]
    email_verified: Option<serde_json::Value>,
}

/// Verifies Google ID tokens against the `tokeninfo` endpoint.
pub struct GoogleVerifier {
    http: reqwest::Client,
    tokeninfo_url: String,
    client_id: Option<String>,
}

impl GoogleVerifier {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        let client_id = config.google_client_id().ok().map(str::to_string);
        if client_id.is_none() {
            tracing::warn!("GOOGLE_CLIENT_ID is not configured, Google sign-in will not work");
        }

        Self {
            http,
            tokeninfo_url: config.google_tokeninfo_url.clone(),
            client_id,
        }
    }

    /// Verify an ID token and return the identity it asserts.
    pub async fn verify(&self, id_token: &str) -> Result<GoogleUser, ApiError> {
        let client_id = self.client_id.as_deref().ok_or_else(|| {
            ApiError::Unauthorized(
                "Google Auth not initialized. Please configure GOOGLE_CLIENT_ID".to_string(),
            )
        })?;

        let invalid = || ApiError::Unauthorized("Invalid Google token".to_string());

        let info: TokenInfo = UpstreamRequest::get(&self.tokeninfo_url)
            .query("id_token", id_token)
            .send_json(&self.http)
            .await
            .map_err(|failure| {
                tracing::warn!(error = %failure, "Google token verification failed");
                invalid()
            })?;

        if info.aud != client_id {
            tracing::warn!(aud = %info.aud, "Google token issued for another audience");
            return Err(invalid());
        }

        let email = info.email.ok_or_else(invalid)?;
        let email_verified = match info.email_verified {
            Some(serde_json::Value::Bool(b)) => b,
            Some(serde_json::Value::String(s)) => s == "true",
            _ => false,
        };

        Ok(GoogleUser {
            user_id: info.sub,
            email,
            name: info.name,
            picture: info.picture,
            email_verified,
        })
    }
}
