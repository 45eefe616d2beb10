//! Session endpoints: Google sign-in, token refresh, verify and logout.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, State};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::session::{GoogleUser, SessionClaims};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct GoogleLogin {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    success: bool,
    user: GoogleUser,
    access_token: String,
    refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    success: bool,
    access_token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    success: bool,
    user: SessionClaims,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    success: bool,
    message: &'static str,
}

/// Non-empty value from an optional JSON body field.
fn required(body: Result<Option<String>, JsonRejection>, message: &str) -> Result<String, ApiError> {
    match body {
        Ok(Some(value)) if !value.trim().is_empty() => Ok(value),
        _ => Err(ApiError::BadRequest(message.to_string())),
    }
}

/// `POST /auth/google`
pub async fn google(
    State(state): State<AppState>,
    body: Result<Json<GoogleLogin>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let id_token = required(body.map(|Json(b)| b.token), "Google token is required")?;

    let user = state.google.verify(&id_token).await?;
    let pair = state.sessions.issue(&user)?;

    tracing::info!(email = %user.email, verified = user.email_verified, "user signed in");

    Ok(Json(LoginResponse {
        success: true,
        user,
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }))
}

/// `POST /auth/refresh`
pub async fn refresh(
    State(state): State<AppState>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let refresh_token = required(
        body.map(|Json(b)| b.refresh_token),
        "Refresh token is required",
    )?;

    let access_token = state.sessions.refresh(&refresh_token)?;

    Ok(Json(RefreshResponse {
        success: true,
        access_token,
    }))
}

/// `GET /auth/verify`
pub async fn verify(Extension(claims): Extension<SessionClaims>) -> Json<SessionResponse> {
    Json(SessionResponse {
        success: true,
        user: claims,
    })
}

/// `POST /auth/logout`
///
/// Tokens are stateless, so this only records the event; clients discard
/// their tokens.
pub async fn logout(Extension(claims): Extension<SessionClaims>) -> Json<LogoutResponse> {
    tracing::info!(email = %claims.email, "user logged out");

    Json(LogoutResponse {
        success: true,
        message: "Logged out successfully",
    })
}
