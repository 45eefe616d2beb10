//! Bearer session authentication middleware.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::state::AppState;

/// Middleware that requires a valid session access token.
///
/// The token must be provided in the `Authorization` header as:
/// ```text
/// Authorization: Bearer <access token>
/// ```
///
/// On success the decoded [`SessionClaims`](crate::session::SessionClaims)
/// are attached to the request extensions for downstream handlers.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) if !token.trim().is_empty() => token.trim(),
        _ => {
            tracing::debug!("missing or malformed authorization header");
            return Err(ApiError::Unauthorized("Access token required".to_string()));
        }
    };

    let claims = state.sessions.verify_access(token)?;
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}
