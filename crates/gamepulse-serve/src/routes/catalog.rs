//! Reference lists (genres, platforms). Cached for 1 hour.

use axum::Json;
use axum::extract::State;
use gamepulse_core::{key, ttl};
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;
use crate::upstream::Rawg;

/// `GET /api/genres`
pub async fn genres(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    const CONTEXT: &str = "Failed to fetch genres";

    let rawg = Rawg::new(&state).map_err(ApiError::upstream(CONTEXT))?;
    let data = state
        .fetcher
        .fetch(key::GENRES_LIST, ttl::STABLE, || rawg.genres::<Value>())
        .await
        .map_err(ApiError::upstream(CONTEXT))?;

    Ok(Json(data))
}

/// `GET /api/platforms`
pub async fn platforms(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    const CONTEXT: &str = "Failed to fetch platforms";

    let rawg = Rawg::new(&state).map_err(ApiError::upstream(CONTEXT))?;
    let data = state
        .fetcher
        .fetch(key::PLATFORMS_LIST, ttl::STABLE, || rawg.platforms::<Value>())
        .await
        .map_err(ApiError::upstream(CONTEXT))?;

    Ok(Json(data))
}
