//! Live stream endpoints backed by Twitch Helix. Cached for 30 seconds.

use axum::Json;
use axum::extract::{Path, State};
use gamepulse_core::{key, ttl};
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;
use crate::upstream::Helix;

/// `GET /api/twitch/streams/top`
pub async fn top_streams(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    const CONTEXT: &str = "Failed to fetch Twitch streams";

    let helix = Helix::new(&state).map_err(ApiError::upstream(CONTEXT))?;

    // The broker is only consulted on a miss.
    let data = state
        .fetcher
        .fetch(key::TOP_STREAMS, ttl::LIVE, || helix.top_streams())
        .await
        .map_err(ApiError::upstream(CONTEXT))?;

    Ok(Json(data))
}

/// `GET /api/twitch/streams/game/{id}`
///
/// `id` is a Twitch category id, not a RAWG id.
pub async fn game_streams(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    const CONTEXT: &str = "Failed to fetch game streams";

    let helix = Helix::new(&state).map_err(ApiError::upstream(CONTEXT))?;

    let data = state
        .fetcher
        .fetch(&key::game_streams(&id), ttl::LIVE, || helix.game_streams(&id))
        .await
        .map_err(ApiError::upstream(CONTEXT))?;

    Ok(Json(data))
}
