//! Game endpoints backed by RAWG.

use axum::Json;
use axum::extract::{Path, Query, State};
use gamepulse_core::{key, ttl};
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;
use crate::upstream::{Rawg, SearchParams, is_resource_id};

/// `GET /api/games/trending`
///
/// Top rated games in the configured date range. Cached for 5 minutes.
pub async fn trending(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    const CONTEXT: &str = "Failed to fetch trending games";

    let rawg = Rawg::new(&state).map_err(ApiError::upstream(CONTEXT))?;

    let data = state
        .fetcher
        .fetch(key::TRENDING_GAMES, ttl::LISTS, || {
            rawg.trending(&state.config.trending_dates)
        })
        .await
        .map_err(ApiError::upstream(CONTEXT))?;

    Ok(Json(data))
}

/// `GET /api/games/search`
///
/// Cached for 10 minutes per distinct set of non-empty filters, independent
/// of parameter order.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, ApiError> {
    const CONTEXT: &str = "Failed to search games";

    let rawg = Rawg::new(&state).map_err(ApiError::upstream(CONTEXT))?;
    let cache_key = key::search(params.pairs());

    let data = state
        .fetcher
        .fetch(&cache_key, ttl::SEARCH, || rawg.search(&params))
        .await
        .map_err(ApiError::upstream(CONTEXT))?;

    Ok(Json(data))
}

/// `GET /api/games/{id}`
///
/// Accepts a RAWG id or slug. Cached for 1 hour.
pub async fn game_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    const CONTEXT: &str = "Failed to fetch game details";

    if !is_resource_id(&id) {
        tracing::debug!(id = %id, "rejected game id");
        return Err(ApiError::BadRequest("Invalid game id".to_string()));
    }

    let rawg = Rawg::new(&state).map_err(ApiError::upstream(CONTEXT))?;

    let data = state
        .fetcher
        .fetch(&key::game(&id), ttl::STABLE, || rawg.game(&id))
        .await
        .map_err(ApiError::upstream(CONTEXT))?;

    Ok(Json(data))
}
