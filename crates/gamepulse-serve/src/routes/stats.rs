//! Distribution of genres and platforms across the top rated games.
//!
//! Counts are taken from a single page of the 100 highest rated games, not
//! the full catalog.

use axum::Json;
use axum::extract::State;
use gamepulse_core::{Error, key, ttl};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;
use crate::upstream::{DistributionEntry, Page, Rawg, distribution};

#[derive(Debug, Serialize, Deserialize)]
pub struct GenreStats {
    pub genres: Vec<Value>,
    pub distribution: Vec<DistributionEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlatformStats {
    pub platforms: Vec<Value>,
    pub distribution: Vec<DistributionEntry>,
}

/// `GET /api/genres/stats`
pub async fn genre_stats(State(state): State<AppState>) -> Result<Json<GenreStats>, ApiError> {
    const CONTEXT: &str = "Failed to fetch genre statistics";

    let rawg = Rawg::new(&state).map_err(ApiError::upstream(CONTEXT))?;

    let stats = state
        .fetcher
        .fetch(key::GENRES_STATS, ttl::AGGREGATES, || async {
            let (genres, sample) =
                tokio::try_join!(rawg.genres::<Page<Value>>(), rawg.top_rated_sample())?;

            let tags = sample
                .results
                .into_iter()
                .flat_map(|game| game.genres.unwrap_or_default());

            Ok::<_, Error>(GenreStats {
                genres: genres.results,
                distribution: distribution(tags),
            })
        })
        .await
        .map_err(ApiError::upstream(CONTEXT))?;

    Ok(Json(stats))
}

/// `GET /api/platforms/stats`
pub async fn platform_stats(
    State(state): State<AppState>,
) -> Result<Json<PlatformStats>, ApiError> {
    const CONTEXT: &str = "Failed to fetch platform statistics";

    let rawg = Rawg::new(&state).map_err(ApiError::upstream(CONTEXT))?;

    let stats = state
        .fetcher
        .fetch(key::PLATFORMS_STATS, ttl::AGGREGATES, || async {
            let (platforms, sample) =
                tokio::try_join!(rawg.platforms::<Page<Value>>(), rawg.top_rated_sample())?;

            let tags = sample
                .results
                .into_iter()
                .flat_map(|game| game.platforms.unwrap_or_default())
                .map(|slot| slot.platform);

            Ok::<_, Error>(PlatformStats {
                platforms: platforms.results,
                distribution: distribution(tags),
            })
        })
        .await
        .map_err(ApiError::upstream(CONTEXT))?;

    Ok(Json(stats))
}
