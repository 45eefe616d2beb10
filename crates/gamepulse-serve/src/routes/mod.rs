//! API route definitions.

mod auth;
mod catalog;
mod games;
mod health;
mod stats;
mod twitch;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};

use crate::auth::require_session;
use crate::rate_limit::limit_by_client;
use crate::state::AppState;

/// Build the complete API router.
///
/// # Route Structure
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Proxied (rate limited per client IP)
///
/// ### Games (RAWG)
/// - `GET /api/games/trending` - Top rated recent games
/// - `GET /api/games/search` - Search with `q`, `genres`, `platforms`, `rating`, `released`
/// - `GET /api/games/{id}` - Game detail
///
/// ### Catalog and analytics (RAWG)
/// - `GET /api/genres` - Genre list
/// - `GET /api/platforms` - Platform list
/// - `GET /api/genres/stats` - Games per genre in the top rated sample
/// - `GET /api/platforms/stats` - Games per platform in the top rated sample
///
/// ### Streams (Twitch Helix)
/// - `GET /api/twitch/streams/top` - Top live streams
/// - `GET /api/twitch/streams/game/{id}` - Live streams for one game
///
/// ## Sessions
/// - `POST /auth/google` - Exchange a Google ID token for session tokens
/// - `POST /auth/refresh` - Exchange a refresh token for an access token
/// - `GET /auth/verify` - Current session (access token required)
/// - `POST /auth/logout` - End session (access token required)
pub fn router(state: AppState) -> Router {
    // Public routes
    let public = Router::new().route("/health", get(health::health_check));

    let api = Router::new()
        // Games
        .route("/games/trending", get(games::trending))
        .route("/games/search", get(games::search))
        .route("/games/{id}", get(games::game_detail))
        // Catalog
        .route("/genres", get(catalog::genres))
        .route("/platforms", get(catalog::platforms))
        // Analytics
        .route("/genres/stats", get(stats::genre_stats))
        .route("/platforms/stats", get(stats::platform_stats))
        // Streams
        .route("/twitch/streams/top", get(twitch::top_streams))
        .route("/twitch/streams/game/{id}", get(twitch::game_streams))
        .layer(middleware::from_fn_with_state(state.clone(), limit_by_client));

    let session = Router::new()
        .route("/verify", get(auth::verify))
        .route("/logout", post(auth::logout))
        .layer(middleware::from_fn_with_state(state.clone(), require_session));

    let auth = Router::new()
        .route("/google", post(auth::google))
        .route("/refresh", post(auth::refresh))
        .merge(session);

    Router::new()
        .merge(public)
        .nest("/api", api)
        .nest("/auth", auth)
        .with_state(state)
}
