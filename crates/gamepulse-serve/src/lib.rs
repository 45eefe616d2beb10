//! Gamepulse Serve - caching proxy for the RAWG and Twitch APIs
//!
//! This crate serves the dashboard backend: it forwards a fixed set of read
//! endpoints to RAWG (game catalog) and Twitch Helix (live streams), caching
//! every response for an endpoint-specific TTL so repeated dashboard loads
//! do not spend upstream quota.
//!
//! # Authentication
//!
//! The proxied `/api/*` endpoints are public but rate limited per client IP.
//! Users may sign in with Google under `/auth/*` to obtain session JWTs.
//!
//! # Architecture
//!
//! - **AppState**: Shared handles (configuration, HTTP client, cache, token broker)
//! - **Upstream**: RAWG and Helix producers that the cache runs on a miss
//! - **Routes**: Endpoint handlers grouped by domain

mod auth;
pub mod config;
mod error;
pub mod rate_limit;
mod routes;
pub mod session;
mod state;
pub mod upstream;

pub use self::auth::require_session;
pub use self::config::Config;
pub use self::error::ApiError;
pub use self::routes::router;
pub use self::state::AppState;
