//! Cache key derivation.
//!
//! Keys must be stable per logical query: two requests with the same
//! effective parameters map to the same key regardless of the order the
//! parameters arrived in.

use std::collections::BTreeMap;

/// Canonical serialization of query parameters.
///
/// Values are trimmed and empty ones dropped, matching what is forwarded
/// upstream. The remaining pairs are rendered as a JSON object with sorted
/// keys.
pub fn canonical<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let sorted: BTreeMap<&str, &str> = params
        .into_iter()
        .map(|(k, v)| (k, v.trim()))
        .filter(|(_, v)| !v.is_empty())
        .collect();

    serde_json::to_string(&sorted).unwrap_or_default()
}

/// Key for a game search.
pub fn search<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    format!("search-{}", canonical(params))
}

/// Key for a single game's detail.
pub fn game(id: &str) -> String {
    format!("game-{id}")
}

/// Key for live streams of a single game.
pub fn game_streams(game_id: &str) -> String {
    format!("twitch-game-streams-{game_id}")
}

pub const TRENDING_GAMES: &str = "trending-games";
pub const GENRES_LIST: &str = "genres-list";
pub const PLATFORMS_LIST: &str = "platforms-list";
pub const GENRES_STATS: &str = "genres-stats";
pub const PLATFORMS_STATS: &str = "platforms-stats";
pub const TOP_STREAMS: &str = "twitch-top-streams";
