//! Producers for the RAWG and Twitch Helix APIs.
//!
//! Payloads are passed through as opaque JSON except where the proxy needs
//! to look inside them (the stats cross-tabulation).

use std::collections::BTreeMap;

use gamepulse_core::{CredentialBroker, Error, Result, UpstreamRequest};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::AppState;

/// Page size for list endpoints shown on the dashboard.
const LIST_PAGE_SIZE: u32 = 20;

/// Page size for reference lists and the stats sample.
const REFERENCE_PAGE_SIZE: u32 = 100;

/// Streams returned per game.
const GAME_STREAMS_LIMIT: u32 = 5;

async fn send<T: DeserializeOwned>(request: UpstreamRequest, http: &reqwest::Client) -> Result<T> {
    request.send_json(http).await.map_err(Error::UpstreamFetch)
}

/// Whether `id` is a plain RAWG id or slug, safe to use as one URL path
/// segment.
pub fn is_resource_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Search filters accepted by `/api/games/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    /// Free-text query.
    pub q: Option<String>,
    /// Comma-separated genre ids or slugs.
    pub genres: Option<String>,
    /// Comma-separated platform ids.
    pub platforms: Option<String>,
    /// Metacritic range, e.g. "80,100".
    pub rating: Option<String>,
    /// Release date range, e.g. "2020-01-01,2020-12-31".
    pub released: Option<String>,
}

impl SearchParams {
    /// Parameters as name/value pairs, in declaration order.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        [
            ("q", &self.q),
            ("genres", &self.genres),
            ("platforms", &self.platforms),
            ("rating", &self.rating),
            ("released", &self.released),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }
}

/// RAWG game database client.
pub struct Rawg<'a> {
    http: &'a reqwest::Client,
    base_url: &'a str,
    api_key: &'a str,
}

impl<'a> Rawg<'a> {
    /// Client for the configured RAWG account; fails when no key is set.
    pub fn new(state: &'a AppState) -> Result<Self> {
        Ok(Self {
            http: &state.http,
            base_url: &state.config.rawg_base_url,
            api_key: state.config.rawg_api_key()?,
        })
    }

    fn get(&self, path: &str) -> UpstreamRequest {
        UpstreamRequest::get(format!("{}{}", self.base_url, path)).query("key", self.api_key)
    }

    /// Highest rated games in the trending date range.
    pub async fn trending(&self, dates: &str) -> Result<Value> {
        let request = self
            .get("/games")
            .query("page_size", LIST_PAGE_SIZE)
            .query("ordering", "-rating")
            .query("dates", dates);
        send(request, self.http).await
    }

    pub async fn search(&self, params: &SearchParams) -> Result<Value> {
        let request = self
            .get("/games")
            .query("page_size", LIST_PAGE_SIZE)
            .query_opt("search", params.q.as_deref())
            .query_opt("genres", params.genres.as_deref())
            .query_opt("platforms", params.platforms.as_deref())
            .query_opt("rating", params.rating.as_deref())
            .query_opt("dates", params.released.as_deref());
        send(request, self.http).await
    }

    pub async fn game(&self, id: &str) -> Result<Value> {
        send(self.get(&format!("/games/{id}")), self.http).await
    }

    /// Genre list, decoded as `T` (opaque `Value` or a typed [`Page`]).
    pub async fn genres<T: DeserializeOwned>(&self) -> Result<T> {
        let request = self.get("/genres").query("page_size", REFERENCE_PAGE_SIZE);
        send(request, self.http).await
    }

    /// Platform list, decoded as `T` (opaque `Value` or a typed [`Page`]).
    pub async fn platforms<T: DeserializeOwned>(&self) -> Result<T> {
        let request = self.get("/platforms").query("page_size", REFERENCE_PAGE_SIZE);
        send(request, self.http).await
    }

    /// One page of top rated games, used as the stats sample.
    pub async fn top_rated_sample(&self) -> Result<Page<GameTaxonomy>> {
        let request = self
            .get("/games")
            .query("page_size", REFERENCE_PAGE_SIZE)
            .query("ordering", "-rating");
        send(request, self.http).await
    }
}

/// Paginated RAWG response; only the results are read.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformSlot {
    pub platform: NamedRef,
}

/// Genre and platform tags of a game.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameTaxonomy {
    #[serde(default)]
    pub genres: Option<Vec<NamedRef>>,
    #[serde(default)]
    pub platforms: Option<Vec<PlatformSlot>>,
}

/// Number of sampled games tagged with one genre or platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionEntry {
    pub id: u64,
    pub name: String,
    pub count: u64,
}

/// Count occurrences per id, most frequent first, ties by ascending id.
pub fn distribution<I>(tags: I) -> Vec<DistributionEntry>
where
    I: IntoIterator<Item = NamedRef>,
{
    let mut counts: BTreeMap<u64, DistributionEntry> = BTreeMap::new();
    for tag in tags {
        let entry = counts.entry(tag.id).or_insert_with(|| DistributionEntry {
            id: tag.id,
            name: String::new(),
            count: 0,
        });
        entry.name = tag.name;
        entry.count += 1;
    }

    let mut entries: Vec<_> = counts.into_values().collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries
}

/// Twitch Helix client. Every call obtains its bearer token from the broker.
pub struct Helix<'a> {
    http: &'a reqwest::Client,
    api_url: &'a str,
    client_id: &'a str,
    broker: &'a CredentialBroker,
}

impl<'a> Helix<'a> {
    /// Client for the configured Twitch application; fails when credentials are missing.
    pub fn new(state: &'a AppState) -> Result<Self> {
        let (client_id, _) = state.config.twitch_credentials()?;
        Ok(Self {
            http: &state.http,
            api_url: &state.config.twitch_api_url,
            client_id,
            broker: &state.broker,
        })
    }

    async fn streams(&self, filter: impl FnOnce(UpstreamRequest) -> UpstreamRequest) -> Result<Value> {
        let token = self.broker.get_token().await?;
        let request = UpstreamRequest::get(format!("{}/streams", self.api_url))
            .header("Client-ID", self.client_id)
            .bearer(&token);
        send(filter(request), self.http).await
    }

    pub async fn top_streams(&self) -> Result<Value> {
        self.streams(|r| r.query("first", LIST_PAGE_SIZE)).await
    }

    pub async fn game_streams(&self, game_id: &str) -> Result<Value> {
        self.streams(|r| r.query("game_id", game_id).query("first", GAME_STREAMS_LIMIT))
            .await
    }
}
