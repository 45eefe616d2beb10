//! Core building blocks for the gamepulse API proxy.
//!
//! This crate provides:
//! - [`CachedFetcher`]: memoization of upstream calls with a per-call TTL
//! - [`CredentialBroker`]: cached OAuth client-credentials bearer tokens
//! - [`UpstreamRequest`]: immutable description of one outbound call
//! - Cache key derivation ([`key`]) and TTL classes ([`cache::ttl`])
//! - The closed [`Error`] taxonomy shared with the HTTP layer
//! - Prometheus metrics helpers

mod broker;
pub mod cache;
mod error;
pub mod key;
pub mod metrics;
mod request;

pub use broker::{
    ClientCredentials, CredentialBroker, DEFAULT_SAFETY_MARGIN, IssuedToken, TokenSource,
};
pub use cache::{CacheEntry, CachedFetcher, ttl};
pub use error::{Error, Result, UpstreamFailure};
pub use request::{UpstreamRequest, extract_detail};
