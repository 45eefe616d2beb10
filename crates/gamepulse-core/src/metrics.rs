//! Prometheus metrics helpers for gamepulse.
//!
//! # Usage
//!
//! ```rust,ignore
//! use gamepulse_core::metrics::{init_metrics, start_metrics_server};
//!
//! let handle = init_metrics();
//! start_metrics_server(9091, handle).await?;
//! ```
//!
//! # Metric Naming Conventions
//!
//! - Prefix: component (`cache_`, `credential_`, `upstream_`, `rate_limited_`)
//! - Suffix: unit or type (`_total`, `_seconds`)
//! - Labels: only low-cardinality values such as HTTP status

use std::net::SocketAddr;

use axum::{Router, routing::get};
use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder.
///
/// Returns `None` if a recorder is already installed (e.g. in tests).
pub fn init_metrics() -> Option<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder().ok()?;
    register_metrics();
    Some(handle)
}

/// Start the Prometheus metrics HTTP server.
///
/// Serves `/metrics` on `port` from a background task and returns once the
/// listener is bound.
pub async fn start_metrics_server(
    port: u16,
    handle: PrometheusHandle,
) -> Result<(), std::io::Error> {
    let app = Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Metrics server listening on http://{}/metrics", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "metrics server stopped");
        }
    });

    Ok(())
}

/// Register descriptions for the metrics recorded by the proxy.
fn register_metrics() {
    describe_counter!("cache_hits_total", "Requests answered from the response cache");
    describe_counter!(
        "cache_misses_total",
        "Requests that had to call an upstream producer"
    );
    describe_counter!(
        "cache_producer_errors_total",
        "Upstream producers that failed (nothing cached)"
    );

    describe_counter!(
        "credential_refreshes_total",
        "Bearer tokens obtained from the identity endpoint"
    );
    describe_counter!(
        "credential_refresh_errors_total",
        "Failed bearer token requests"
    );

    describe_counter!(
        "upstream_requests_total",
        "Upstream HTTP responses received (label: status)"
    );

    describe_counter!(
        "rate_limited_requests_total",
        "Requests rejected by the per-client rate limiter"
    );
}
