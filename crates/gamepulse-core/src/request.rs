//! Immutable descriptions of outbound upstream calls.

use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::error::UpstreamFailure;

/// Longest raw error body kept as failure detail.
const MAX_DETAIL_LEN: usize = 200;

/// One outbound HTTP call: method, URL, headers and query parameters.
///
/// Built per invocation and consumed by [`UpstreamRequest::send_json`].
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    method: Method,
    url: String,
    headers: Vec<(&'static str, String)>,
    query: Vec<(&'static str, String)>,
}

impl UpstreamRequest {
    /// Describe a request with the given method and URL.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
        }
    }

    /// Describe a `GET` request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Describe a `POST` request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Add a header.
    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Add an `Authorization: Bearer` header.
    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {token}"))
    }

    /// Add a query parameter.
    pub fn query(mut self, name: &'static str, value: impl ToString) -> Self {
        self.query.push((name, value.to_string()));
        self
    }

    /// Add a query parameter only when a non-empty value is present.
    pub fn query_opt(self, name: &'static str, value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => self.query(name, v),
            None => self,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &[(&'static str, String)] {
        &self.headers
    }

    pub fn query_pairs(&self) -> &[(&'static str, String)] {
        &self.query
    }

    /// Value of a query parameter, if set.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Send the request and decode a JSON body.
    ///
    /// Non-2xx responses become an [`UpstreamFailure`] carrying the status and
    /// whatever detail could be read from the error body.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        http: &reqwest::Client,
    ) -> Result<T, UpstreamFailure> {
        let mut builder = http.request(self.method.clone(), &self.url);
        for (name, value) in &self.headers {
            builder = builder.header(*name, value);
        }
        if !self.query.is_empty() {
            builder = builder.query(&self.query);
        }

        let response = builder.send().await.inspect_err(|e| {
            tracing::warn!(url = %self.url, error = %e, "upstream request failed");
        })?;

        let status = response.status();
        metrics::counter!("upstream_requests_total", "status" => status.as_u16().to_string())
            .increment(1);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(url = %self.url, status = status.as_u16(), "upstream returned error status");
            return Err(UpstreamFailure {
                status: Some(status.as_u16()),
                message: format!(
                    "upstream returned {}",
                    status.canonical_reason().unwrap_or("an error")
                ),
                detail: extract_detail(&body),
            });
        }

        Ok(response.json::<T>().await?)
    }
}

/// Pull a useful message out of an upstream error body.
///
/// Looks for the `detail`, `message` or `error` fields used by RAWG, Twitch
/// and OAuth endpoints, falling back to the trimmed raw text.
pub fn extract_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["detail", "message", "error_description", "error"] {
            if let Some(text) = map.get(field).and_then(|v| v.as_str()) {
                return Some(text.to_string());
            }
        }
    }

    Some(body.chars().take(MAX_DETAIL_LEN).collect())
}
