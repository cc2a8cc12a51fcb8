//! Thin reqwest wrapper with bearer-session support
//!
//! Every call records its latency and hands back the raw body alongside the
//! status code, so individual checks decide for themselves what counts as a
//! pass. Non-2xx statuses are not errors at this layer.

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("invalid base URL: {0}")]
    InvalidUrl(String),
}

/// Completed HTTP exchange: status, raw body, latency
#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
    pub duration_ms: u64,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Parse the body as loose JSON, `None` when it is not JSON at all
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// Parse the body into a typed payload
    pub fn json_as<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_str(&self.body).ok()
    }

    /// Body trimmed for inclusion in result messages
    pub fn body_excerpt(&self) -> String {
        let trimmed = self.body.trim();
        if trimmed.len() > 200 {
            // Cut on a char boundary, backend messages are not ASCII-only
            let cut = (1..=200).rev().find(|i| trimmed.is_char_boundary(*i)).unwrap_or(0);
            format!("{}...", &trimmed[..cut])
        } else {
            trimmed.to_string()
        }
    }
}

/// HTTP client bound to one deployment, carrying the session token once
/// a login has succeeded.
pub struct ApiClient {
    client: reqwest::Client,
    api_base: String,
    timeout_secs: u64,
    bearer: Option<String>,
}

impl ApiClient {
    pub fn new(api_base: &str, timeout_secs: u64) -> Result<Self, HttpError> {
        if !api_base.starts_with("http://") && !api_base.starts_with("https://") {
            return Err(HttpError::InvalidUrl(api_base.to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(headers)
            .danger_accept_invalid_certs(false)
            .build()
            .map_err(HttpError::Build)?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            timeout_secs,
            bearer: None,
        })
    }

    /// Attach the bearer token to all subsequent requests
    pub fn set_bearer(&mut self, token: impl Into<String>) {
        self.bearer = Some(token.into());
    }

    pub fn clear_bearer(&mut self) {
        self.bearer = None;
    }

    pub fn has_session(&self) -> bool {
        self.bearer.is_some()
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, HttpError> {
        self.request(Method::GET, &self.url(path), None::<&()>).await
    }

    pub async fn post<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, HttpError> {
        self.request(Method::POST, &self.url(path), Some(body)).await
    }

    pub async fn post_empty(&self, path: &str) -> Result<ApiResponse, HttpError> {
        self.request(Method::POST, &self.url(path), None::<&()>).await
    }

    pub async fn patch<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, HttpError> {
        self.request(Method::PATCH, &self.url(path), Some(body)).await
    }

    /// GET against a fully-qualified URL outside the deployment, e.g. the
    /// Telegram Bot API.
    pub async fn get_absolute(&self, url: &str) -> Result<ApiResponse, HttpError> {
        self.request(Method::GET, url, None::<&()>).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    async fn request<B: Serialize>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse, HttpError> {
        trace!(%method, url, "sending request");
        let start = Instant::now();

        let mut builder = self.client.request(method, url);
        if let Some(token) = &self.bearer {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpError::Timeout {
                    url: url.to_string(),
                    timeout_secs: self.timeout_secs,
                }
            } else {
                HttpError::Request {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| HttpError::Request {
            url: url.to_string(),
            source: e,
        })?;
        let duration_ms = start.elapsed().as_millis() as u64;

        debug!(url, status = status.as_u16(), duration_ms, "request complete");

        Ok(ApiResponse {
            status,
            body,
            duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bare_host() {
        assert!(matches!(
            ApiClient::new("shop.example.com", 30),
            Err(HttpError::InvalidUrl(_))
        ));
    }

    #[test]
    fn joins_paths_without_double_slash() {
        let client = ApiClient::new("https://shop.example.com/api/", 30).unwrap();
        assert_eq!(
            client.url("/auth/login"),
            "https://shop.example.com/api/auth/login"
        );
        assert_eq!(
            client.url("products"),
            "https://shop.example.com/api/products"
        );
    }

    #[test]
    fn bearer_toggles_session() {
        let mut client = ApiClient::new("https://shop.example.com/api", 30).unwrap();
        assert!(!client.has_session());
        client.set_bearer("tok");
        assert!(client.has_session());
        client.clear_bearer();
        assert!(!client.has_session());
    }

    #[test]
    fn excerpt_cuts_on_char_boundaries() {
        let body = format!("x{}", "á".repeat(150));
        let response = ApiResponse {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body,
            duration_ms: 3,
        };
        let excerpt = response.body_excerpt();
        assert!(excerpt.ends_with("..."));
        assert!(excerpt.len() <= 203);
    }

    #[test]
    fn short_bodies_pass_through_untruncated() {
        let response = ApiResponse {
            status: StatusCode::BAD_REQUEST,
            body: "  pago rechazado  ".to_string(),
            duration_ms: 3,
        };
        assert_eq!(response.body_excerpt(), "pago rechazado");
    }

    #[test]
    fn response_json_helpers() {
        let response = ApiResponse {
            status: StatusCode::OK,
            body: r#"{"access_token":"abc"}"#.to_string(),
            duration_ms: 12,
        };
        assert!(response.is_success());
        assert_eq!(response.json().unwrap()["access_token"], "abc");

        let not_json = ApiResponse {
            status: StatusCode::BAD_GATEWAY,
            body: "<html>502</html>".to_string(),
            duration_ms: 5,
        };
        assert!(not_json.json().is_none());
    }

    #[test]
    fn body_excerpt_truncates() {
        let response = ApiResponse {
            status: StatusCode::OK,
            body: "x".repeat(500),
            duration_ms: 1,
        };
        assert_eq!(response.body_excerpt().len(), 203);
    }
}
