//! HTTP transport seam
//!
//! `HttpTransport` sends one request and reports the raw status and body.
//! It knows nothing about tokens; decoration and refresh live in `ApiClient`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::ApiConfig;
use crate::errors::{ApiError, ApiResult, AppError, AppResult};

pub const AUTHORIZATION_HEADER: &str = "Authorization";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound request, relative to the configured base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ApiResult<Self> {
        let value = serde_json::to_value(body).map_err(|e| {
            ApiError::InvalidRequest(format!("cannot serialize body for {}: {}", self.path, e))
        })?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Token carried in the `Authorization: Bearer` header, if any
    pub fn bearer(&self) -> Option<&str> {
        self.header(AUTHORIZATION_HEADER)
            .and_then(|v| v.strip_prefix("Bearer "))
    }

    /// Replace any existing credential with `token`, or drop it when `None`
    pub fn set_bearer(&mut self, token: Option<&str>) {
        self.headers
            .retain(|(k, _)| !k.eq_ignore_ascii_case(AUTHORIZATION_HEADER));
        if let Some(token) = token {
            self.headers
                .push((AUTHORIZATION_HEADER.to_string(), format!("Bearer {}", token)));
        }
    }

    pub fn describe(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Raw response: status code plus body text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body parsed as JSON, `None` when empty or not JSON
    pub fn json_value(&self) -> Option<Value> {
        if self.body.trim().is_empty() {
            return None;
        }
        serde_json::from_str(&self.body).ok()
    }

    pub fn decode<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        serde_json::from_str(&self.body).map_err(|e| ApiError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Map a non-2xx response into the matching `ApiError`
    pub fn error_for_status(self, path: &str) -> ApiResult<ApiResponse> {
        if self.is_success() {
            return Ok(self);
        }

        let body = self.json_value();
        Err(match self.status {
            401 => ApiError::Unauthorized {
                path: path.to_string(),
                body,
            },
            403 => ApiError::Forbidden {
                path: path.to_string(),
                body,
            },
            status => ApiError::Status {
                status,
                message: reason_phrase(status, &self.body),
                body,
            },
        })
    }
}

fn reason_phrase(status: u16, body: &str) -> String {
    let canonical = reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown status");
    let body = body.trim();
    if body.is_empty() {
        canonical.to_string()
    } else {
        format!("{} - {}", canonical, body)
    }
}

/// One request in, one raw response out
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse>;
}

/// Configuration for the reqwest-backed transport
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: String,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: crate::config::DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: Some(30),
            user_agent: Some(concat!("engage-client/", env!("CARGO_PKG_VERSION")).to_string()),
        }
    }
}

impl From<&ApiConfig> for TransportConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout_secs: config.timeout_secs,
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Production transport over a pooled reqwest client
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
}

impl ReqwestTransport {
    pub fn new(config: TransportConfig) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(30));

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut client_builder = Client::builder()
            .timeout(timeout)
            .tcp_keepalive(Duration::from_secs(60))
            .pool_idle_timeout(Duration::from_secs(90))
            .default_headers(default_headers);

        if let Some(user_agent) = &config.user_agent {
            client_builder = client_builder.user_agent(user_agent);
        }

        let client = client_builder
            .build()
            .map_err(|e| AppError::http_client_with_source("Failed to create HTTP client", e))?;

        Ok(Self {
            client,
            base_url: normalize_base(&config.base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join a request path onto the base URL, keeping the base path prefix
    pub fn build_url(&self, path: &str) -> ApiResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidRequest(format!("invalid path '{}': {}", path, e)))
    }

    fn build_headers(&self, request: &ApiRequest) -> ApiResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::InvalidRequest(format!("invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::InvalidRequest(format!("invalid header value: {}", e)))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

/// Base URLs are treated as directories so `/api/v1` survives joins
fn normalize_base(base_url: &str) -> AppResult<Url> {
    let mut url = Url::parse(base_url)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> ApiResult<ApiResponse> {
        let url = self.build_url(&request.path)?;
        let headers = self.build_headers(request)?;

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        debug!("{} {}", request.method, url);

        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let transport_error = |e: reqwest::Error| ApiError::Transport {
            method: request.method.to_string(),
            path: request.path.clone(),
            message: e.to_string(),
        };

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;

        Ok(ApiResponse { status, body })
    }
}
