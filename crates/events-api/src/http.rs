//! HTTP plumbing for the events service
//!
//! Request/response types and the reqwest-backed client that turns every
//! non-success outcome into the [`ApiError`] taxonomy. Deliberately carries
//! no retry logic: failed calls surface to the user, who re-triggers them.

use crate::types::AccessToken;
use crate::{ApiError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

// =============================================================================
// Request Types
// =============================================================================

/// HTTP method for API requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request
    Get,
    /// POST request
    Post,
    /// PUT request
    Put,
    /// DELETE request
    Delete,
}

impl HttpMethod {
    /// Get the method name as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// A request to the events service
///
/// Built with the fluent helpers and executed by [`HttpClient::send`].
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Path relative to the service base URL (e.g. "events")
    pub path: String,
    /// Query parameters
    pub params: HashMap<String, String>,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Request body
    pub body: Option<Vec<u8>>,
    /// Content type of the body
    pub encoding: Option<String>,
}

impl ApiRequest {
    fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: HashMap::new(),
            headers: HashMap::new(),
            body: None,
            encoding: None,
        }
    }

    /// Create a GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Create a POST request
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Create a PUT request
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// Create a DELETE request
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Attach a bearer token
    pub fn bearer(self, token: &AccessToken) -> Self {
        self.header("Authorization", format!("Bearer {}", token.as_str()))
    }

    /// Set a JSON body
    pub fn json_body<T: Serialize>(mut self, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value)
            .map_err(|e| ApiError::Validation(format!("failed to encode request body: {}", e)))?;
        self.body = Some(body);
        self.encoding = Some("application/json".to_string());
        Ok(self)
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// A decoded response from the events service
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Decoded response body
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Create a new response
    pub fn new(status: u16, headers: HashMap<String, String>, data: T) -> Self {
        Self { status, headers, data }
    }

    /// Get a header value
    pub fn header(&self, key: &str) -> Option<&String> {
        self.headers.get(key)
    }

    /// Check if the response is successful (2xx status)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for the events service client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base service URL (e.g. "https://api.campuspulse.app")
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Headers sent with every request
    pub default_headers: HashMap<String, String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.campuspulse.app".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("CampusPulse/{}", env!("CARGO_PKG_VERSION")),
            default_headers: HashMap::new(),
        }
    }
}

impl ApiClientConfig {
    /// Create a config pointing at the given service
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a header sent with every request
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// Error Response Format
// =============================================================================

/// Error body the service sends with non-success statuses
///
/// Parsed leniently: either field may be missing, in which case the status
/// code alone drives classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorBody {
    /// Human-readable message
    message: Option<String>,
    /// Machine-readable error code
    error: Option<String>,
}

impl ErrorBody {
    fn detail(self, status: u16) -> String {
        self.message
            .or(self.error)
            .unwrap_or_else(|| format!("HTTP {}", status))
    }
}

// =============================================================================
// HTTP Client
// =============================================================================

use reqwest::{Client as ReqwestClient, Response as ReqwestResponse};

/// HTTP client for the events service
///
/// # Examples
/// ```no_run
/// use events_api::http::{ApiClientConfig, ApiRequest, HttpClient};
///
/// async fn example() -> events_api::Result<()> {
///     let client = HttpClient::new(ApiClientConfig::new("https://api.campuspulse.app"));
///
///     let request = ApiRequest::get("events");
///     let response = client.send::<serde_json::Value>(request).await?;
///     println!("status {}", response.status);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    /// Underlying reqwest client
    client: ReqwestClient,
    /// Configuration
    config: ApiClientConfig,
}

impl HttpClient {
    /// Create a new client
    pub fn new(config: ApiClientConfig) -> Self {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .expect("Failed to build HTTP client");

        Self { client, config }
    }

    /// Send a request and decode the JSON response body
    pub async fn send<T>(&self, request: ApiRequest) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let response = self.execute(request).await?;
        self.parse_response(response).await
    }

    /// Send a request, checking the status but discarding the body
    ///
    /// For acknowledgement endpoints whose body carries nothing the client
    /// needs; tolerates empty bodies that would fail JSON decoding.
    pub async fn send_empty(&self, request: ApiRequest) -> Result<ApiResponse<()>> {
        let response = self.execute(request).await?;

        let status = response.status().as_u16();
        let headers = collect_headers(&response);

        if !response.status().is_success() {
            return Err(classify_failure(status, response).await);
        }

        Ok(ApiResponse::new(status, headers, ()))
    }

    /// Send a multipart form and decode the JSON response body
    pub async fn send_multipart<T>(
        &self,
        path: &str,
        token: &AccessToken,
        form: reqwest::multipart::Form,
    ) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let url = self.url(path);
        tracing::debug!(%url, "POST multipart");

        let mut req = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", token.as_str()));

        for (key, value) in &self.config.default_headers {
            req = req.header(key, value);
        }

        let response = req.multipart(form).send().await?;
        self.parse_response(response).await
    }

    /// Execute a request without interpreting the response
    async fn execute(&self, request: ApiRequest) -> Result<ReqwestResponse> {
        let url = self.url(&request.path);
        tracing::debug!(method = request.method.as_str(), %url, "sending request");

        let mut req = match request.method {
            HttpMethod::Get => self.client.get(&url),
            HttpMethod::Post => self.client.post(&url),
            HttpMethod::Put => self.client.put(&url),
            HttpMethod::Delete => self.client.delete(&url),
        };

        for (key, value) in &request.params {
            req = req.query(&[(key, value)]);
        }

        for (key, value) in &self.config.default_headers {
            req = req.header(key, value);
        }

        for (key, value) in &request.headers {
            req = req.header(key, value);
        }

        if let Some(body) = request.body {
            if let Some(encoding) = &request.encoding {
                req = req.header("Content-Type", encoding);
            }
            req = req.body(body);
        }

        Ok(req.send().await?)
    }

    /// Decode a response, classifying non-success statuses
    async fn parse_response<T>(&self, response: ReqwestResponse) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let status = response.status().as_u16();
        let headers = collect_headers(&response);

        if !response.status().is_success() {
            return Err(classify_failure(status, response).await);
        }

        let body = response.text().await?;
        let data: T = serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("failed to decode body: {}", e)))?;

        Ok(ApiResponse::new(status, headers, data))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Get the client configuration
    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// Get the base service URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }
}

fn collect_headers(response: &ReqwestResponse) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    for (key, value) in response.headers() {
        if let Ok(value_str) = value.to_str() {
            headers.insert(key.to_string(), value_str.to_string());
        }
    }
    headers
}

async fn classify_failure(status: u16, response: ReqwestResponse) -> ApiError {
    let body = response.text().await.unwrap_or_default();

    let detail = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => parsed.detail(status),
        Err(_) if body.is_empty() => format!("HTTP {}", status),
        Err(_) => body,
    };

    ApiError::from_status(status, detail)
}

// =============================================================================
// Tests
// =============================================================================
