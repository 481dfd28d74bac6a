use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::dispatch::JsonObject;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Default request timeout for service clients.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// User-Agent header for outbound requests.
const USER_AGENT: &str = concat!("mcp-factory/", env!("CARGO_PKG_VERSION"));

/// Maximum number of response body characters kept in error logs.
const ERROR_BODY_EXCERPT: usize = 200;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Connection parameters owned by a single client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Endpoint the client talks to.
    pub base_url: Url,

    /// Credential sent with every request. May be empty.
    pub api_key: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

/// Why a fetch produced no data. Logged, never returned to callers.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}

//--------------------------------------------------------------------------------------------------
// Traits
//--------------------------------------------------------------------------------------------------

/// Asynchronous client for one remote API.
///
/// `fetch` never fails outward: every transport error, non-success status or
/// undecodable body is logged and reported as `None`.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Connection parameters this client was built with.
    fn config(&self) -> &ClientConfig;

    /// Fetch one structured result using free-form named parameters.
    async fn fetch(&self, params: &[(&str, &str)]) -> Option<JsonObject>;
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ClientConfig {
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            base_url,
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl ClientError {
    /// Get the error code for this error variant.
    pub fn code(&self) -> &'static str {
        match self {
            ClientError::Request(e) if e.is_timeout() => "TIMEOUT",
            ClientError::Request(_) => "REQUEST_FAILED",
            ClientError::Status { .. } => "HTTP_ERROR",
            ClientError::Decode(_) => "DECODE_ERROR",
            ClientError::MissingParameter(_) => "MISSING_PARAMETER",
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Build the HTTP client shared by a service's requests.
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {}", e);
            reqwest::Client::new()
        })
}

/// Check the status of `response` and decode its body as a JSON object.
pub(crate) async fn json_object(response: reqwest::Response) -> Result<JsonObject, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Status {
            status: status.as_u16(),
            body: body.chars().take(ERROR_BODY_EXCERPT).collect(),
        });
    }

    match response.json::<Value>().await? {
        Value::Object(map) => Ok(map),
        other => Err(ClientError::Decode(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
