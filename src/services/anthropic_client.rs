use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, RETRY_AFTER},
    StatusCode,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::debug;

use super::caller::{api_error_message, map_transport_error, CompletionRequest, ModelCaller};
use crate::error::{Result, ToolError};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 1024;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Connection settings for the Anthropic Messages API
#[derive(Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub base_url: String,
    pub api_version: String,
    /// Upper bound for one HTTP attempt
    pub timeout: Duration,
    /// Sent as `max_tokens` when the request options do not carry one
    pub default_max_tokens: u32,
}

impl std::fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .field("default_max_tokens", &self.default_max_tokens)
            .finish()
    }
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
            default_max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Read `ANTHROPIC_API_KEY`, and optionally `ANTHROPIC_BASE_URL` / `ANTHROPIC_VERSION`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
            ToolError::Config(
                "ANTHROPIC_API_KEY environment variable must be set before creating an AnthropicCaller"
                    .to_string(),
            )
        })?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("ANTHROPIC_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(api_version) = std::env::var("ANTHROPIC_VERSION") {
            config.api_version = api_version;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_default_max_tokens(mut self, max_tokens: u32) -> Self {
        self.default_max_tokens = max_tokens;
        self
    }
}

/// [`ModelCaller`] backed by the Anthropic Messages API
#[derive(Clone, Debug)]
pub struct AnthropicCaller {
    config: AnthropicConfig,
    client: reqwest::Client,
}

impl AnthropicCaller {
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(ToolError::Config("Anthropic API key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ToolError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self { config, client })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(AnthropicConfig::from_env()?)
    }

    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.config.api_key).map_err(|_| {
                ToolError::Config("API key contains invalid header characters".to_string())
            })?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_str(&self.config.api_version).map_err(|_| {
                ToolError::Config("API version contains invalid header characters".to_string())
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn request_body(&self, request: &CompletionRequest<'_>) -> Result<Value> {
        let mut body = messages_body(request, self.config.default_max_tokens)?;
        body.insert("model".to_string(), json!(request.model));
        Ok(Value::Object(body))
    }
}

#[async_trait]
impl ModelCaller for AnthropicCaller {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String> {
        let url = build_messages_url(&self.config.base_url);
        let body = self.request_body(&request)?;
        debug!(target: "claude_tools::http", %url, model = request.model, "sending messages request");

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());
        let response_text = response.text().await.map_err(map_transport_error)?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ToolError::RateLimit {
                retry_after: retry_after.unwrap_or(1).max(1),
            });
        }

        if !status.is_success() {
            return Err(ToolError::Api {
                status: status.as_u16(),
                message: api_error_message(&response_text),
            });
        }

        let parsed: MessagesResponse = serde_json::from_str(&response_text)?;
        Ok(parsed.text())
    }
}

/// Messages API body without the model, which Bedrock carries in the URL.
pub(super) fn messages_body(
    request: &CompletionRequest<'_>,
    default_max_tokens: u32,
) -> Result<Map<String, Value>> {
    let mut body: Map<String, Value> = request.options.clone();
    body.insert("messages".to_string(), serde_json::to_value(request.messages)?);
    body.insert("system".to_string(), json!(request.system));
    body.entry("max_tokens")
        .or_insert_with(|| json!(default_max_tokens));
    Ok(body)
}

#[derive(Deserialize)]
pub(super) struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl MessagesResponse {
    pub(super) fn text(self) -> String {
        self.content
            .into_iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(text),
                ResponseBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

fn build_messages_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/v1/messages") {
        return trimmed.to_string();
    }
    let root = trimmed.strip_suffix("/v1").unwrap_or(trimmed);
    format!("{}/v1/messages", root)
}
