use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Map, Value};
use tracing::debug;

use super::caller::{api_error_message, map_transport_error, CompletionRequest, ModelCaller};
use crate::error::{Result, ToolError};
use crate::types::{ChatMessage, ContentBlock, MessageContent};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// [`ModelCaller`] for any endpoint speaking the OpenAI chat-completions dialect
/// (OpenAI, OpenRouter, local gateways).
#[derive(Clone)]
pub struct OpenAICompatibleCaller {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAICompatibleCaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAICompatibleCaller")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAICompatibleCaller {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ToolError::Config("API key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ToolError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        })
    }

    /// Read `OPENAI_API_KEY`, with the endpoint from `OPENAI_BASE_URL` or `OPENROUTER_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            ToolError::Config(
                "OPENAI_API_KEY environment variable must be set before creating an OpenAICompatibleCaller"
                    .to_string(),
            )
        })?;

        let mut caller = Self::new(api_key)?;
        if let Ok(base_url) =
            std::env::var("OPENAI_BASE_URL").or_else(|_| std::env::var("OPENROUTER_BASE_URL"))
        {
            caller.set_base_url(base_url);
        }
        Ok(caller)
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into();
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.set_base_url(base_url);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ModelCaller for OpenAICompatibleCaller {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String> {
        let request_url = build_chat_url(&self.base_url);
        let body = ChatCompletionRequest::from_completion(&request).into_value();
        debug!(target: "claude_tools::http", url = %request_url, model = request.model, "sending chat completion request");

        let response = self
            .client
            .post(&request_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("X-Title", "claude-tools-rs")
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
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

        let response_json: Value = serde_json::from_str(&response_text)?;

        // Some gateways report failures with a 200 and an `error` object.
        if let Some(error) = response_json.get("error") {
            let message = error
                .get("message")
                .and_then(|value| value.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| error.to_string());
            return Err(ToolError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response_json
            .pointer("/choices/0/message/content")
            .and_then(|content| content.as_str())
            .unwrap_or_default()
            .to_string())
    }
}

fn build_chat_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{}/chat/completions", trimmed)
    }
}

#[derive(Clone, Debug)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Value>,
    options: Map<String, Value>,
}

impl ChatCompletionRequest {
    fn from_completion(request: &CompletionRequest<'_>) -> Self {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(json!({"role": "system", "content": request.system}));
        messages.extend(request.messages.iter().map(chat_message_value));

        Self {
            model: request.model.to_string(),
            messages,
            options: request.options.clone(),
        }
    }

    fn into_value(self) -> Value {
        let mut body = self.options;
        body.insert("model".to_string(), json!(self.model));
        body.insert("messages".to_string(), Value::Array(self.messages));
        Value::Object(body)
    }
}

fn chat_message_value(message: &ChatMessage) -> Value {
    let content = match &message.content {
        MessageContent::Text(text) => json!(text),
        MessageContent::Blocks(blocks) => Value::Array(
            blocks
                .iter()
                .map(|block| match block {
                    ContentBlock::Text { text } => json!({"type": "text", "text": text}),
                    ContentBlock::Image { source } => json!({
                        "type": "image_url",
                        "image_url": {
                            "url": format!("data:{};base64,{}", source.media_type, source.data)
                        }
                    }),
                })
                .collect(),
        ),
    };

    json!({"role": message.role.as_str(), "content": content})
}
