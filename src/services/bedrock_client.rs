//! Anthropic models served through AWS Bedrock (`InvokeModel`).
use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_bedrockruntime::{
    config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Region},
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    operation::invoke_model::InvokeModelError,
    primitives::Blob,
    Client,
};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::anthropic_client::{messages_body, MessagesResponse};
use super::caller::{api_error_message, CompletionRequest, ModelCaller};
use crate::error::{Result, ToolError};

const BEDROCK_ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
const DEFAULT_MAX_TOKENS: u32 = 1024;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Credentials and region for the Bedrock runtime
#[derive(Clone)]
pub struct BedrockConfig {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    /// Overrides `https://bedrock-runtime.{region}.amazonaws.com`
    pub endpoint_url: Option<String>,
    pub timeout: Duration,
    pub default_max_tokens: u32,
}

impl std::fmt::Debug for BedrockConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedrockConfig")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("endpoint_url", &self.endpoint_url)
            .field("timeout", &self.timeout)
            .field("default_max_tokens", &self.default_max_tokens)
            .finish()
    }
}

impl BedrockConfig {
    pub fn new(
        region: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
            endpoint_url: None,
            timeout: DEFAULT_TIMEOUT,
            default_max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Read `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and `AWS_REGION`
    /// (or `AWS_DEFAULT_REGION`), plus an optional `AWS_SESSION_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let required = |name: &str| {
            std::env::var(name).map_err(|_| {
                ToolError::Config(format!(
                    "{name} environment variable must be set before creating a BedrockCaller"
                ))
            })
        };

        let region = std::env::var("AWS_REGION").or_else(|_| required("AWS_DEFAULT_REGION"))?;
        let mut config = Self::new(
            region,
            required("AWS_ACCESS_KEY_ID")?,
            required("AWS_SECRET_ACCESS_KEY")?,
        );
        config.session_token = std::env::var("AWS_SESSION_TOKEN").ok();
        Ok(config)
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
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

/// [`ModelCaller`] for Anthropic models on AWS Bedrock.
///
/// Requests are SigV4-signed by the Bedrock runtime SDK and sent to
/// `POST /model/{model}/invoke`. SDK-level retries are disabled, so
/// throttling surfaces as [`ToolError::RateLimit`] like the other callers.
#[derive(Clone, Debug)]
pub struct BedrockCaller {
    config: BedrockConfig,
    client: Client,
}

impl BedrockCaller {
    pub fn new(config: BedrockConfig) -> Result<Self> {
        if config.region.trim().is_empty() {
            return Err(ToolError::Config("AWS region is empty".to_string()));
        }
        if config.access_key_id.trim().is_empty() || config.secret_access_key.trim().is_empty() {
            return Err(ToolError::Config("AWS credentials are empty".to_string()));
        }

        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            config.session_token.clone(),
            None,
            "claude-tools",
        );

        let mut builder = aws_sdk_bedrockruntime::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .retry_config(RetryConfig::disabled())
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_timeout(config.timeout)
                    .build(),
            );
        if let Some(endpoint_url) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint_url.trim_end_matches('/'));
        }

        let client = Client::from_conf(builder.build());
        Ok(Self { config, client })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(BedrockConfig::from_env()?)
    }

    pub fn config(&self) -> &BedrockConfig {
        &self.config
    }

    fn request_body(&self, request: &CompletionRequest<'_>) -> Result<Value> {
        let mut body = messages_body(request, self.config.default_max_tokens)?;
        body.insert(
            "anthropic_version".to_string(),
            json!(BEDROCK_ANTHROPIC_VERSION),
        );
        Ok(Value::Object(body))
    }
}

#[async_trait]
impl ModelCaller for BedrockCaller {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String> {
        let body = serde_json::to_vec(&self.request_body(&request)?)?;
        debug!(
            target: "claude_tools::http",
            region = %self.config.region,
            model = request.model,
            "sending bedrock invoke request"
        );

        let output = self
            .client
            .invoke_model()
            .model_id(request.model)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(body))
            .send()
            .await
            .map_err(map_sdk_error)?;

        let parsed: MessagesResponse = serde_json::from_slice(output.body.as_ref())?;
        Ok(parsed.text())
    }
}

fn map_sdk_error(err: SdkError<InvokeModelError>) -> ToolError {
    if let SdkError::TimeoutError(_) = &err {
        return ToolError::Timeout(format!(
            "model request timed out: {}",
            DisplayErrorContext(&err)
        ));
    }

    match err {
        SdkError::ServiceError(context) => {
            let raw = context.raw();
            let status = raw.status().as_u16();
            if status == 429 {
                let retry_after = raw
                    .headers()
                    .get("retry-after")
                    .and_then(|value| value.parse::<u64>().ok())
                    .unwrap_or(1);
                return ToolError::RateLimit {
                    retry_after: retry_after.max(1),
                };
            }

            let message = match context.err().message() {
                Some(message) => message.to_string(),
                None => raw
                    .body()
                    .bytes()
                    .map(|bytes| api_error_message(&String::from_utf8_lossy(bytes)))
                    .unwrap_or_else(|| context.err().to_string()),
            };
            ToolError::Api { status, message }
        }
        other => ToolError::Transport(DisplayErrorContext(&other).to_string()),
    }
}
