use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::{
    error::{Result, ToolError},
    types::ChatMessage,
};

/// Everything a provider needs to produce one completion
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub system: &'a str,
    /// Free-form provider options (`max_tokens`, `temperature`, ...)
    pub options: &'a Map<String, Value>,
}

/// Sends a conversation plus system prompt to a model and returns its raw text.
///
/// Transport failures are returned as errors and are never retried by the
/// retry controller.
#[async_trait]
pub trait ModelCaller: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String>;
}

#[async_trait]
impl<T: ModelCaller + ?Sized> ModelCaller for Arc<T> {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String> {
        (**self).complete(request).await
    }
}

#[async_trait]
impl<T: ModelCaller + ?Sized> ModelCaller for Box<T> {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String> {
        (**self).complete(request).await
    }
}

/// Synchronous counterpart of [`ModelCaller`] for providers without an async client.
pub trait BlockingModelCaller: Send + Sync {
    fn complete_blocking(&self, request: CompletionRequest<'_>) -> Result<String>;
}

/// Lets a [`BlockingModelCaller`] drive the retry controller.
///
/// The wrapped call occupies the executor thread while it runs, which is the
/// intended behaviour under `ToolCaller::invoke_blocking`.
#[derive(Debug, Clone)]
pub struct Blocking<T>(pub T);

#[async_trait]
impl<T: BlockingModelCaller> ModelCaller for Blocking<T> {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String> {
        self.0.complete_blocking(request)
    }
}

pub(crate) fn map_transport_error(err: reqwest::Error) -> ToolError {
    if err.is_timeout() {
        ToolError::Timeout(format!("model request timed out: {err}"))
    } else {
        ToolError::Http(err)
    }
}

/// `error.message` from a provider error body, or the raw body.
pub(crate) fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(|message| message.as_str())
                .map(|message| message.to_string())
        })
        .unwrap_or_else(|| body.to_string())
}
