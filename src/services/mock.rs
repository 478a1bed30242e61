//! Deterministic model caller for tests and offline demos.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use super::caller::{BlockingModelCaller, CompletionRequest, ModelCaller};
use crate::error::{Result, ToolError};
use crate::types::ChatMessage;

#[derive(Debug, Clone)]
enum Scripted {
    Text(String),
    Api { status: u16, message: String },
}

impl Scripted {
    fn into_result(self) -> Result<String> {
        match self {
            Scripted::Text(text) => Ok(text),
            Scripted::Api { status, message } => Err(ToolError::Api { status, message }),
        }
    }
}

/// Snapshot of one request the scripted caller received
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub model: String,
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub options: Map<String, Value>,
}

/// Replays queued responses in order and records every request.
///
/// Once the queue is drained the fallback response (if any) is repeated;
/// otherwise the call fails with [`ToolError::Unknown`].
#[derive(Debug, Default)]
pub struct ScriptedCaller {
    queue: Mutex<VecDeque<Scripted>>,
    fallback: Option<String>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedCaller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let caller = Self::new();
        for response in responses {
            caller.push_response(response);
        }
        caller
    }

    /// Answer every request with `response`.
    pub fn repeating(response: impl Into<String>) -> Self {
        Self {
            fallback: Some(response.into()),
            ..Self::default()
        }
    }

    pub fn push_response(&self, response: impl Into<String>) {
        lock(&self.queue).push_back(Scripted::Text(response.into()));
    }

    /// Queue a provider failure.
    pub fn push_api_error(&self, status: u16, message: impl Into<String>) {
        lock(&self.queue).push_back(Scripted::Api {
            status,
            message: message.into(),
        });
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    fn respond(&self, request: CompletionRequest<'_>) -> Result<String> {
        lock(&self.requests).push(RecordedRequest {
            model: request.model.to_string(),
            system: request.system.to_string(),
            messages: request.messages.to_vec(),
            options: request.options.clone(),
        });

        match lock(&self.queue).pop_front() {
            Some(scripted) => scripted.into_result(),
            None => self.fallback.clone().ok_or_else(|| {
                ToolError::Unknown("scripted caller has no responses left".to_string())
            }),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl ModelCaller for ScriptedCaller {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String> {
        self.respond(request)
    }
}

impl BlockingModelCaller for ScriptedCaller {
    fn complete_blocking(&self, request: CompletionRequest<'_>) -> Result<String> {
        self.respond(request)
    }
}
