use std::sync::Arc;

use crate::{
    core::{
        attempt::{AttemptEvent, AttemptSink, TracingSink},
        request::ToolRequest,
        retry::RetryState,
    },
    error::{Result, ToolError},
    extract::{extract_multiple, extract_single},
    prompts::{
        compose_system_prompt, no_call_directive, tool_mismatch_directive, validation_feedback,
        PromptMode,
    },
    schemas::Validator,
    services::caller::{CompletionRequest, ModelCaller},
    types::{ExtractedCall, ToolOutcome},
};

/// What the loop does after assessing one model response
#[derive(Debug)]
enum Verdict {
    Accept(ToolOutcome),
    Amend(String),
    Reject(ToolError),
}

/// Drives prompt composition, model calls, extraction and validation with a
/// bounded retry budget.
///
/// Holds no per-invocation state, so one instance can serve concurrent
/// invocations.
pub struct ToolCaller<C> {
    caller: C,
    validator: Validator,
    sink: Arc<dyn AttemptSink>,
}

impl<C: ModelCaller> ToolCaller<C> {
    pub fn new(caller: C) -> Self {
        Self {
            caller,
            validator: Validator::default(),
            sink: Arc::new(TracingSink::default()),
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn AttemptSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Shorthand for installing a [`TracingSink`] with the given verbosity.
    pub fn with_verbose(self, verbose: bool) -> Self {
        self.with_sink(Arc::new(TracingSink::new(verbose)))
    }

    pub fn caller(&self) -> &C {
        &self.caller
    }

    pub fn validator(&self) -> Validator {
        self.validator
    }

    /// Run one invocation, yielding to the runtime while the model call is in flight.
    pub async fn invoke(&self, request: &ToolRequest) -> Result<ToolOutcome> {
        request.validate()?;

        let mode = PromptMode::resolve(request.multiple_tools, request.tool_choice.as_ref());
        let system = compose_system_prompt(&mode, &request.tools, request.task.as_deref());
        let mut state = RetryState::new(request.max_attempts, system);

        loop {
            let attempt = state.begin_attempt();
            self.sink.record(&AttemptEvent::Started {
                attempt,
                max_attempts: state.max_attempts(),
            });

            let completion = CompletionRequest {
                model: &request.model,
                messages: &request.messages,
                system: state.system(),
                options: &request.options,
            };
            let text = match self.caller.complete(completion).await {
                Ok(text) => text,
                Err(err) => {
                    self.record_failure(attempt, &err);
                    return Err(err);
                }
            };
            self.sink.record(&AttemptEvent::Response {
                attempt,
                text: text.clone(),
            });

            match self.assess(request, &mode, &state, text) {
                Verdict::Accept(outcome) => {
                    let event = if outcome.is_text() {
                        AttemptEvent::SoftReturn { attempt }
                    } else {
                        AttemptEvent::Succeeded {
                            attempt,
                            calls: outcome.calls().len(),
                        }
                    };
                    self.sink.record(&event);
                    return Ok(outcome);
                }
                Verdict::Amend(directive) => {
                    state.amend(&directive);
                    self.sink.record(&AttemptEvent::Amended {
                        attempt,
                        directive,
                        system: state.system().to_string(),
                    });
                }
                Verdict::Reject(err) => {
                    self.record_failure(attempt, &err);
                    return Err(err);
                }
            }
        }
    }

    /// Run one invocation on the calling thread.
    ///
    /// Builds a current-thread runtime for the duration of the call, so this
    /// must not be used from inside an async context; use [`ToolCaller::invoke`] there.
    pub fn invoke_blocking(&self, request: &ToolRequest) -> Result<ToolOutcome> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| ToolError::Config(format!("Failed to start runtime: {err}")))?;

        runtime.block_on(self.invoke(request))
    }

    fn assess(
        &self,
        request: &ToolRequest,
        mode: &PromptMode<'_>,
        state: &RetryState,
        text: String,
    ) -> Verdict {
        let attempt = state.attempt();
        let can_retry = request.force_tool_call && state.has_remaining();

        let extracted = if mode.is_multiple() {
            extract_multiple(&text)
        } else {
            extract_single(&text)
        };
        let mut calls = extracted.unwrap_or_default();

        if calls.is_empty() {
            self.sink.record(&AttemptEvent::NoCall { attempt });
            if can_retry {
                return Verdict::Amend(no_call_directive().to_string());
            }
            if !request.force_tool_call {
                return Verdict::Accept(ToolOutcome::Text(text));
            }
            return Verdict::Reject(ToolError::NoFunctionCall {
                attempts: attempt,
                last_response: text,
            });
        }

        if !mode.is_multiple() {
            calls.truncate(1);
        }

        if let Some(expected) = mode.pinned_tool() {
            if let Some(actual) = calls
                .first()
                .map(|call| call.name.as_str())
                .filter(|name| *name != expected)
            {
                self.sink.record(&AttemptEvent::Mismatch {
                    attempt,
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                });
                if can_retry {
                    return Verdict::Amend(tool_mismatch_directive(expected));
                }
                return Verdict::Reject(ToolError::ToolMismatch {
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                    attempts: attempt,
                });
            }
        }

        if request.validate_params {
            let errors = self.validator.validate(&calls, &request.tools);
            if !errors.is_empty() {
                self.sink.record(&AttemptEvent::InvalidParameters {
                    attempt,
                    errors: errors.clone(),
                });
                if can_retry {
                    return Verdict::Amend(validation_feedback(&errors));
                }
                return Verdict::Reject(ToolError::ParameterValidation {
                    errors,
                    attempts: attempt,
                });
            }
        }

        Verdict::Accept(into_outcome(mode, calls))
    }

    fn record_failure(&self, attempt: u32, err: &ToolError) {
        self.sink.record(&AttemptEvent::Failed {
            attempt,
            code: err.error_code().to_string(),
        });
    }
}

fn into_outcome(mode: &PromptMode<'_>, calls: Vec<ExtractedCall>) -> ToolOutcome {
    if mode.is_multiple() {
        return ToolOutcome::Calls(calls);
    }
    match calls.into_iter().next() {
        Some(call) => ToolOutcome::Call(call),
        None => ToolOutcome::Calls(Vec::new()),
    }
}
