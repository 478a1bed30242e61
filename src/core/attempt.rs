use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// One transition of the retry loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AttemptEvent {
    Started {
        attempt: u32,
        max_attempts: u32,
    },
    /// Raw model text for the attempt
    Response { attempt: u32, text: String },
    NoCall { attempt: u32 },
    Mismatch {
        attempt: u32,
        expected: String,
        actual: String,
    },
    InvalidParameters { attempt: u32, errors: Vec<String> },
    /// A corrective directive was appended; `system` is the full amended prompt
    Amended {
        attempt: u32,
        directive: String,
        system: String,
    },
    Succeeded { attempt: u32, calls: usize },
    /// No call found and calls were optional, the raw text is returned
    SoftReturn { attempt: u32 },
    Failed { attempt: u32, code: String },
}

impl AttemptEvent {
    pub fn attempt(&self) -> u32 {
        match self {
            AttemptEvent::Started { attempt, .. }
            | AttemptEvent::Response { attempt, .. }
            | AttemptEvent::NoCall { attempt }
            | AttemptEvent::Mismatch { attempt, .. }
            | AttemptEvent::InvalidParameters { attempt, .. }
            | AttemptEvent::Amended { attempt, .. }
            | AttemptEvent::Succeeded { attempt, .. }
            | AttemptEvent::SoftReturn { attempt }
            | AttemptEvent::Failed { attempt, .. } => *attempt,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            AttemptEvent::Started {
                attempt,
                max_attempts,
            } => format!("Attempt {}/{}: calling model", attempt, max_attempts),
            AttemptEvent::Response { attempt, text } => {
                format!("Attempt {}: model replied ({} chars)", attempt, text.len())
            }
            AttemptEvent::NoCall { attempt } => {
                format!("Attempt {}: no function call in response", attempt)
            }
            AttemptEvent::Mismatch {
                attempt,
                expected,
                actual,
            } => format!(
                "Attempt {}: expected `{}` but the model called `{}`",
                attempt, expected, actual
            ),
            AttemptEvent::InvalidParameters { attempt, errors } => format!(
                "Attempt {}: {} parameter error(s): {}",
                attempt,
                errors.len(),
                errors.join("; ")
            ),
            AttemptEvent::Amended { attempt, .. } => {
                format!("Attempt {}: amended system prompt for retry", attempt)
            }
            AttemptEvent::Succeeded { attempt, calls } => {
                format!("Attempt {}: accepted {} call(s)", attempt, calls)
            }
            AttemptEvent::SoftReturn { attempt } => {
                format!("Attempt {}: returning raw text", attempt)
            }
            AttemptEvent::Failed { attempt, code } => {
                format!("Attempt {}: failed with {}", attempt, code)
            }
        }
    }
}

/// Receives every [`AttemptEvent`] of an invocation
pub trait AttemptSink: Send + Sync {
    fn record(&self, event: &AttemptEvent);
}

/// Default sink forwarding events to `tracing`.
///
/// With `verbose` set, raw model text and amended system prompts are logged too.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink {
    pub verbose: bool,
}

impl TracingSink {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl AttemptSink for TracingSink {
    fn record(&self, event: &AttemptEvent) {
        let description = event.describe();
        match event {
            AttemptEvent::Started { .. } => {
                debug!(target: "claude_tools::retry", "{}", description)
            }
            AttemptEvent::Response { text, .. } => {
                if self.verbose {
                    info!(target: "claude_tools::retry", response = %text, "{}", description);
                }
            }
            AttemptEvent::NoCall { .. }
            | AttemptEvent::Mismatch { .. }
            | AttemptEvent::InvalidParameters { .. } => {
                warn!(target: "claude_tools::retry", "{}", description)
            }
            AttemptEvent::Amended { system, .. } => {
                if self.verbose {
                    info!(target: "claude_tools::retry", system = %system, "{}", description);
                } else {
                    info!(target: "claude_tools::retry", "{}", description);
                }
            }
            AttemptEvent::Succeeded { .. } | AttemptEvent::SoftReturn { .. } => {
                info!(target: "claude_tools::retry", "{}", description)
            }
            AttemptEvent::Failed { .. } => {
                warn!(target: "claude_tools::retry", "{}", description)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_mentions_attempt_and_details() {
        let event = AttemptEvent::Mismatch {
            attempt: 2,
            expected: "AddTodo".to_string(),
            actual: "MarkCompleted".to_string(),
        };
        assert_eq!(
            event.describe(),
            "Attempt 2: expected `AddTodo` but the model called `MarkCompleted`"
        );
        assert_eq!(event.attempt(), 2);
    }

    #[test]
    fn test_events_serialize_with_tag() {
        let event = AttemptEvent::Succeeded {
            attempt: 1,
            calls: 1,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "succeeded");
        assert_eq!(value["calls"], 1);
    }
}
