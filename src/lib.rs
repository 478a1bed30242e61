//! claude-tools-rs: prompt-driven function calling for chat models
//!
//! The model is instructed to answer with calls wrapped in
//! `<singlefunction>` / `<multiplefunctions>` containers. Responses are
//! extracted, validated against the declared tool schemas and, when they fall
//! short, retried with a corrective directive appended to the system prompt.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use claude_tools_rs::{AnthropicCaller, ChatMessage, ToolCaller, ToolRequest, ToolSchema};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tool_caller = ToolCaller::new(AnthropicCaller::from_env()?);
//!
//!     let weather = ToolSchema::new(
//!         "GetWeather",
//!         "Get the current weather for a location",
//!         json!({
//!             "type": "object",
//!             "properties": {"location": {"type": "string"}},
//!             "required": ["location"]
//!         }),
//!     );
//!     let request = ToolRequest::new(
//!         "claude-3-haiku-20240307",
//!         vec![ChatMessage::user("What's the weather like in New York?")],
//!         vec![weather],
//!     );
//!
//!     let call = tool_caller.invoke(&request).await?;
//!     println!("{}", call.to_json());
//!     Ok(())
//! }
//! ```

extern crate self as claude_tools_rs;

pub mod core;
pub mod error;
pub mod extract;
pub mod prompts;
pub mod schemas;
pub mod services;
pub mod types;

pub use core::{
    AttemptEvent, AttemptSink, RetryState, ToolCaller, ToolRequest, TracingSink,
    DEFAULT_MAX_ATTEMPTS,
};
pub use error::{Result, ToolError};
pub use extract::{extract_multiple, extract_single, extract_with_regex};
pub use prompts::{compose_system_prompt, PromptMode};
pub use schemas::{validate_call, validate_calls, FunctionSchema, Validator};
pub use services::{
    AnthropicCaller, AnthropicConfig, BedrockCaller, BedrockConfig, Blocking, BlockingModelCaller, CompletionRequest,
    ModelCaller, OpenAICompatibleCaller, RecordedRequest, ScriptedCaller,
};
pub use types::{
    parse_messages, parse_tools, ChatMessage, ContentBlock, ExtractedCall, ImageSource,
    MessageContent, Role, ToolChoice, ToolOutcome, ToolSchema,
};

pub use claude_tools_macros::function_schema;

pub use schemas as schema;

#[cfg(feature = "cli")]
pub mod cli;
