pub mod call;
pub mod message;
pub mod outcome;

pub use call::{parse_tools, ExtractedCall, ToolChoice, ToolSchema};
pub use message::{parse_messages, ChatMessage, ContentBlock, ImageSource, MessageContent, Role};
pub use outcome::ToolOutcome;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, ToolError};

fn from_value_at_path<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_path_to_error::deserialize(value)
        .map_err(|err| ToolError::SchemaValidation(format!("invalid {}: {}", what, err)))
}
