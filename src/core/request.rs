use serde_json::{json, Map, Value};
use std::collections::HashSet;

use crate::{
    error::{Result, ToolError},
    schemas::FunctionSchema,
    types::{ChatMessage, ToolChoice, ToolSchema},
};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Inbound parameters of one function-calling invocation
#[derive(Debug, Clone)]
pub struct ToolRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolSchema>,
    /// Pins the single tool the model must use. Ignored in multi-tool mode.
    pub tool_choice: Option<ToolChoice>,
    pub multiple_tools: bool,
    pub task: Option<String>,
    pub validate_params: bool,
    pub force_tool_call: bool,
    pub max_attempts: u32,
    /// Passed to the model caller untouched
    pub options: Map<String, Value>,
}

impl ToolRequest {
    pub fn new(
        model: impl Into<String>,
        messages: Vec<ChatMessage>,
        tools: Vec<ToolSchema>,
    ) -> Self {
        Self {
            model: model.into(),
            messages,
            tools,
            tool_choice: None,
            multiple_tools: false,
            task: None,
            validate_params: true,
            force_tool_call: true,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            options: Map::new(),
        }
    }

    /// Declare the tool described by a typed parameter struct.
    pub fn with_tool<T: FunctionSchema>(mut self) -> Self {
        self.tools.push(T::tool_schema().clone());
        self
    }

    pub fn with_tool_choice(mut self, tool_choice: impl Into<ToolChoice>) -> Self {
        self.tool_choice = Some(tool_choice.into());
        self
    }

    pub fn with_multiple_tools(mut self, multiple_tools: bool) -> Self {
        self.multiple_tools = multiple_tools;
        self
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    pub fn with_validate_params(mut self, validate_params: bool) -> Self {
        self.validate_params = validate_params;
        self
    }

    pub fn with_force_tool_call(mut self, force_tool_call: bool) -> Self {
        self.force_tool_call = force_tool_call;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    pub fn with_max_tokens(self, max_tokens: u32) -> Self {
        self.with_option("max_tokens", json!(max_tokens))
    }

    /// Pre-flight checks run before any model call is made.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(ToolError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        if self.messages.is_empty() {
            return Err(ToolError::SchemaValidation(
                "messages must not be empty".to_string(),
            ));
        }
        for (index, message) in self.messages.iter().enumerate() {
            message.check(index)?;
        }

        if self.tools.is_empty() {
            return Err(ToolError::SchemaValidation(
                "at least one tool schema is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for (index, tool) in self.tools.iter().enumerate() {
            if tool.name.trim().is_empty() {
                return Err(ToolError::SchemaValidation(format!(
                    "tools[{}] has an empty name",
                    index
                )));
            }
            if !seen.insert(tool.name.as_str()) {
                return Err(ToolError::SchemaValidation(format!(
                    "duplicate tool name: {}",
                    tool.name
                )));
            }
            if !tool.parameters.is_object() {
                return Err(ToolError::SchemaValidation(format!(
                    "parameters of tool '{}' must be a JSON object",
                    tool.name
                )));
            }
        }

        if let Some(choice) = self.tool_choice.as_ref().filter(|_| !self.multiple_tools) {
            if !seen.contains(choice.name.as_str()) {
                return Err(ToolError::SchemaValidation(format!(
                    "tool_choice '{}' is not a declared tool",
                    choice.name
                )));
            }
        }

        Ok(())
    }
}
