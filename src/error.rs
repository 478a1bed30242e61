use thiserror::Error;

/// Main error type for function-calling invocations
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller-supplied messages, tools or tool choice are structurally invalid.
    #[error("Schema validation error: {0}")]
    SchemaValidation(String),

    #[error("No function call produced after {attempts} attempt(s)")]
    NoFunctionCall {
        attempts: u32,
        last_response: String,
    },

    #[error("Tool mismatch: expected `{expected}` but the model called `{actual}`")]
    ToolMismatch {
        expected: String,
        actual: String,
        attempts: u32,
    },

    #[error("Parameter validation failed after {attempts} attempt(s): {}", errors.join("; "))]
    ParameterValidation { errors: Vec<String>, attempts: u32 },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A provider SDK failed to send the request or read the response.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Provider API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limit exceeded: retry after {retry_after}s")]
    RateLimit { retry_after: u64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ToolError>;

impl ToolError {
    /// True when the error was raised because the attempt budget ran out
    /// (or a pinned tool choice was violated), as opposed to bad input or
    /// a transport failure.
    pub fn is_exhaustion(&self) -> bool {
        matches!(
            self,
            ToolError::NoFunctionCall { .. }
                | ToolError::ToolMismatch { .. }
                | ToolError::ParameterValidation { .. }
        )
    }

    /// Whether re-issuing the same invocation later could succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ToolError::Http(err) => err.is_timeout() || err.is_connect(),
            ToolError::Api { status, .. } => *status >= 500,
            ToolError::RateLimit { .. } => true,
            ToolError::Transport(_) => true,
            ToolError::Timeout(_) => true,
            other => other.is_exhaustion(),
        }
    }

    /// Get the error code for structured responses
    pub fn error_code(&self) -> &'static str {
        match self {
            ToolError::Config(_) => "CONFIG_ERROR",
            ToolError::SchemaValidation(_) => "SCHEMA_VALIDATION_ERROR",
            ToolError::NoFunctionCall { .. } => "NO_FUNCTION_CALL",
            ToolError::ToolMismatch { .. } => "TOOL_MISMATCH",
            ToolError::ParameterValidation { .. } => "PARAMETER_VALIDATION_ERROR",
            ToolError::Http(_) => "HTTP_ERROR",
            ToolError::Transport(_) => "TRANSPORT_ERROR",
            ToolError::Api { .. } => "API_ERROR",
            ToolError::RateLimit { .. } => "RATE_LIMIT_ERROR",
            ToolError::Serialization(_) => "SERIALIZATION_ERROR",
            ToolError::Timeout(_) => "TIMEOUT_ERROR",
            ToolError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    /// Convert to a structured error payload
    pub fn to_error_payload(&self) -> serde_json::Value {
        let mut payload = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
                "recoverable": self.is_recoverable()
            }
        });

        if let ToolError::ParameterValidation { errors, .. } = self {
            payload["error"]["details"] = serde_json::json!(errors);
        }

        payload
    }
}
