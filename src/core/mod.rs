pub mod attempt;
pub mod request;
pub mod retry;
pub mod tool_caller;

pub use attempt::{AttemptEvent, AttemptSink, TracingSink};
pub use request::{ToolRequest, DEFAULT_MAX_ATTEMPTS};
pub use retry::RetryState;
pub use tool_caller::ToolCaller;
