pub mod anthropic_client;
pub mod bedrock_client;
pub mod caller;
pub mod mock;
pub mod openai_client;

pub use anthropic_client::{AnthropicCaller, AnthropicConfig};
pub use bedrock_client::{BedrockCaller, BedrockConfig};
pub use caller::{Blocking, BlockingModelCaller, CompletionRequest, ModelCaller};
pub use mock::{RecordedRequest, ScriptedCaller};
pub use openai_client::OpenAICompatibleCaller;
