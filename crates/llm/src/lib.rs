pub mod context;
pub mod error;
pub mod openai;
pub mod traits;

pub use context::AgentContext;
pub use error::{LlmError, Result};
pub use openai::OpenAiAgent;
pub use traits::{Agent, ChatMessage, ChatRole};
