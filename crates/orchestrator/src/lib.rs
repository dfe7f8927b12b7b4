pub mod collector;
pub mod config;
pub mod conversation;
pub mod engine;
pub mod error;
pub mod prompts;
pub mod task_runner;

pub use collector::{OutputCollector, OutputFormat};
pub use config::EngineConfig;
pub use conversation::{ConversationLoop, LoopState, TERMINATION_MARKER};
pub use engine::Orchestrator;
pub use error::{OrchestratorError, Result};
pub use task_runner::{AgentSet, TaskRunner};

#[cfg(test)]
mod test_support;
