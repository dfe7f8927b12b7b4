use datadrill_core::AgentRole;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Malformed {role} output: {reason}")]
    MalformedOutput { role: AgentRole, reason: String },

    #[error("Execution failed: {0}")]
    ExecutionFailed(#[from] sandbox::SandboxError),

    #[error("No termination marker within {max_turns} turns")]
    UnboundedLoop { max_turns: u32 },

    #[error("{role} call timed out after {seconds}s")]
    AgentTimeout { role: AgentRole, seconds: u64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("LLM error: {0}")]
    Llm(#[from] llm::LlmError),
}

impl OrchestratorError {
    /// Create a malformed-output error for a role.
    pub fn malformed(role: AgentRole, reason: impl Into<String>) -> Self {
        Self::MalformedOutput {
            role,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
