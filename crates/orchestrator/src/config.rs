use std::time::Duration;

use crate::collector::OutputFormat;
use crate::error::{OrchestratorError, Result};
use crate::prompts;

const DEFAULT_MAX_DEPTH: u32 = 2;
const DEFAULT_BRANCHING_FACTOR: u32 = 2;
const DEFAULT_MAX_CONVERSATION_TURNS: u32 = 10;
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Run-wide configuration for the exploration engine.
///
/// Read-only once the run starts; tasks share it by reference.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of layers in the task tree.
    pub max_depth: u32,
    /// Maximum follow-up prompts one task may produce. Zero disables
    /// the instruct stage entirely.
    pub branching_factor: u32,
    /// Cap on query-agent turns in one conversation loop.
    pub max_conversation_turns: u32,
    /// Deadline for each agent call.
    pub call_timeout: Duration,
    /// How instruct-stage replies are parsed.
    pub output_format: OutputFormat,
    /// Schema description injected into the query/instruct contexts.
    pub schema_context: String,
    /// Docs for the sandbox helper functions, appended to the query context.
    pub helper_docs: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            branching_factor: DEFAULT_BRANCHING_FACTOR,
            max_conversation_turns: DEFAULT_MAX_CONVERSATION_TURNS,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            output_format: OutputFormat::default(),
            schema_context: prompts::DEFAULT_SCHEMA.to_string(),
            helper_docs: prompts::EXECUTE_SQL_DOCS.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_branching_factor(mut self, branching_factor: u32) -> Self {
        self.branching_factor = branching_factor;
        self
    }

    pub fn with_max_conversation_turns(mut self, max_turns: u32) -> Self {
        self.max_conversation_turns = max_turns;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_schema_context(mut self, schema: impl Into<String>) -> Self {
        self.schema_context = schema.into();
        self
    }

    pub fn with_helper_docs(mut self, docs: impl Into<String>) -> Self {
        self.helper_docs = docs.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_conversation_turns == 0 {
            return Err(OrchestratorError::InvalidConfig(
                "max_conversation_turns must be at least 1".to_string(),
            ));
        }
        if self.call_timeout.is_zero() {
            return Err(OrchestratorError::InvalidConfig(
                "call_timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
