//! Scripted agent and executor fakes for engine tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use llm::{Agent, AgentContext, ChatMessage, LlmError};
use sandbox::{CodeExecutor, ExecutionOutcome, SandboxError};

/// Replies from a fixed script, one per call, in order.
pub struct ScriptedAgent {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedAgent {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    async fn send(
        &self,
        _context: &AgentContext,
        _history: &[ChatMessage],
        _input: &str,
    ) -> llm::Result<String> {
        self.replies
            .lock()
            .expect("script lock")
            .pop_front()
            .ok_or(LlmError::EmptyResponse)
    }
}

/// Always replies with the same text; counts calls.
pub struct StaticAgent {
    reply: String,
    calls: AtomicU32,
}

impl StaticAgent {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Agent for StaticAgent {
    async fn send(
        &self,
        _context: &AgentContext,
        _history: &[ChatMessage],
        _input: &str,
    ) -> llm::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

/// Always fails; used to exercise task-level failure isolation.
pub struct ErrAgent;

#[async_trait]
impl Agent for ErrAgent {
    async fn send(
        &self,
        _context: &AgentContext,
        _history: &[ChatMessage],
        _input: &str,
    ) -> llm::Result<String> {
        Err(LlmError::EmptyResponse)
    }
}

/// Returns a fixed outcome, optionally erroring on the first call.
pub struct StaticExecutor {
    outcome: ExecutionOutcome,
    first_error: Mutex<Option<SandboxError>>,
}

impl StaticExecutor {
    pub fn with_outcome(outcome: ExecutionOutcome) -> Self {
        Self {
            outcome,
            first_error: Mutex::new(None),
        }
    }

    pub fn succeeding(stdout: impl Into<String>) -> Self {
        Self::with_outcome(ExecutionOutcome {
            stdout: stdout.into(),
            stderr: String::new(),
            success: true,
        })
    }

    pub fn failing(stderr: impl Into<String>) -> Self {
        Self::with_outcome(ExecutionOutcome {
            stdout: String::new(),
            stderr: stderr.into(),
            success: false,
        })
    }

    pub fn erroring_once_then(stdout: impl Into<String>, error: SandboxError) -> Self {
        let mut executor = Self::succeeding(stdout);
        executor.first_error = Mutex::new(Some(error));
        executor
    }
}

#[async_trait]
impl CodeExecutor for StaticExecutor {
    async fn execute(&self, _reply: &str) -> sandbox::Result<ExecutionOutcome> {
        if let Some(error) = self.first_error.lock().expect("error lock").take() {
            return Err(error);
        }
        Ok(self.outcome.clone())
    }
}
