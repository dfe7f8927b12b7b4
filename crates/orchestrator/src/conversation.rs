//! The query/execute conversation loop.
//!
//! Drives the alternation between the query agent and the sandbox until
//! the agent signals completion with the termination marker. Modeled as
//! an explicit state machine with an enforced turn cap so a marker that
//! never arrives cannot run the loop forever.

use std::time::Duration;

use datadrill_core::{AgentRole, Transcript};
use llm::{Agent, AgentContext, ChatMessage};
use sandbox::{CodeExecutor, SandboxError};
use tracing::{debug, warn};

use crate::error::{OrchestratorError, Result};

/// Literal token the query agent appends when the task is answered.
/// Never forwarded to downstream consumers as part of content.
pub const TERMINATION_MARKER: &str = "TERMINATE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Querying,
    Executing,
    Done,
    Failed,
}

/// True when the reply, stripped of trailing whitespace, ends with the
/// termination marker.
pub fn ends_with_marker(reply: &str) -> bool {
    reply.trim_end().ends_with(TERMINATION_MARKER)
}

pub struct ConversationLoop<'a> {
    query_agent: &'a dyn Agent,
    executor: &'a dyn CodeExecutor,
    context: &'a AgentContext,
    max_turns: u32,
    call_timeout: Duration,
}

impl<'a> ConversationLoop<'a> {
    pub fn new(
        query_agent: &'a dyn Agent,
        executor: &'a dyn CodeExecutor,
        context: &'a AgentContext,
        max_turns: u32,
        call_timeout: Duration,
    ) -> Self {
        Self {
            query_agent,
            executor,
            context,
            max_turns,
            call_timeout,
        }
    }

    /// Run the loop from a seed prompt and return the full transcript,
    /// final marker-bearing turn included; the collector strips it.
    pub async fn run(&self, seed_prompt: &str) -> Result<Transcript> {
        let mut transcript = Transcript::new();
        let mut history: Vec<ChatMessage> = Vec::new();
        let mut next_input = seed_prompt.to_string();
        let mut state = LoopState::Querying;
        let mut turns = 0u32;

        loop {
            match state {
                LoopState::Querying => {
                    if turns >= self.max_turns {
                        state = LoopState::Failed;
                        continue;
                    }

                    let reply = self.call_query(&history, &next_input).await?;
                    turns += 1;

                    history.push(ChatMessage::user(next_input.clone()));
                    history.push(ChatMessage::assistant(reply.clone()));

                    state = if ends_with_marker(&reply) {
                        LoopState::Done
                    } else {
                        LoopState::Executing
                    };
                    transcript.push(AgentRole::Query, reply);
                }
                LoopState::Executing => {
                    // Transcript always holds the query reply at this point.
                    let reply = transcript
                        .last()
                        .map(|turn| turn.content.clone())
                        .unwrap_or_default();

                    let content = self.execute_reply(&reply).await?;
                    transcript.push(AgentRole::Execute, content.clone());
                    next_input = content;
                    state = LoopState::Querying;
                }
                LoopState::Done => {
                    debug!(turns, "Conversation terminated");
                    return Ok(transcript);
                }
                LoopState::Failed => {
                    warn!(
                        max_turns = self.max_turns,
                        "Conversation exceeded turn cap without termination marker"
                    );
                    return Err(OrchestratorError::UnboundedLoop {
                        max_turns: self.max_turns,
                    });
                }
            }
        }
    }

    async fn call_query(&self, history: &[ChatMessage], input: &str) -> Result<String> {
        let reply = tokio::time::timeout(
            self.call_timeout,
            self.query_agent.send(self.context, history, input),
        )
        .await
        .map_err(|_| OrchestratorError::AgentTimeout {
            role: AgentRole::Query,
            seconds: self.call_timeout.as_secs(),
        })??;
        Ok(reply)
    }

    /// Run the sandbox on the agent's reply, mapping recoverable
    /// failures into corrective feedback for the next query turn.
    async fn execute_reply(&self, reply: &str) -> Result<String> {
        match self.executor.execute(reply).await {
            Ok(outcome) if outcome.success => {
                if outcome.stdout.trim().is_empty() {
                    Ok("exitcode: 0 (execution succeeded)\nCode output: (empty; remember to print the results)".to_string())
                } else {
                    Ok(outcome.stdout)
                }
            }
            Ok(outcome) => Ok(format!("execution failed:\n{}", outcome.stderr)),
            Err(SandboxError::NoCodeBlocks) => Ok(
                "No executable code block found in your reply. Put the python code inside a ```python fenced block.".to_string(),
            ),
            Err(e @ SandboxError::Timeout { .. }) => Ok(format!("execution failed:\n{e}")),
            // Infrastructure problems (unwritable workdir etc.) abort the stage.
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedAgent, StaticAgent, StaticExecutor};
    use sandbox::ExecutionOutcome;

    fn ctx() -> AgentContext {
        AgentContext::new(AgentRole::Query, "You write SQL.")
    }

    fn timeout() -> Duration {
        Duration::from_secs(5)
    }

    #[test]
    fn test_marker_detection() {
        assert!(ends_with_marker("done TERMINATE"));
        assert!(ends_with_marker("done\nTERMINATE\n  "));
        assert!(!ends_with_marker("TERMINATE was mentioned earlier"));
        assert!(!ends_with_marker("still working"));
    }

    #[tokio::test]
    async fn test_terminates_on_marker() {
        let agent = ScriptedAgent::new(["All answered.\nTERMINATE"]);
        let executor = StaticExecutor::succeeding("unused");
        let context = ctx();
        let conversation = ConversationLoop::new(&agent, &executor, &context, 10, timeout());

        let transcript = conversation.run("peak traffic time").await.expect("run");

        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.last().unwrap().speaker, AgentRole::Query);
    }

    #[tokio::test]
    async fn test_alternates_with_executor() {
        let agent = ScriptedAgent::new([
            "Plan.\n```python\nprint(1)\n```",
            "Result looks right.\nTERMINATE",
        ]);
        let executor = StaticExecutor::succeeding("42 rows");
        let context = ctx();
        let conversation = ConversationLoop::new(&agent, &executor, &context, 10, timeout());

        let transcript = conversation.run("seed").await.expect("run");

        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.turns()[1].speaker, AgentRole::Execute);
        assert_eq!(transcript.turns()[1].content, "42 rows");
    }

    #[tokio::test]
    async fn test_execution_failure_becomes_feedback() {
        let agent = ScriptedAgent::new([
            "```python\nbroken\n```",
            "Fixed it.\nTERMINATE",
        ]);
        let executor = StaticExecutor::failing("Traceback: syntax error");
        let context = ctx();
        let conversation = ConversationLoop::new(&agent, &executor, &context, 10, timeout());

        let transcript = conversation.run("seed").await.expect("run");

        let feedback = &transcript.turns()[1].content;
        assert!(feedback.contains("execution failed"));
        assert!(feedback.contains("Traceback: syntax error"));
    }

    #[tokio::test]
    async fn test_missing_code_block_becomes_feedback() {
        let agent = ScriptedAgent::new([
            "Here is the query in prose only.",
            "```python\nprint(1)\n```",
            "Done.\nTERMINATE",
        ]);
        let executor = StaticExecutor::erroring_once_then("ok", SandboxError::NoCodeBlocks);
        let context = ctx();
        let conversation = ConversationLoop::new(&agent, &executor, &context, 10, timeout());

        let transcript = conversation.run("seed").await.expect("run");

        assert!(transcript.turns()[1]
            .content
            .contains("No executable code block"));
    }

    #[tokio::test]
    async fn test_turn_cap_aborts_loop() {
        let agent = StaticAgent::new("never terminating");
        let executor = StaticExecutor::with_outcome(ExecutionOutcome {
            stdout: "partial".to_string(),
            stderr: String::new(),
            success: true,
        });
        let context = ctx();
        let conversation = ConversationLoop::new(&agent, &executor, &context, 3, timeout());

        let err = conversation.run("seed").await.unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::UnboundedLoop { max_turns: 3 }
        ));
        assert_eq!(agent.calls(), 3);
    }
}
