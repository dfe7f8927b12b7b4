//! The fixed multi-stage pipeline executed for one seed prompt.

use std::sync::Arc;

use datadrill_core::{AgentRole, ExplorationTask, Transcript};
use llm::{Agent, AgentContext};
use sandbox::CodeExecutor;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::conversation::ConversationLoop;
use crate::error::{OrchestratorError, Result};
use crate::prompts::RolePrompts;

/// How many trailing conversation turns are carried into the analysis
/// request.
const ANALYSIS_CARRYOVER_TURNS: usize = 3;

/// One agent binding per role. The runner never depends on a concrete
/// provider type.
#[derive(Clone)]
pub struct AgentSet {
    pub query: Arc<dyn Agent>,
    pub analyst: Arc<dyn Agent>,
    pub instructor: Arc<dyn Agent>,
}

/// Runs the per-prompt pipeline: conversation loop, one analysis turn,
/// and (when the branching factor allows follow-ups) one instruct turn.
///
/// Failures are absorbed into the returned task: a broken stage marks
/// the task failed and later stages are skipped, so one bad task never
/// takes down its layer.
pub struct TaskRunner {
    agents: AgentSet,
    executor: Arc<dyn CodeExecutor>,
    config: EngineConfig,
    query_context: AgentContext,
    analyst_context: AgentContext,
    instructor_context: AgentContext,
}

impl TaskRunner {
    pub fn new(agents: AgentSet, executor: Arc<dyn CodeExecutor>, config: EngineConfig) -> Self {
        let query_context =
            RolePrompts::query_context(&config.schema_context, &config.helper_docs);
        let analyst_context = RolePrompts::analyst_context();
        let instructor_context =
            RolePrompts::instructor_context(&config.schema_context, config.branching_factor);

        Self {
            agents,
            executor,
            config,
            query_context,
            analyst_context,
            instructor_context,
        }
    }

    pub async fn run(&self, seed_prompt: String) -> ExplorationTask {
        let mut task = ExplorationTask::new(seed_prompt, self.config.branching_factor);
        task.mark_running();
        info!(task_id = %task.id, seed = %task.seed_prompt, "Starting task pipeline");

        let conversation = ConversationLoop::new(
            self.agents.query.as_ref(),
            self.executor.as_ref(),
            &self.query_context,
            self.config.max_conversation_turns,
            self.config.call_timeout,
        );

        match conversation.run(&task.seed_prompt).await {
            Ok(transcript) => task.conversation = transcript,
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "Conversation stage failed");
                task.mark_failed(format!("conversation: {e}"));
                return task;
            }
        }

        match self.run_analysis(&task).await {
            Ok(reply) => task.analysis.push(AgentRole::Analyze, reply),
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "Analysis stage failed");
                task.mark_failed(format!("analysis: {e}"));
                return task;
            }
        }

        if self.config.branching_factor > 0 {
            match self.run_instruct(&task).await {
                Ok(reply) => {
                    let mut transcript = Transcript::new();
                    transcript.push(AgentRole::Instruct, reply);
                    task.instruction = Some(transcript);
                }
                Err(e) => {
                    warn!(task_id = %task.id, error = %e, "Instruct stage failed");
                    task.mark_failed(format!("instruct: {e}"));
                    return task;
                }
            }
        }

        task.mark_done();
        info!(task_id = %task.id, turns = task.conversation.len(), "Task pipeline done");
        task
    }

    /// Single analysis turn over the tail of the conversation.
    async fn run_analysis(&self, task: &ExplorationTask) -> Result<String> {
        let carryover: Vec<&str> = task
            .conversation
            .last_n(ANALYSIS_CARRYOVER_TURNS)
            .iter()
            .map(|turn| turn.content.as_str())
            .collect();
        let request = RolePrompts::analysis_request(&carryover.join("\n"));

        self.call(
            AgentRole::Analyze,
            self.agents.analyst.as_ref(),
            &self.analyst_context,
            &request,
        )
        .await
    }

    /// Single instruct turn; only reached when `branching_factor > 0`.
    async fn run_instruct(&self, task: &ExplorationTask) -> Result<String> {
        let executed: Vec<&str> = task
            .conversation
            .last_n(2)
            .iter()
            .map(|turn| turn.content.as_str())
            .collect();
        let analysis = task
            .analysis
            .last()
            .map(|turn| turn.content.as_str())
            .unwrap_or_default();
        let request =
            RolePrompts::instruction_request(&task.seed_prompt, &executed.join("\n"), analysis);

        self.call(
            AgentRole::Instruct,
            self.agents.instructor.as_ref(),
            &self.instructor_context,
            &request,
        )
        .await
    }

    async fn call(
        &self,
        role: AgentRole,
        agent: &dyn Agent,
        context: &AgentContext,
        input: &str,
    ) -> Result<String> {
        let reply = tokio::time::timeout(
            self.config.call_timeout,
            agent.send(context, &[], input),
        )
        .await
        .map_err(|_| OrchestratorError::AgentTimeout {
            role,
            seconds: self.config.call_timeout.as_secs(),
        })??;
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ErrAgent, ScriptedAgent, StaticAgent, StaticExecutor};
    use datadrill_core::TaskStatus;

    fn runner_with(
        query: Arc<dyn Agent>,
        analyst: Arc<dyn Agent>,
        instructor: Arc<dyn Agent>,
        config: EngineConfig,
    ) -> TaskRunner {
        TaskRunner::new(
            AgentSet {
                query,
                analyst,
                instructor,
            },
            Arc::new(StaticExecutor::succeeding("3 rows")),
            config,
        )
    }

    #[tokio::test]
    async fn test_full_pipeline_builds_all_transcripts() {
        let runner = runner_with(
            Arc::new(ScriptedAgent::new([
                "```python\nprint(1)\n```",
                "Answered.\nTERMINATE",
            ])),
            Arc::new(StaticAgent::new("Looks consistent.")),
            Arc::new(StaticAgent::new(
                r#"{"thinking": "t", "instructions": ["next"]}"#,
            )),
            EngineConfig::new().with_branching_factor(1),
        );

        let task = runner.run("peak traffic time".to_string()).await;

        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.conversation.len(), 3);
        assert_eq!(task.analysis.len(), 1);
        assert!(task.instruction.is_some());
        assert!(task.failure.is_none());
    }

    #[tokio::test]
    async fn test_zero_branching_factor_skips_instruct_stage() {
        let instructor = Arc::new(StaticAgent::new("should never run"));
        let runner = runner_with(
            Arc::new(ScriptedAgent::new(["Done.\nTERMINATE"])),
            Arc::new(StaticAgent::new("fine")),
            instructor.clone(),
            EngineConfig::new().with_branching_factor(0),
        );

        let task = runner.run("q".to_string()).await;

        assert_eq!(task.status, TaskStatus::Done);
        assert!(task.instruction.is_none());
        assert_eq!(instructor.calls(), 0);
    }

    #[tokio::test]
    async fn test_conversation_failure_marks_task_failed() {
        let analyst = Arc::new(StaticAgent::new("unreached"));
        let runner = runner_with(
            Arc::new(StaticAgent::new("never terminates")),
            analyst.clone(),
            Arc::new(StaticAgent::new("unreached")),
            EngineConfig::new()
                .with_branching_factor(1)
                .with_max_conversation_turns(2),
        );

        let task = runner.run("q".to_string()).await;

        assert!(task.is_failed());
        assert!(task.failure.as_deref().unwrap().starts_with("conversation:"));
        assert_eq!(analyst.calls(), 0);
    }

    #[tokio::test]
    async fn test_analysis_failure_marks_task_failed() {
        let runner = runner_with(
            Arc::new(ScriptedAgent::new(["Done.\nTERMINATE"])),
            Arc::new(ErrAgent),
            Arc::new(StaticAgent::new("unreached")),
            EngineConfig::new().with_branching_factor(1),
        );

        let task = runner.run("q".to_string()).await;

        assert!(task.is_failed());
        assert!(task.failure.as_deref().unwrap().starts_with("analysis:"));
        assert!(task.instruction.is_none());
    }
}
