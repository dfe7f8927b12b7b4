use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transcript::Transcript;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Done,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "done" => Some(Self::Done),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// One seed prompt's full pipeline run.
///
/// Holds the transcripts of each stage: the query↔execute conversation,
/// the single analysis turn, and the instruct turn when a branching
/// factor above zero allows follow-up prompts. A failed task stays in
/// its layer with `status == Failed` and the stage that broke recorded
/// in `failure`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorationTask {
    pub id: Uuid,
    pub seed_prompt: String,
    pub branching_factor: u32,
    pub status: TaskStatus,
    pub conversation: Transcript,
    pub analysis: Transcript,
    pub instruction: Option<Transcript>,
    pub failure: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ExplorationTask {
    pub fn new(seed_prompt: impl Into<String>, branching_factor: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            seed_prompt: seed_prompt.into(),
            branching_factor,
            status: TaskStatus::default(),
            conversation: Transcript::new(),
            analysis: Transcript::new(),
            instruction: None,
            failure: None,
            created_at: Utc::now(),
        }
    }

    pub fn mark_running(&mut self) {
        self.status = TaskStatus::Running;
    }

    pub fn mark_done(&mut self) {
        self.status = TaskStatus::Done;
    }

    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.status = TaskStatus::Failed;
        self.failure = Some(reason.into());
    }

    pub fn is_failed(&self) -> bool {
        self.status == TaskStatus::Failed
    }
}

/// Read-only view derived from a completed task's transcripts.
///
/// `follow_up_prompts` is ordered by extraction order and never longer
/// than the task's branching factor; a failed task carries the empty
/// output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub executed_result: String,
    pub analysis_text: String,
    pub follow_up_prompts: Vec<String>,
}

impl TaskOutput {
    pub fn is_empty(&self) -> bool {
        self.executed_result.is_empty()
            && self.analysis_text.is_empty()
            && self.follow_up_prompts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_creation() {
        let task = ExplorationTask::new("peak traffic time", 2);

        assert_eq!(task.seed_prompt, "peak traffic time");
        assert_eq!(task.branching_factor, 2);
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.conversation.is_empty());
        assert!(task.instruction.is_none());
        assert!(task.failure.is_none());
    }

    #[test]
    fn test_task_failure_marking() {
        let mut task = ExplorationTask::new("q", 1);
        task.mark_running();
        assert_eq!(task.status, TaskStatus::Running);

        task.mark_failed("conversation exceeded turn cap");
        assert!(task.is_failed());
        assert_eq!(
            task.failure.as_deref(),
            Some("conversation exceeded turn cap")
        );
    }

    #[test]
    fn test_status_round_trip() {
        assert_eq!(TaskStatus::parse("failed"), Some(TaskStatus::Failed));
        assert_eq!(TaskStatus::parse("unknown"), None);
        assert_eq!(TaskStatus::Done.as_str(), "done");
    }

    #[test]
    fn test_empty_output() {
        assert!(TaskOutput::default().is_empty());

        let output = TaskOutput {
            follow_up_prompts: vec!["next".to_string()],
            ..Default::default()
        };
        assert!(!output.is_empty());
    }
}
