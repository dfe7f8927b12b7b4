//! Reduction of a completed task's transcripts into a `TaskOutput`.

use datadrill_core::{AgentRole, ExplorationTask, TaskOutput};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::conversation::TERMINATION_MARKER;
use crate::error::{OrchestratorError, Result};

/// How instruct-stage replies are parsed into follow-up prompts.
///
/// The two formats come from different design iterations of the
/// pipeline; a run picks one up front instead of sniffing the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// `1. instruction` lines with free-text continuations.
    NumberedList,
    /// JSON object with `thinking` and `instructions` keys.
    #[default]
    StructuredJson,
}

#[derive(Debug, Deserialize)]
struct RawInstructionReply {
    #[serde(default, alias = "analysis")]
    thinking: Option<String>,
    #[serde(default, alias = "further_instructions")]
    instructions: Vec<String>,
}

/// Pure function over a task's transcripts; collecting twice yields the
/// same output.
#[derive(Debug, Clone, Copy)]
pub struct OutputCollector {
    format: OutputFormat,
}

impl OutputCollector {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn collect(&self, task: &ExplorationTask) -> Result<TaskOutput> {
        if task.is_failed() {
            // Failed tasks stay in the tree but contribute nothing.
            return Ok(TaskOutput::default());
        }

        let executed_result = {
            let tail: Vec<&str> = task
                .conversation
                .last_n(2)
                .iter()
                .map(|turn| turn.content.as_str())
                .collect();
            strip_termination_marker(&tail.join("\n"))
        };

        let analysis_text = task
            .analysis
            .last()
            .map(|turn| strip_termination_marker(&turn.content))
            .unwrap_or_default();

        let mut follow_up_prompts = match &task.instruction {
            Some(transcript) => {
                let reply = transcript
                    .last()
                    .map(|turn| turn.content.as_str())
                    .unwrap_or_default();
                self.parse_instructions(reply)?
            }
            None => Vec::new(),
        };

        // The instruct context asks for at most branching_factor items,
        // but the reply is untrusted.
        follow_up_prompts.truncate(task.branching_factor as usize);

        debug!(
            task_id = %task.id,
            follow_ups = follow_up_prompts.len(),
            "Task output collected"
        );

        Ok(TaskOutput {
            executed_result,
            analysis_text,
            follow_up_prompts,
        })
    }

    fn parse_instructions(&self, reply: &str) -> Result<Vec<String>> {
        match self.format {
            OutputFormat::NumberedList => Ok(parse_numbered_list(reply)),
            OutputFormat::StructuredJson => {
                let json = extract_json_from_reply(reply);
                let raw: RawInstructionReply = serde_json::from_str(&json).map_err(|e| {
                    OrchestratorError::malformed(
                        AgentRole::Instruct,
                        format!("instruction JSON did not parse: {e}"),
                    )
                })?;

                if let Some(thinking) = &raw.thinking {
                    debug!(thinking_length = thinking.len(), "Instructor rationale");
                }

                Ok(raw.instructions)
            }
        }
    }
}

/// Remove the termination marker from the tail of `text`.
///
/// Only the terminating occurrence is stripped (dropping the line when
/// the marker stood alone on it); interior mentions are left intact.
pub fn strip_termination_marker(text: &str) -> String {
    let trimmed = text.trim_end();
    match trimmed.strip_suffix(TERMINATION_MARKER) {
        Some(rest) => rest.trim_end().to_string(),
        None => trimmed.to_string(),
    }
}

/// Parse `1. instruction` style lists. Lines that do not start a new
/// numbered item continue the current instruction.
fn parse_numbered_list(reply: &str) -> Vec<String> {
    let item_pattern =
        Regex::new(r"^\s*\d+\.\s+(.*)$").expect("Invalid numbered list regex pattern");

    let mut instructions: Vec<String> = Vec::new();
    for line in reply.lines() {
        if let Some(caps) = item_pattern.captures(line) {
            instructions.push(caps[1].trim().to_string());
        } else if let Some(current) = instructions.last_mut() {
            let continuation = line.trim();
            if !continuation.is_empty() {
                current.push('\n');
                current.push_str(continuation);
            }
        }
    }
    instructions
}

/// Lift the JSON object out of a reply that may wrap it in code fences
/// or surrounding prose.
fn extract_json_from_reply(reply: &str) -> String {
    if let Some(start) = reply.find("```json") {
        let body = &reply[start + 7..];
        if let Some(end) = body.find("```") {
            return body[..end].trim().to_string();
        }
    }

    if let (Some(start), Some(end)) = (reply.find('{'), reply.rfind('}')) {
        if start < end {
            return reply[start..=end].to_string();
        }
    }

    reply.trim().to_string()
}
