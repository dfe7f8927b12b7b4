use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::role::AgentRole;

/// One (speaker, content) turn in a conversational stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptTurn {
    pub speaker: AgentRole,
    pub content: String,
    pub at: DateTime<Utc>,
}

impl TranscriptTurn {
    pub fn new(speaker: AgentRole, content: impl Into<String>) -> Self {
        Self {
            speaker,
            content: content.into(),
            at: Utc::now(),
        }
    }
}

/// Ordered sequence of turns for one stage of a task pipeline.
///
/// A transcript is owned by the task that produced it and is not
/// modified once its stage has ended; collectors only read it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<TranscriptTurn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, speaker: AgentRole, content: impl Into<String>) {
        self.turns.push(TranscriptTurn::new(speaker, content));
    }

    pub fn turns(&self) -> &[TranscriptTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&TranscriptTurn> {
        self.turns.last()
    }

    /// The trailing `n` turns, fewer when the transcript is shorter.
    pub fn last_n(&self, n: usize) -> &[TranscriptTurn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_last() {
        let mut transcript = Transcript::new();
        assert!(transcript.is_empty());

        transcript.push(AgentRole::Query, "SELECT 1");
        transcript.push(AgentRole::Execute, "1");

        assert_eq!(transcript.len(), 2);
        let last = transcript.last().unwrap();
        assert_eq!(last.speaker, AgentRole::Execute);
        assert_eq!(last.content, "1");
    }

    #[test]
    fn test_last_n_clamps() {
        let mut transcript = Transcript::new();
        transcript.push(AgentRole::Query, "a");

        assert_eq!(transcript.last_n(2).len(), 1);

        transcript.push(AgentRole::Execute, "b");
        transcript.push(AgentRole::Query, "c");

        let tail = transcript.last_n(2);
        assert_eq!(tail[0].content, "b");
        assert_eq!(tail[1].content, "c");
    }
}
