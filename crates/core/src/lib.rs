pub mod domain;

pub use domain::role::AgentRole;
pub use domain::task::{ExplorationTask, TaskOutput, TaskStatus};
pub use domain::transcript::{Transcript, TranscriptTurn};
pub use domain::tree::{Layer, TaskTree};
