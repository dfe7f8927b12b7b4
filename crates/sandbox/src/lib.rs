pub mod error;
pub mod extract;
pub mod local;

pub use error::{Result, SandboxError};
pub use extract::{extract_code_blocks, CodeBlock};
pub use local::{CodeExecutor, ExecutionOutcome, LocalExecutor};
