use thiserror::Error;

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Reply contained no executable code block")]
    NoCodeBlocks,

    #[error("Execution timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

pub type Result<T> = std::result::Result<T, SandboxError>;
