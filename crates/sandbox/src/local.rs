//! Local command-line execution of agent-emitted code.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Result, SandboxError};
use crate::extract::extract_code_blocks;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_INTERPRETER: &str = "python3";

/// Captured result of running the code from one reply.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutcome {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

/// Runs code extracted from an agent reply in an isolated directory.
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    async fn execute(&self, reply: &str) -> Result<ExecutionOutcome>;
}

/// Executes fenced python blocks with a local interpreter, scoped to a
/// working directory.
///
/// Each block is materialized as a throwaway file, run with a deadline,
/// and removed again whether the run succeeded, failed or timed out.
/// An optional prelude module (helper functions the query agent is told
/// about) is written into the working directory before the first block
/// runs.
pub struct LocalExecutor {
    work_dir: PathBuf,
    interpreter: String,
    timeout: Duration,
    prelude: Option<(String, String)>,
}

impl LocalExecutor {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            interpreter: DEFAULT_INTERPRETER.to_string(),
            timeout: DEFAULT_TIMEOUT,
            prelude: None,
        }
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Install a helper module (`{name}.py`) the emitted code may import.
    pub fn with_prelude(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.prelude = Some((name.into(), source.into()));
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    async fn ensure_work_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.work_dir).await?;

        if let Some((name, source)) = &self.prelude {
            let path = self.work_dir.join(format!("{name}.py"));
            fs::write(&path, source).await?;
        }

        Ok(())
    }

    async fn run_block(&self, source: &str) -> Result<std::process::Output> {
        let path = self.work_dir.join(format!("block_{}.py", Uuid::new_v4()));
        fs::write(&path, source).await?;

        let run = timeout(
            self.timeout,
            Command::new(&self.interpreter)
                .arg(&path)
                .current_dir(&self.work_dir)
                .kill_on_drop(true)
                .output(),
        )
        .await;

        // The block file is transient regardless of how the run ended.
        if let Err(e) = fs::remove_file(&path).await {
            warn!(path = %path.display(), error = %e, "Failed to remove block file");
        }

        match run {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(SandboxError::Io(e)),
            Err(_) => Err(SandboxError::Timeout {
                seconds: self.timeout.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl CodeExecutor for LocalExecutor {
    async fn execute(&self, reply: &str) -> Result<ExecutionOutcome> {
        let blocks: Vec<_> = extract_code_blocks(reply)
            .into_iter()
            .filter(|block| block.is_python())
            .collect();

        if blocks.is_empty() {
            return Err(SandboxError::NoCodeBlocks);
        }

        self.ensure_work_dir().await?;

        let mut outcome = ExecutionOutcome {
            success: true,
            ..Default::default()
        };

        for block in &blocks {
            debug!(
                work_dir = %self.work_dir.display(),
                bytes = block.source.len(),
                "Executing code block"
            );

            let output = self.run_block(&block.source).await?;
            outcome
                .stdout
                .push_str(&String::from_utf8_lossy(&output.stdout));
            outcome
                .stderr
                .push_str(&String::from_utf8_lossy(&output.stderr));

            // Later blocks often depend on earlier ones; stop at the
            // first failing block like a script would.
            if !output.status.success() {
                outcome.success = false;
                break;
            }
        }

        Ok(outcome)
    }
}
