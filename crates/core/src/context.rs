//! Execution-context interface to the host where jobs run.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

/// Captured output of one command run through a context.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Process return code.
    pub code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the command exited zero.
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// File and process primitives on the host where jobs run.
///
/// A context is bound to one submission: relative file names resolve under
/// the remote root, and the submission hash names the staged archives. The
/// context is the sole coordination medium between the submitting and the
/// polling side.
#[async_trait]
pub trait Context: Send + Sync {
    /// Directory under which all job artifacts live.
    fn remote_root(&self) -> &Path;

    /// Hash of the submission this context is bound to.
    fn submission_hash(&self) -> &str;

    /// Write `content` to `fname` under the remote root, replacing any
    /// previous content.
    async fn write_file(&self, fname: &str, content: &str) -> Result<()>;

    /// Read the content of `fname` under the remote root.
    async fn read_file(&self, fname: &str) -> Result<String>;

    /// Whether `fname` exists under the remote root.
    async fn check_file_exists(&self, fname: &str) -> bool;

    /// Run a shell command in the remote root, capturing the exit code and
    /// both output streams. A nonzero exit code is data for the caller, not
    /// an `Err`.
    async fn run_command(&self, cmd: &str) -> Result<CommandOutput>;
}
