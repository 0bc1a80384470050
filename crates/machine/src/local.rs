//! Local execution context: the dispatcher runs on the cluster login node
//! and reaches shared storage through the local filesystem.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;

use dispatcher_core::context::{CommandOutput, Context};
use dispatcher_core::error::Result;
use dispatcher_core::model::Submission;

/// Context over a local directory; commands run through `bash -c` with the
/// remote root as working directory.
#[derive(Debug, Clone)]
pub struct LocalContext {
    remote_root: PathBuf,
    submission_hash: String,
}

impl LocalContext {
    /// Bind a context to `submission`, with all artifacts under
    /// `remote_root`.
    pub fn bind(remote_root: impl Into<PathBuf>, submission: &Submission) -> Self {
        Self {
            remote_root: remote_root.into(),
            submission_hash: submission.submission_hash.clone(),
        }
    }
}

#[async_trait]
impl Context for LocalContext {
    fn remote_root(&self) -> &Path {
        &self.remote_root
    }

    fn submission_hash(&self) -> &str {
        &self.submission_hash
    }

    async fn write_file(&self, fname: &str, content: &str) -> Result<()> {
        tokio::fs::write(self.remote_root.join(fname), content).await?;
        Ok(())
    }

    async fn read_file(&self, fname: &str) -> Result<String> {
        Ok(tokio::fs::read_to_string(self.remote_root.join(fname)).await?)
    }

    async fn check_file_exists(&self, fname: &str) -> bool {
        tokio::fs::try_exists(self.remote_root.join(fname))
            .await
            .unwrap_or(false)
    }

    async fn run_command(&self, cmd: &str) -> Result<CommandOutput> {
        let out = tokio::process::Command::new("bash")
            .arg("-c")
            .arg(cmd)
            .current_dir(&self.remote_root)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;
        Ok(CommandOutput {
            code: out.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
        })
    }
}
