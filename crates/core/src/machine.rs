//! Backend abstraction shared by all cluster adapters.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Job, JobStatus};
use crate::script::Script;
use crate::sentinel;

/// Backend selector, keyed from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineKind {
    /// YARN distributed-shell launcher.
    DistributedShell,
}

/// A cluster backend: generates job scripts, submits them detached, and
/// classifies their state from external signals.
///
/// `gen_script_command` and `gen_script` are shared across backends; the
/// remaining operations are backend-specific.
#[async_trait]
pub trait Machine: Send + Sync {
    /// Script header; caller-overridable through a template file.
    fn gen_script_header(&self, job: &Job) -> Result<String>;

    /// Environment setup: module directives, sourced files, exports,
    /// prepend lines, fail-flag initialization, input staging.
    fn gen_script_env(&self, job: &Job) -> String;

    /// Teardown: barrier, fail-flag check, archive/upload/tag on success,
    /// `exit 1` otherwise, append lines after the branch.
    fn gen_script_end(&self, job: &Job) -> String;

    /// Per-task command bodies.
    ///
    /// Each task runs in its own work dir. A nonzero exit writes `1` into
    /// the job fail flag; a zero exit writes the task tag so a re-submitted
    /// job skips the task.
    fn gen_script_command(&self, job: &Job) -> String {
        let flag = sentinel::fail_flag_name(&job.job_hash);
        let mut script = Script::new();
        for task in &job.tasks {
            let tag = sentinel::task_tag_name(&task.task_hash());
            script
                .line("cd $REMOTE_ROOT")
                .line(format!("cd {}", task.work_path))
                .line("test $? -ne 0 && exit 1")
                .line(format!("if [ ! -f {tag} ]; then"))
                .line(format!(
                    "    ( {} ) 1>>{} 2>>{}",
                    task.command, task.outlog, task.errlog
                ))
                .line("    if test $? -ne 0; then")
                .line(format!("        echo 1 > $REMOTE_ROOT/{flag}"))
                .line("    else")
                .line(format!("        touch {tag}"))
                .line("    fi")
                .line("fi")
                .blank();
        }
        script.render()
    }

    /// Full script: header, environment, task commands, teardown, in that
    /// order.
    fn gen_script(&self, job: &Job) -> Result<String> {
        let mut script = self.gen_script_header(job)?;
        script.push_str(&self.gen_script_env(job));
        script.push_str(&self.gen_script_command(job));
        script.push_str(&self.gen_script_end(job));
        Ok(script)
    }

    /// Write the script, launch it detached through the context, persist
    /// the captured process id.
    ///
    /// Assigns `job.job_id` exactly once, on success. Re-submission
    /// overwrites the process-id and output files.
    async fn do_submit(&self, job: &mut Job) -> Result<String>;

    /// Classify the job from process liveness plus the finished tag.
    ///
    /// Tag presence always wins over a dead process; an empty `job_id`
    /// short-circuits to `Unsubmitted` without any remote query.
    async fn check_status(&self, job: &Job) -> Result<JobStatus>;

    /// Whether the authoritative success marker exists.
    async fn check_finish_tag(&self, job: &Job) -> bool;
}
