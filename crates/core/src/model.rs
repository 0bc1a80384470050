use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One shell command executed inside its own working directory on the
/// remote host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Shell command body.
    pub command: String,
    /// Working directory, relative to the remote root.
    pub work_path: String,
    /// File receiving the command's stdout, relative to `work_path`.
    #[serde(default = "default_outlog")]
    pub outlog: String,
    /// File receiving the command's stderr, relative to `work_path`.
    #[serde(default = "default_errlog")]
    pub errlog: String,
}

fn default_outlog() -> String {
    "log".to_string()
}

fn default_errlog() -> String {
    "err".to_string()
}

impl Task {
    /// Task with default log file names.
    pub fn new(command: impl Into<String>, work_path: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            work_path: work_path.into(),
            outlog: default_outlog(),
            errlog: default_errlog(),
        }
    }

    /// Stable content hash identifying this task within a submission.
    pub fn task_hash(&self) -> String {
        hex_sha256([self.work_path.as_str(), self.command.as_str()])
    }
}

/// Environment variable value: a single value, or an ordered list which
/// expands to one `export` line per element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    /// One `export KEY=value` line.
    One(String),
    /// One `export KEY=value` line per element, in order.
    Many(Vec<String>),
}

/// Caller-owned description of what a job may use on the cluster.
///
/// Read-only to the dispatcher for the duration of one job lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resources {
    /// Queue the launcher submits to.
    pub queue_name: String,
    /// Container image the job runs in.
    pub image_name: String,
    /// Directory holding the distributed-shell launcher JAR.
    pub launcher_path: String,
    /// Requested container memory in GB.
    #[serde(default = "default_memory_gb")]
    pub memory_gb: u64,
    /// Requested vcores per node.
    #[serde(default = "default_cpu_per_node")]
    pub cpu_per_node: u32,
    /// Tasks grouped into one job when a submission is built from a flat
    /// task list.
    #[serde(default = "default_group_size")]
    pub group_size: usize,
    /// Emit `module purge` before any other module directive.
    #[serde(default)]
    pub module_purge: bool,
    /// Modules unloaded, in order, before any load.
    #[serde(default)]
    pub module_unload_list: Vec<String>,
    /// Modules loaded, in order.
    #[serde(default)]
    pub module_list: Vec<String>,
    /// Files sourced, in order, after module setup.
    #[serde(default)]
    pub source_list: Vec<String>,
    /// Exported environment variables, in insertion order.
    #[serde(default)]
    pub envs: IndexMap<String, EnvValue>,
    /// Verbatim lines placed before the fail-flag boilerplate.
    #[serde(default)]
    pub prepend_script: Vec<String>,
    /// Verbatim lines placed after the success/failure branch of the
    /// teardown section.
    #[serde(default)]
    pub append_script: Vec<String>,
    /// Custom header template file; when set it replaces the built-in
    /// header entirely.
    #[serde(default)]
    pub script_header_template: Option<PathBuf>,
}

fn default_memory_gb() -> u64 {
    1
}

fn default_cpu_per_node() -> u32 {
    1
}

fn default_group_size() -> usize {
    1
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            queue_name: String::new(),
            image_name: String::new(),
            launcher_path: String::new(),
            memory_gb: default_memory_gb(),
            cpu_per_node: default_cpu_per_node(),
            group_size: default_group_size(),
            module_purge: false,
            module_unload_list: Vec::new(),
            module_list: Vec::new(),
            source_list: Vec::new(),
            envs: IndexMap::new(),
            prepend_script: Vec::new(),
            append_script: Vec::new(),
            script_header_template: None,
        }
    }
}

/// One schedulable unit: a group of tasks sharing one resource description,
/// submitted as a single launcher invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Content hash namespacing every on-storage artifact of this job.
    pub job_hash: String,
    /// Hash of the submission this job belongs to.
    #[serde(default)]
    pub submission_hash: String,
    /// Script file written to the remote root.
    pub script_file_name: String,
    /// Launcher process id; empty until the job is submitted.
    #[serde(default)]
    pub job_id: String,
    /// Tasks in execution order.
    pub tasks: Vec<Task>,
    /// Resource description shared by the tasks.
    pub resources: Resources,
}

impl Job {
    /// Build a job from tasks; the hash and script name derive from the
    /// member task hashes.
    pub fn new(tasks: Vec<Task>, resources: Resources) -> Self {
        let job_hash = hex_sha256(tasks.iter().map(|t| t.task_hash()));
        let script_file_name = format!("{job_hash}.sub");
        Self {
            job_hash,
            submission_hash: String::new(),
            script_file_name,
            job_id: String::new(),
            tasks,
            resources,
        }
    }

    /// Ordered working directories of the member tasks.
    pub fn task_work_paths(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.work_path.as_str())
    }
}

/// A group of jobs sharing the upload/download archive namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    /// Hash naming the staged archives of this submission.
    pub submission_hash: String,
    /// Member jobs.
    pub jobs: Vec<Job>,
}

impl Submission {
    /// Group jobs under one submission hash derived from the member job
    /// hashes.
    pub fn new(mut jobs: Vec<Job>) -> Self {
        let submission_hash = hex_sha256(jobs.iter().map(|j| j.job_hash.clone()));
        for job in &mut jobs {
            job.submission_hash = submission_hash.clone();
        }
        Self {
            submission_hash,
            jobs,
        }
    }

    /// Chunk a flat task list into jobs of `resources.group_size` tasks
    /// each.
    pub fn group(tasks: Vec<Task>, resources: &Resources) -> Self {
        let size = resources.group_size.max(1);
        let jobs = tasks
            .chunks(size)
            .map(|chunk| Job::new(chunk.to_vec(), resources.clone()))
            .collect();
        Self::new(jobs)
    }
}

/// Job state recovered purely from external signals: process liveness and
/// the finished tag on shared storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// No job id recorded yet.
    Unsubmitted,
    /// Launcher process alive, finished tag absent.
    Running,
    /// Finished tag present: authoritative success.
    Finished,
    /// Process gone without a finished tag: abnormal end.
    Terminated,
}

impl JobStatus {
    /// Whether a polling loop can stop watching this job.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Terminated)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Unsubmitted => write!(f, "unsubmitted"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Finished => write!(f, "finished"),
            JobStatus::Terminated => write!(f, "terminated"),
        }
    }
}

fn hex_sha256<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_ref());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}
