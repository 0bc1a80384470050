//! Shared test support: an in-memory execution context and job fixtures.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use dispatcher_core::context::{CommandOutput, Context};
use dispatcher_core::error::Result;
use dispatcher_core::model::{EnvValue, Job, Resources, Task};

/// In-memory context recording every call, for driving a backend without a
/// cluster.
pub struct MockContext {
    remote_root: PathBuf,
    submission_hash: String,
    files: Mutex<HashMap<String, String>>,
    command_results: Mutex<VecDeque<CommandOutput>>,
    commands_run: Mutex<Vec<String>>,
}

impl MockContext {
    pub fn new(submission_hash: &str) -> Self {
        Self {
            remote_root: PathBuf::from("/data/jobs"),
            submission_hash: submission_hash.to_string(),
            files: Mutex::new(HashMap::new()),
            command_results: Mutex::new(VecDeque::new()),
            commands_run: Mutex::new(Vec::new()),
        }
    }

    /// Queue the result for the next `run_command` call.
    pub fn push_result(&self, code: i32, stdout: &str, stderr: &str) {
        self.command_results
            .lock()
            .unwrap()
            .push_back(CommandOutput {
                code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            });
    }

    pub fn put_file(&self, name: &str, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), content.to_string());
    }

    pub fn file(&self, name: &str) -> Option<String> {
        self.files.lock().unwrap().get(name).cloned()
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands_run.lock().unwrap().clone()
    }
}

#[async_trait]
impl Context for MockContext {
    fn remote_root(&self) -> &Path {
        &self.remote_root
    }

    fn submission_hash(&self) -> &str {
        &self.submission_hash
    }

    async fn write_file(&self, fname: &str, content: &str) -> Result<()> {
        self.put_file(fname, content);
        Ok(())
    }

    async fn read_file(&self, fname: &str) -> Result<String> {
        self.file(fname).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, fname.to_string()).into()
        })
    }

    async fn check_file_exists(&self, fname: &str) -> bool {
        self.files.lock().unwrap().contains_key(fname)
    }

    async fn run_command(&self, cmd: &str) -> Result<CommandOutput> {
        self.commands_run.lock().unwrap().push(cmd.to_string());
        Ok(self
            .command_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected remote command: {cmd}")))
    }
}

/// Resources matching the canonical ordering fixture.
pub fn sample_resources() -> Resources {
    let mut envs = indexmap::IndexMap::new();
    envs.insert("X".to_string(), EnvValue::One("1".to_string()));
    envs.insert(
        "Y".to_string(),
        EnvValue::Many(vec!["2".to_string(), "3".to_string()]),
    );

    Resources {
        queue_name: "root.gpu".into(),
        image_name: "ubuntu:22.04".into(),
        launcher_path: "/opt/yarn".into(),
        memory_gb: 8,
        cpu_per_node: 4,
        module_purge: true,
        module_unload_list: vec!["A".into(), "B".into()],
        module_list: vec!["C".into()],
        source_list: vec!["s1".into()],
        envs,
        ..Resources::default()
    }
}

/// Three-task job over `sample_resources`.
pub fn sample_job() -> Job {
    let tasks = vec![
        Task::new("echo a", "d1"),
        Task::new("echo b", "d2"),
        Task::new("echo c", "d3"),
    ];
    Job::new(tasks, sample_resources())
}
