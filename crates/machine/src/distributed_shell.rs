//! YARN distributed-shell backend.
//!
//! Submission launches the distributed-shell client as a detached process
//! through the execution context and records its pid; status is recovered
//! from process liveness plus the finished tag on shared storage, so a
//! poller restart never loses job history.

use std::sync::Arc;

use async_trait::async_trait;

use dispatcher_core::context::Context;
use dispatcher_core::error::{Error, Result};
use dispatcher_core::machine::Machine;
use dispatcher_core::model::{EnvValue, Job, JobStatus};
use dispatcher_core::script::Script;
use dispatcher_core::sentinel;
use dispatcher_core::template;

/// Application-name prefix shown in the resource manager UI.
const APP_NAME_PREFIX: &str = "dispatcher";

/// Shared-memory size handed to each container.
const CONTAINER_SHM_SIZE: &str = "600m";

/// Memory for the distributed-shell application master, in MB.
const MASTER_MEMORY_MB: u32 = 1024;

/// Vcores for the application master.
const MASTER_VCORES: u32 = 2;

const DEFAULT_HEADER: &str = "#!/bin/bash -l\nset -x\n";

/// Backend submitting jobs through the YARN distributed-shell launcher.
pub struct DistributedShell {
    ctx: Arc<dyn Context>,
}

impl DistributedShell {
    /// Backend over the given execution context.
    pub fn new(ctx: Arc<dyn Context>) -> Self {
        Self { ctx }
    }

    /// Launcher invocation submitting the job script to the cluster.
    ///
    /// One container per job; the job's own script enforces task ordering
    /// inside it.
    fn gen_submit_command(&self, job: &Job) -> String {
        let r = &job.resources;
        let jar = format!(
            "{}/hadoop-yarn-applications-distributedshell-*.jar",
            r.launcher_path
        );
        format!(
            "hadoop jar {jar} org.apache.hadoop.yarn.applications.distributedshell.Client \
             -jar {jar} -queue {queue} -appname \"distributedshell_{prefix}_{hash}\" \
             -shell_env YARN_CONTAINER_RUNTIME_TYPE=docker \
             -shell_env YARN_CONTAINER_RUNTIME_DOCKER_IMAGE={image} \
             -shell_env ENV_DOCKER_CONTAINER_SHM_SIZE='{shm}' \
             -master_memory {master_mem} -master_vcores {master_vcores} -num_containers 1 \
             -container_resources memory-mb={mem_mb},vcores={vcores} \
             -shell_script /tmp/{script}",
            queue = r.queue_name,
            prefix = APP_NAME_PREFIX,
            hash = job.job_hash,
            image = r.image_name,
            shm = CONTAINER_SHM_SIZE,
            master_mem = MASTER_MEMORY_MB,
            master_vcores = MASTER_VCORES,
            mem_mb = r.memory_gb * 1024,
            vcores = r.cpu_per_node,
            script = job.script_file_name,
        )
    }
}

#[async_trait]
impl Machine for DistributedShell {
    fn gen_script_header(&self, job: &Job) -> Result<String> {
        match &job.resources.script_header_template {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| Error::Template(format!("read {}: {e}", path.display())))?;
                template::render_header(&text, &job.resources)
            }
            None => Ok(DEFAULT_HEADER.to_string()),
        }
    }

    fn gen_script_env(&self, job: &Job) -> String {
        let r = &job.resources;
        let flag = sentinel::fail_flag_name(&job.job_hash);
        let upload = sentinel::upload_archive_name(self.ctx.submission_hash());
        let remote_root = self.ctx.remote_root().display();

        let mut script = Script::new();
        if r.module_purge {
            script.line("module purge");
        }
        for module in &r.module_unload_list {
            script.line(format!("module unload {module}"));
        }
        for module in &r.module_list {
            script.line(format!("module load {module}"));
        }
        for file in &r.source_list {
            script.line(format!("{{ source {file}; }}"));
        }
        for (key, value) in &r.envs {
            match value {
                EnvValue::One(v) => {
                    script.line(format!("export {key}={v}"));
                }
                EnvValue::Many(vs) => {
                    for v in vs {
                        script.line(format!("export {key}={v}"));
                    }
                }
            }
        }
        script.extend(r.prepend_script.iter().cloned());

        // The flag must exist before any task runs; a failed write here
        // invalidates the whole attempt.
        script
            .blank()
            .line("REMOTE_ROOT=`pwd`")
            .line(format!("echo 0 > {flag}"))
            .line("test $? -ne 0 && exit 1")
            .blank()
            .line(format!("if ! ls {upload} 1>/dev/null 2>&1; then"))
            .line(format!("    hadoop fs -get {remote_root}/*.tgz ."))
            .line("fi")
            .line("for TGZ in `ls *.tgz`; do tar xvf $TGZ; done")
            .blank();
        script.render()
    }

    fn gen_script_end(&self, job: &Job) -> String {
        let flag = sentinel::fail_flag_name(&job.job_hash);
        let tag = sentinel::finish_tag_name(&job.job_hash);
        let archive =
            sentinel::download_archive_name(self.ctx.submission_hash(), &job.job_hash);
        let all_task_dirs = job.task_work_paths().collect::<Vec<_>>().join(" ");
        let remote_root = self.ctx.remote_root().display();

        let mut script = Script::new();
        script
            .line("cd $REMOTE_ROOT")
            .line("test $? -ne 0 && exit 1")
            .blank()
            .line("wait")
            .line(format!("FLAG_IF_JOB_TASK_FAIL=$(cat {flag})"))
            .line("if test $FLAG_IF_JOB_TASK_FAIL -eq 0; then")
            .line(format!("    tar czf {archive} {all_task_dirs}"))
            .line(format!("    hadoop fs -put -f {archive} {remote_root}"))
            .line(format!("    hadoop fs -touchz {remote_root}/{tag}"))
            .line("else")
            // No finished tag on failure; the poller reports `terminated`.
            .line("    exit 1")
            .line("fi")
            .extend(job.resources.append_script.iter().cloned());
        script.render()
    }

    async fn do_submit(&self, job: &mut Job) -> Result<String> {
        let script = self.gen_script(job)?;
        self.ctx.write_file(&job.script_file_name, &script).await?;

        let run_file = format!("{}.run", job.script_file_name);
        let submit_command = self.gen_submit_command(job);
        self.ctx.write_file(&run_file, &submit_command).await?;

        let output = sentinel::output_name(&job.job_hash);
        let cmd =
            format!("{{ nohup bash {run_file} 1>{output} 2>{output} & }} && echo $!");
        let out = self.ctx.run_command(&cmd).await?;
        if !out.success() {
            return Err(Error::CommandFailed {
                cmd,
                code: out.code,
                stderr: out.stderr,
            });
        }

        let job_id = out.stdout.trim().to_string();
        if job_id.parse::<i64>().is_err() {
            return Err(Error::InvalidJobId(job_id));
        }
        self.ctx
            .write_file(&sentinel::job_id_name(&job.job_hash), &job_id)
            .await?;
        job.job_id = job_id.clone();
        Ok(job_id)
    }

    async fn check_status(&self, job: &Job) -> Result<JobStatus> {
        if job.job_id.is_empty() {
            return Ok(JobStatus::Unsubmitted);
        }

        let cmd = format!("if ps -p {} > /dev/null; then echo 1; fi", job.job_id);
        let out = self.ctx.run_command(&cmd).await?;
        if !out.success() {
            return Err(Error::CommandFailed {
                cmd,
                code: out.code,
                stderr: out.stderr,
            });
        }
        let alive = !out.stdout.trim().is_empty();

        // The tag is the authoritative success signal even when the launcher
        // process is already reaped.
        if self.check_finish_tag(job).await {
            tracing::info!(job_hash = %job.job_hash, job_id = %job.job_id, "job finished");
            return Ok(JobStatus::Finished);
        }

        if alive {
            Ok(JobStatus::Running)
        } else {
            Ok(JobStatus::Terminated)
        }
    }

    async fn check_finish_tag(&self, job: &Job) -> bool {
        self.ctx
            .check_file_exists(&sentinel::finish_tag_name(&job.job_hash))
            .await
    }
}
