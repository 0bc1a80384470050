//! Submission and status-classification behavior of the distributed-shell
//! backend.

use std::sync::Arc;

use dispatcher_core::error::Error;
use dispatcher_core::machine::Machine;
use dispatcher_core::model::JobStatus;
use dispatcher_core::sentinel;
use dispatcher_machine::DistributedShell;

mod common;
use common::{sample_job, MockContext};

#[tokio::test]
async fn unsubmitted_job_is_classified_without_remote_query() {
    let ctx = Arc::new(MockContext::new("subhash"));
    let machine = DistributedShell::new(ctx.clone());
    let job = sample_job();

    let status = machine.check_status(&job).await.unwrap();
    assert_eq!(status, JobStatus::Unsubmitted);
    assert!(ctx.commands().is_empty());
}

#[tokio::test]
async fn finish_tag_wins_over_dead_process() {
    let ctx = Arc::new(MockContext::new("subhash"));
    let machine = DistributedShell::new(ctx.clone());
    let mut job = sample_job();
    job.job_id = "4242".to_string();

    // Process gone, tag present.
    ctx.push_result(0, "", "");
    ctx.put_file(&sentinel::finish_tag_name(&job.job_hash), "");

    let status = machine.check_status(&job).await.unwrap();
    assert_eq!(status, JobStatus::Finished);
}

#[tokio::test]
async fn finish_tag_wins_over_live_process() {
    let ctx = Arc::new(MockContext::new("subhash"));
    let machine = DistributedShell::new(ctx.clone());
    let mut job = sample_job();
    job.job_id = "4242".to_string();

    ctx.push_result(0, "1\n", "");
    ctx.put_file(&sentinel::finish_tag_name(&job.job_hash), "");

    let status = machine.check_status(&job).await.unwrap();
    assert_eq!(status, JobStatus::Finished);
}

#[tokio::test]
async fn live_process_without_tag_is_running() {
    let ctx = Arc::new(MockContext::new("subhash"));
    let machine = DistributedShell::new(ctx.clone());
    let mut job = sample_job();
    job.job_id = "4242".to_string();

    ctx.push_result(0, "1\n", "");

    let status = machine.check_status(&job).await.unwrap();
    assert_eq!(status, JobStatus::Running);
}

#[tokio::test]
async fn dead_process_without_tag_is_terminated() {
    let ctx = Arc::new(MockContext::new("subhash"));
    let machine = DistributedShell::new(ctx.clone());
    let mut job = sample_job();
    job.job_id = "4242".to_string();

    ctx.push_result(0, "", "");

    let status = machine.check_status(&job).await.unwrap();
    assert_eq!(status, JobStatus::Terminated);
}

#[tokio::test]
async fn failing_liveness_query_is_an_infrastructure_error() {
    let ctx = Arc::new(MockContext::new("subhash"));
    let machine = DistributedShell::new(ctx.clone());
    let mut job = sample_job();
    job.job_id = "4242".to_string();

    ctx.push_result(127, "", "bash: ps: command not found");

    let err = machine.check_status(&job).await.unwrap_err();
    match err {
        Error::CommandFailed { code, stderr, .. } => {
            assert_eq!(code, 127);
            assert!(stderr.contains("ps: command not found"));
        }
        other => panic!("expected command failure, got {other:?}"),
    }
}

#[tokio::test]
async fn submit_persists_pid_and_assigns_job_id() {
    let ctx = Arc::new(MockContext::new("subhash"));
    let machine = DistributedShell::new(ctx.clone());
    let mut job = sample_job();

    ctx.push_result(0, "12345\n", "");
    let job_id = machine.do_submit(&mut job).await.unwrap();

    assert_eq!(job_id, "12345");
    assert_eq!(job.job_id, "12345");
    assert_eq!(
        ctx.file(&sentinel::job_id_name(&job.job_hash)).as_deref(),
        Some("12345")
    );

    // The composed script landed under the job's script name.
    let script = ctx.file(&job.script_file_name).unwrap();
    assert!(script.starts_with("#!/bin/bash -l"));

    // The wrapper embeds the launcher invocation.
    let wrapper = ctx.file(&format!("{}.run", job.script_file_name)).unwrap();
    assert!(wrapper.contains("hadoop jar"));
    assert!(wrapper.contains("-queue root.gpu"));
    assert!(wrapper.contains(&format!(
        "-appname \"distributedshell_dispatcher_{}\"",
        job.job_hash
    )));
    assert!(wrapper.contains("YARN_CONTAINER_RUNTIME_DOCKER_IMAGE=ubuntu:22.04"));
    assert!(wrapper.contains("-container_resources memory-mb=8192,vcores=4"));
    assert!(wrapper.contains(&format!("-shell_script /tmp/{}", job.script_file_name)));

    // The launch is detached and captures both streams in the output file.
    let commands = ctx.commands();
    assert_eq!(commands.len(), 1);
    let output = sentinel::output_name(&job.job_hash);
    assert!(commands[0].contains("nohup bash"));
    assert!(commands[0].contains(&format!("1>{output} 2>{output}")));
    assert!(commands[0].ends_with("&& echo $!"));
}

#[tokio::test]
async fn failed_launch_propagates_stderr_and_leaves_job_unassigned() {
    let ctx = Arc::new(MockContext::new("subhash"));
    let machine = DistributedShell::new(ctx.clone());
    let mut job = sample_job();

    ctx.push_result(1, "", "permission denied");
    let err = machine.do_submit(&mut job).await.unwrap_err();

    match err {
        Error::CommandFailed { code, stderr, .. } => {
            assert_eq!(code, 1);
            assert_eq!(stderr, "permission denied");
        }
        other => panic!("expected command failure, got {other:?}"),
    }
    assert!(job.job_id.is_empty());
    assert!(ctx.file(&sentinel::job_id_name(&job.job_hash)).is_none());
}

#[tokio::test]
async fn non_numeric_pid_is_rejected() {
    let ctx = Arc::new(MockContext::new("subhash"));
    let machine = DistributedShell::new(ctx.clone());
    let mut job = sample_job();

    ctx.push_result(0, "not-a-pid\n", "");
    let err = machine.do_submit(&mut job).await.unwrap_err();

    assert!(matches!(err, Error::InvalidJobId(id) if id == "not-a-pid"));
    assert!(job.job_id.is_empty());
}

#[tokio::test]
async fn resubmission_overwrites_pid_and_output() {
    let ctx = Arc::new(MockContext::new("subhash"));
    let machine = DistributedShell::new(ctx.clone());
    let mut job = sample_job();

    ctx.push_result(0, "111\n", "");
    machine.do_submit(&mut job).await.unwrap();
    ctx.push_result(0, "222\n", "");
    machine.do_submit(&mut job).await.unwrap();

    assert_eq!(job.job_id, "222");
    assert_eq!(
        ctx.file(&sentinel::job_id_name(&job.job_hash)).as_deref(),
        Some("222")
    );
}
