#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Command-line driver: submit a batch of tasks to a cluster backend and
//! poll job status until completion.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dispatcher_core::machine::{Machine, MachineKind};
use dispatcher_core::model::{Resources, Submission, Task};
use dispatcher_machine::{build_machine, LocalContext};

#[derive(Parser, Debug)]
#[command(name = "dispatcherctl")]
struct Args {
    /// Log level (env-filter syntax).
    #[arg(long, default_value = "info")]
    log: String,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Submit every job of a submission spec and record the assigned ids.
    Submit {
        /// Submission spec file: machine kind, resources, tasks.
        #[arg(long)]
        spec: PathBuf,
        /// Directory shared with the cluster where job artifacts live.
        #[arg(long)]
        remote_root: PathBuf,
    },
    /// Poll each submitted job once and print its state.
    Status {
        /// State file written by `submit`.
        #[arg(long)]
        state: PathBuf,
        /// Directory shared with the cluster where job artifacts live.
        #[arg(long)]
        remote_root: PathBuf,
    },
    /// Poll until every job reached a terminal state.
    Watch {
        /// State file written by `submit`.
        #[arg(long)]
        state: PathBuf,
        /// Directory shared with the cluster where job artifacts live.
        #[arg(long)]
        remote_root: PathBuf,
        /// Poll interval in milliseconds.
        #[arg(long, default_value_t = 10_000)]
        poll_ms: u64,
    },
}

/// Caller-facing submission spec.
#[derive(Debug, Deserialize)]
struct SubmissionSpec {
    machine: MachineKind,
    resources: Resources,
    tasks: Vec<Task>,
}

/// Everything `status`/`watch` need to recover the submission later.
#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    machine: MachineKind,
    submission: Submission,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(args.log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match args.cmd {
        Cmd::Submit { spec, remote_root } => submit(&spec, &remote_root).await,
        Cmd::Status { state, remote_root } => {
            status_once(&state, &remote_root).await?;
            Ok(())
        }
        Cmd::Watch {
            state,
            remote_root,
            poll_ms,
        } => watch(&state, &remote_root, poll_ms).await,
    }
}

async fn submit(spec_path: &Path, remote_root: &Path) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(spec_path).await.context("read spec file")?;
    let spec: SubmissionSpec = serde_json::from_slice(&bytes).context("parse spec file")?;

    tokio::fs::create_dir_all(remote_root)
        .await
        .context("create remote root")?;

    let mut submission = Submission::group(spec.tasks, &spec.resources);
    let ctx = Arc::new(LocalContext::bind(remote_root, &submission));
    let machine = build_machine(spec.machine, ctx);

    for job in &mut submission.jobs {
        let job_id = machine.do_submit(job).await?;
        tracing::info!(job_hash = %job.job_hash, job_id = %job_id, "job submitted");
    }

    let state_path = format!("{}.state.json", submission.submission_hash);
    let state = StateFile {
        machine: spec.machine,
        submission,
    };
    tokio::fs::write(&state_path, serde_json::to_vec_pretty(&state)?)
        .await
        .context("write state file")?;
    println!("{state_path}");
    Ok(())
}

async fn load_state(
    state_path: &Path,
    remote_root: &Path,
) -> anyhow::Result<(StateFile, Box<dyn Machine>)> {
    let bytes = tokio::fs::read(state_path).await.context("read state file")?;
    let state: StateFile = serde_json::from_slice(&bytes).context("parse state file")?;
    let ctx = Arc::new(LocalContext::bind(remote_root, &state.submission));
    let machine = build_machine(state.machine, ctx);
    Ok((state, machine))
}

/// Poll every job once; returns whether all of them are terminal.
async fn status_once(state_path: &Path, remote_root: &Path) -> anyhow::Result<bool> {
    let (state, machine) = load_state(state_path, remote_root).await?;

    let mut all_terminal = true;
    for job in &state.submission.jobs {
        let status = machine.check_status(job).await?;
        all_terminal &= status.is_terminal();
        println!("{}\t{}\t{status}", job.job_hash, job.job_id);
    }
    Ok(all_terminal)
}

async fn watch(state_path: &Path, remote_root: &Path, poll_ms: u64) -> anyhow::Result<()> {
    loop {
        if status_once(state_path, remote_root).await? {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(poll_ms)).await;
    }
}
