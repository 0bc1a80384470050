//! Deterministic names for the on-storage artifacts of one job.
//!
//! Every file the generated script and the submitter touch is keyed by the
//! job hash alone, so jobs of one submission never collide and status stays
//! recoverable without a central registry.

/// Flag file the script initializes to `0` and tasks overwrite with `1` on
/// failure.
pub fn fail_flag_name(job_hash: &str) -> String {
    format!("{job_hash}_flag_if_job_task_fail")
}

/// Existence-only marker written to shared storage on full success.
pub fn finish_tag_name(job_hash: &str) -> String {
    format!("{job_hash}_job_tag_finished")
}

/// File persisting the launcher process id.
pub fn job_id_name(job_hash: &str) -> String {
    format!("{job_hash}_job_id")
}

/// Combined stdout/stderr capture of the launcher invocation.
pub fn output_name(job_hash: &str) -> String {
    format!("{job_hash}.out")
}

/// Marker letting a re-submitted job skip an already finished task.
pub fn task_tag_name(task_hash: &str) -> String {
    format!("{task_hash}_task_tag_finished")
}

/// Input archive staged next to the script before execution.
pub fn upload_archive_name(submission_hash: &str) -> String {
    format!("{submission_hash}_upload.tgz")
}

/// Result archive uploaded to shared storage on success.
pub fn download_archive_name(submission_hash: &str, job_hash: &str) -> String {
    format!("{submission_hash}_{job_hash}_download.tar.gz")
}
