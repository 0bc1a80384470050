//! Error type shared by the dispatcher crates.

use thiserror::Error;

/// Infrastructure and configuration failures raised by dispatcher
/// operations.
///
/// Job-level failure is never an `Err`: it is reported through
/// [`crate::model::JobStatus`] so the caller can inspect or resubmit
/// without unwinding.
#[derive(Error, Debug)]
pub enum Error {
    /// A command run through the execution context exited nonzero.
    #[error("command `{cmd}` failed with return code {code}: {stderr}")]
    CommandFailed {
        /// Command line that was executed.
        cmd: String,
        /// Process return code.
        code: i32,
        /// Captured standard error.
        stderr: String,
    },

    /// The launcher did not print a parsable process id.
    #[error("cannot parse job id from `{0}`")]
    InvalidJobId(String),

    /// A custom header template could not be read or rendered.
    #[error("script header template: {0}")]
    Template(String),

    /// Filesystem or process error talking to the execution context.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used across the dispatcher crates.
pub type Result<T> = std::result::Result<T, Error>;
