#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Cluster backends for the dispatcher.
//!
//! One backend today: the YARN distributed-shell launcher, plus a local
//! execution context for running the dispatcher on a cluster login node.

use std::sync::Arc;

use dispatcher_core::context::Context;
use dispatcher_core::machine::{Machine, MachineKind};

mod distributed_shell;
mod local;

pub use distributed_shell::DistributedShell;
pub use local::LocalContext;

/// Build the backend selected by `kind` over the given context.
pub fn build_machine(kind: MachineKind, ctx: Arc<dyn Context>) -> Box<dyn Machine> {
    match kind {
        MachineKind::DistributedShell => Box::new(DistributedShell::new(ctx)),
    }
}
