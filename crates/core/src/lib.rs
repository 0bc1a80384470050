#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Shared models and traits for the cluster job dispatcher.

pub mod context;
pub mod error;
pub mod machine;
pub mod model;
pub mod script;
pub mod sentinel;
pub mod template;

pub use error::{Error, Result};
