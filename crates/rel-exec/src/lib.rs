#![forbid(unsafe_code)]
//! rel-exec: runs one operator between resolved endpoints.
//!
//! The runtime opens the inputs (files or standard input), prepares the
//! output (standard output, or a temp file renamed into place on success),
//! runs the operator, and turns any failure into the messages and exit
//! status a command-line caller expects.

pub mod metrics;
pub mod runtime;

pub use runtime::{Engine, ExecError, Invocation, RunReport};
