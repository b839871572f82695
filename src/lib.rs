#![forbid(unsafe_code)]
//! reltools: relational algebra over tab-separated relations.
//!
//! Thin facade over the workspace crates so integration tests and embedders
//! can reach everything through one dependency.

pub use rel_core as core;
pub use rel_exec as exec;
pub use rel_io as io;
pub use rel_mem as mem;
pub use rel_operators as operators;
