//! Streaming writers.

pub mod tsv;
