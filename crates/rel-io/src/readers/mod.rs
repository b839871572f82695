//! Streaming readers that decode relation bodies line by line.

pub mod tsv;
