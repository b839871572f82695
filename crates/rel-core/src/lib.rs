#![forbid(unsafe_code)]
//! rel-core: records, schemas, keys, configuration and errors.
//!
//! Pure data and codecs only. Processes, scratch files and streams live in
//! the crates layered on top of this one.

pub mod config;
pub mod error;
pub mod key;
pub mod prelude;
pub mod record;
pub mod schema;

pub use error::{Error, Result};
