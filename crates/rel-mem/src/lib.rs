#![forbid(unsafe_code)]
//! rel-mem: bounded materialization of record groups.
//!
//! The join-family operators need to scan both sides of a same-key group
//! repeatedly, but a group can be larger than memory. `ReplayCache` keeps a
//! bounded prefix of the group in memory and spills the rest to a reusable
//! scratch file (see `spill`).

pub mod cache;
pub mod error;
pub mod spill;

pub use cache::{CacheIter, ReplayCache};
pub use error::{Error, Result};
pub use spill::{Codec, ScratchFile};
