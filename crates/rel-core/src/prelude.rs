//! Convenient re-exports for downstream crates.

pub use crate::config::RelConfig;
pub use crate::error::{Error, Result};
pub use crate::key::{Key, KeySpec};
pub use crate::record::{Record, Value};
pub use crate::schema::Schema;
