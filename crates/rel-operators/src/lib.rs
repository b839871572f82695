#![forbid(unsafe_code)]
//! rel-operators: relational operators over sorted tab-separated relations.
//!
//! Design intent:
//! - Everything is synchronous and streaming. Ordering is delegated to an
//!   external `sort` child (`sort::external`); operators only ever see
//!   key-sorted record sequences through the `group::Groups` cursor.
//! - Same-key groups that must be scanned more than once go through the
//!   bounded replay cache from `rel-mem`, so memory stays bounded no matter
//!   how skewed the keys are.
//! - Every scratch file has exactly one owner that deletes it on all paths.

pub mod group;
pub mod join;
pub mod registry;
pub mod setops;
pub mod sort;
pub mod sum;
pub mod traits;

pub use group::{Group, Groups};
pub use registry::Registry;
pub use setops::SetOp;
pub use traits::{Arity, Operator, RunArgs, RunStats};
