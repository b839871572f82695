//! Ordering of record streams, delegated to an external `sort` child.

pub mod external;

pub use external::{records, Records, SortOptions, SortedRecords};
