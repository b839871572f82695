//! Key selections: which field positions define grouping and match identity.

use serde::{Deserialize, Serialize};

use crate::record::{Record, Value};

/// Values of the key fields of one record, in key order.
///
/// The derived ordering (per value bytewise, then lexicographic over the
/// tuple) is the same order `LC_ALL=C sort --key=k,k ...` produces.
pub type Key = Vec<Value>;

/// 0-based field positions. Empty means "the whole relation is one group".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeySpec(Vec<usize>);

impl KeySpec {
    pub fn new(positions: Vec<usize>) -> Self {
        Self(positions)
    }

    /// Every position `0..n`.
    pub fn leading(n: usize) -> Self {
        Self((0..n).collect())
    }

    pub fn positions(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn extract(&self, record: &Record) -> Key {
        self.0.iter().map(|&i| record[i].clone()).collect()
    }

    /// Whether `record` carries exactly `key` at these positions.
    pub fn matches(&self, record: &Record, key: &Key) -> bool {
        self.0.len() == key.len()
            && self
                .0
                .iter()
                .zip(key.iter())
                .all(|(&i, v)| record[i] == *v)
    }

    /// Positions in 1-based form, as `sort --key` wants them.
    pub fn sort_fields(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().map(|i| i + 1)
    }
}
