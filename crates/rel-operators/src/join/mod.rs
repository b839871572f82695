//! Merge-by-key over two relations sorted on their shared fields.
//!
//! The key of a pair of relations is the list of field names present in
//! both headers, in the first relation's order. Both sides are ordered on it
//! by the external sort and walked in lockstep by two `Groups` cursors; what
//! happens at equal keys (and, for some operators, at left-only keys) is up
//! to a `MatchAction`.
//!
//! The walk stops as soon as either side runs out. Only actions that ask
//! for it (`drains_left_tail`) see the left groups after the right side is
//! exhausted.

pub mod merge;

use std::cmp::Ordering;
use std::io::Write;

use rel_core::config::RelConfig;
use rel_core::error::Result;
use rel_core::key::KeySpec;
use rel_core::schema::Schema;
use rel_io::{Input, RecordWriter};
use rel_mem::ScratchFile;

use crate::group::{Group, Groups};
use crate::sort::{self, Records, SortOptions};

pub use merge::{Compose, Image, Join, Match, Miss};

pub(crate) type Cursor = Groups<Records>;

/// What to do with the groups visited by `merge_by_key`.
pub(crate) trait MatchAction {
    fn matched(&mut self, left: Group<'_, Records>, right: Group<'_, Records>) -> Result<()>;

    /// A left group whose key has no counterpart on the right.
    fn left_only(&mut self, _left: Group<'_, Records>) -> Result<()> {
        Ok(())
    }

    /// Keep visiting left groups after the right side is exhausted.
    fn drains_left_tail(&self) -> bool {
        false
    }
}

pub(crate) fn merge_by_key<A: MatchAction>(left: &mut Cursor, right: &mut Cursor, action: &mut A) -> Result<()> {
    let mut k1 = left.next_key()?;
    let mut k2 = right.next_key()?;
    loop {
        let order = match (&k1, &k2) {
            (Some(a), Some(b)) => a.cmp(b),
            _ => break,
        };
        match order {
            Ordering::Equal => {
                action.matched(left.group(), right.group())?;
                k1 = left.next_key()?;
                k2 = right.next_key()?;
            }
            Ordering::Less => {
                action.left_only(left.group())?;
                k1 = left.next_key()?;
            }
            Ordering::Greater => {
                k2 = right.next_key()?;
            }
        }
    }
    if action.drains_left_tail() {
        while k1.is_some() {
            action.left_only(left.group())?;
            k1 = left.next_key()?;
        }
    }
    Ok(())
}

/// Two relations with headers read, each behind a cursor on the shared key.
pub(crate) struct KeyedPair {
    pub head1: Schema,
    pub head2: Schema,
    pub key: Vec<String>,
    pub left: Cursor,
    pub right: Cursor,
}

impl KeyedPair {
    /// Read both headers first; neither sort starts before a record is asked for.
    pub fn open(mut in1: Input, mut in2: Input, config: &RelConfig) -> Result<Self> {
        let head1 = in1.read_head()?;
        let head2 = in2.read_head()?;
        let key = head1.shared_with(&head2);
        let k1 = head1.positions(&key)?;
        let k2 = head2.positions(&key)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(left = in1.name(), right = in2.name(), key = ?key, "merge on shared fields");

        let left = Groups::new(
            sort::records(in1, head1.len(), &SortOptions::keyed(k1.clone()), config),
            k1,
        );
        let right = Groups::new(
            sort::records(in2, head2.len(), &SortOptions::keyed(k2.clone()), config),
            k2,
        );
        Ok(Self {
            head1,
            head2,
            key,
            left,
            right,
        })
    }

    /// Names of the left relation outside the key.
    pub fn left_rest(&self) -> Vec<String> {
        self.head1.without(&self.key)
    }

    /// Names of the right relation outside the key.
    pub fn right_rest(&self) -> Vec<String> {
        self.head2.without(&self.key)
    }

    pub fn merge<A: MatchAction>(&mut self, action: &mut A) -> Result<()> {
        merge_by_key(&mut self.left, &mut self.right, action)
    }
}

/// Fill a scratch file through `fill`, then write its distinct lines to
/// `out` in byte order.
pub(crate) fn staged_unique<F>(
    config: &RelConfig,
    width: usize,
    out: &mut RecordWriter<&mut dyn Write>,
    fill: F,
) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let staging = ScratchFile::create(&config.scratch_dir(), "stage-", ".tsv.tmp")?;
    {
        let mut w = staging.rewrite()?;
        fill(&mut w)?;
        w.flush()?;
    }
    let input = Input::from_reader(
        staging.path().display().to_string(),
        staging.reader(config.read_buffer_bytes)?,
    );
    for r in sort::records(input, width, &SortOptions::unique(), config) {
        out.write(&r?)?;
    }
    staging.remove()?;
    Ok(())
}

/// All positions `0..schema.len()`.
pub(crate) fn every_field(schema: &Schema) -> KeySpec {
    KeySpec::leading(schema.len())
}
