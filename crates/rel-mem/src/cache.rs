//! Bounded replay cache for one group of records at a time.
//!
//! A group from the grouping cursor can be read only once. Join-family
//! operators need the cross product of two same-key groups, so each side is
//! first materialized here: up to `limit` records stay in memory, the rest go
//! to one scratch file that is created on first overflow and rewritten for
//! every later overflowing group. `iter` replays the memory prefix and then
//! the scratch file, as many times as needed.
//!
//! Only one group is live per cache. `cache` takes `&mut self`, so an
//! iterator over the previous group cannot survive it.

use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};

use rel_core::record::{self, Record};

use crate::error::{Error, Result};
use crate::spill::{Codec, ScratchFile, SpillReader};

const SPILL_PREFIX: &str = "cache-";
const SPILL_SUFFIX: &str = ".tmp";
const SPILL_READ_CAPACITY: usize = 64 * 1024;

pub struct ReplayCache {
    limit: usize,
    memory: Vec<Record>,
    /// Total records of the current group; `None` until a group is cached.
    count: Option<usize>,
    /// Field count of spilled records, needed to decode zero-field records.
    spill_width: usize,
    spill: Option<ScratchFile>,
    spill_dir: PathBuf,
    codec: Codec,
}

impl ReplayCache {
    pub fn new(limit: usize, spill_dir: impl Into<PathBuf>) -> Result<Self> {
        if limit == 0 {
            return Err(Error::ZeroLimit);
        }
        Ok(Self {
            limit,
            memory: Vec::new(),
            count: None,
            spill_width: 0,
            spill: None,
            spill_dir: spill_dir.into(),
            codec: Codec::None,
        })
    }

    pub fn with_codec(mut self, codec: Codec) -> Result<Self> {
        self.codec = codec.check_available()?;
        Ok(self)
    }

    /// Drain `group` into the cache, replacing whatever was cached before.
    /// Returns the number of records cached.
    pub fn cache<I>(&mut self, group: I) -> Result<usize>
    where
        I: IntoIterator<Item = rel_core::Result<Record>>,
    {
        self.count = None;
        self.memory.clear();

        let mut group = group.into_iter();
        while self.memory.len() < self.limit {
            match group.next() {
                Some(r) => self.memory.push(r?),
                None => {
                    self.count = Some(self.memory.len());
                    return Ok(self.memory.len());
                }
            }
        }

        let first = match group.next() {
            None => {
                self.count = Some(self.memory.len());
                return Ok(self.memory.len());
            }
            Some(r) => r?,
        };

        if self.spill.is_none() {
            self.spill = Some(ScratchFile::create(
                &self.spill_dir,
                SPILL_PREFIX,
                SPILL_SUFFIX,
            )?);
        }
        let spill = self.spill.as_ref().ok_or(Error::NoGroup)?;

        self.spill_width = first.len();
        let mut out = self.codec.writer(spill.rewrite()?)?;
        let mut buf = Vec::new();
        let mut spilled = 0usize;
        for r in std::iter::once(Ok(first)).chain(group) {
            let r = r?;
            buf.clear();
            record::encode_into(&r, &mut buf);
            out.write_all(&buf)?;
            spilled += 1;
        }
        out.finish()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            in_memory = self.memory.len(),
            spilled,
            path = %spill.path().display(),
            "cache spilled group"
        );

        let total = self.memory.len() + spilled;
        self.count = Some(total);
        Ok(total)
    }

    /// Records in the current group.
    pub fn len(&self) -> Result<usize> {
        self.count.ok_or(Error::NoGroup)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Whether the current group overflowed into the scratch file.
    pub fn spilled(&self) -> bool {
        matches!(self.count, Some(n) if n > self.memory.len())
    }

    /// The scratch file, if one has been created.
    pub fn spill_path(&self) -> Option<&Path> {
        self.spill.as_ref().map(ScratchFile::path)
    }

    /// Replay the current group from the start.
    pub fn iter(&self) -> Result<CacheIter<'_>> {
        let total = self.len()?;
        Ok(CacheIter {
            cache: self,
            index: 0,
            total,
            reader: None,
            line: Vec::new(),
            failed: false,
        })
    }

    /// Drop the current group and delete the scratch file, if any.
    pub fn release(&mut self) -> Result<()> {
        self.memory.clear();
        self.count = None;
        if let Some(spill) = self.spill.take() {
            spill.remove()?;
        }
        Ok(())
    }

    fn open_spill(&self) -> Result<SpillReader> {
        let spill = self.spill.as_ref().ok_or(Error::NoGroup)?;
        self.codec.reader(spill.reader(SPILL_READ_CAPACITY)?)
    }
}

/// One replay of a cached group: memory prefix first, then the spill file.
///
/// Memory records are lent out, spilled records are decoded fresh.
pub struct CacheIter<'a> {
    cache: &'a ReplayCache,
    index: usize,
    total: usize,
    reader: Option<SpillReader>,
    line: Vec<u8>,
    failed: bool,
}

impl<'a> CacheIter<'a> {
    fn next_spilled(&mut self) -> Result<Option<Record>> {
        if self.reader.is_none() {
            self.reader = Some(self.cache.open_spill()?);
        }
        let reader = match self.reader.as_mut() {
            Some(r) => r,
            None => return Ok(None),
        };
        self.line.clear();
        if std::io::BufRead::read_until(reader, record::LINE_END, &mut self.line)? == 0 {
            return Err(Error::Record(rel_core::Error::code(
                "spill file ended before the cached count",
            )));
        }
        Ok(Some(record::decode(&self.line, self.cache.spill_width)?))
    }
}

impl<'a> Iterator for CacheIter<'a> {
    type Item = Result<Cow<'a, Record>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.index >= self.total {
            return None;
        }
        let i = self.index;
        self.index += 1;
        if let Some(r) = self.cache.memory.get(i) {
            return Some(Ok(Cow::Borrowed(r)));
        }
        match self.next_spilled() {
            Ok(Some(r)) => Some(Ok(Cow::Owned(r))),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.total - self.index;
        (left, Some(left))
    }
}
