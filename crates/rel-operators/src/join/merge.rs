//! Join-family operators built on `merge_by_key`.
//!
//! - `join`: natural join, left fields then the right side's non-key fields;
//!   more than two relations are joined left to right through scratch files
//! - `compose`: natural join with the key fields dropped, distinct rows
//! - `image`: the left side's non-key fields where the key matches, distinct
//! - `match`: left records whose key occurs on the right (semi-join)
//! - `miss`: left records whose key does not occur on the right (anti-join)
//!
//! Precondition for everything here: `merge_by_key` only sees inputs sorted
//! on the shared key, which `KeyedPair::open` arranges.

use std::io::Write;

use rel_core::config::RelConfig;
use rel_core::error::{Error, Result};
use rel_core::key::KeySpec;
use rel_io::{Input, RecordWriter};
use rel_mem::{Codec, ReplayCache, ScratchFile};

use super::{every_field, staged_unique, KeyedPair, MatchAction};
use crate::group::Group;
use crate::sort::Records;
use crate::traits::{check_arity, Arity, Operator, RunArgs, RunStats};

/// Cross product of two same-key groups, both replayed through caches.
struct CrossProduct<'w> {
    out: RecordWriter<&'w mut dyn Write>,
    left_fields: KeySpec,
    right_fields: KeySpec,
    left: ReplayCache,
    right: ReplayCache,
}

impl<'w> CrossProduct<'w> {
    fn new(
        out: &'w mut dyn Write,
        left_fields: KeySpec,
        right_fields: KeySpec,
        config: &RelConfig,
    ) -> Result<Self> {
        let dir = config.scratch_dir();
        let codec = Codec::from_name(&config.spill_codec)?;
        Ok(Self {
            out: RecordWriter::new(out),
            left_fields,
            right_fields,
            left: ReplayCache::new(config.cache_limit, &dir)?.with_codec(codec)?,
            right: ReplayCache::new(config.cache_limit, &dir)?.with_codec(codec)?,
        })
    }

    /// Merge `pair` and release both caches, whatever the outcome.
    fn run(mut self, pair: &mut KeyedPair) -> Result<u64> {
        let merged = pair.merge(&mut self);
        let left = self.left.release();
        let right = self.right.release();
        merged?;
        left?;
        right?;
        Ok(self.out.written())
    }
}

impl MatchAction for CrossProduct<'_> {
    fn matched(&mut self, left: Group<'_, Records>, right: Group<'_, Records>) -> Result<()> {
        self.left.cache(left)?;
        self.right.cache(right)?;

        let width = self.left_fields.len() + self.right_fields.len();
        for r1 in self.left.iter()? {
            let r1 = r1?;
            for r2 in self.right.iter()? {
                let r2 = r2?;
                let mut row: Vec<&[u8]> = Vec::with_capacity(width);
                row.extend(self.left_fields.positions().iter().map(|&i| r1[i].as_slice()));
                row.extend(self.right_fields.positions().iter().map(|&i| r2[i].as_slice()));
                self.out.write(&row)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keep {
    Matched,
    Unmatched,
}

/// Left records, projected onto `fields`, on one side of the match.
struct LeftRows<'w> {
    out: RecordWriter<&'w mut dyn Write>,
    fields: KeySpec,
    keep: Keep,
}

impl LeftRows<'_> {
    fn emit(&mut self, left: Group<'_, Records>) -> Result<()> {
        for r in left {
            let r = r?;
            let row: Vec<&[u8]> = self.fields.positions().iter().map(|&i| r[i].as_slice()).collect();
            self.out.write(&row)?;
        }
        Ok(())
    }
}

impl MatchAction for LeftRows<'_> {
    fn matched(&mut self, left: Group<'_, Records>, _right: Group<'_, Records>) -> Result<()> {
        match self.keep {
            Keep::Matched => self.emit(left),
            Keep::Unmatched => Ok(()),
        }
    }

    fn left_only(&mut self, left: Group<'_, Records>) -> Result<()> {
        match self.keep {
            Keep::Matched => Ok(()),
            Keep::Unmatched => self.emit(left),
        }
    }

    fn drains_left_tail(&self) -> bool {
        self.keep == Keep::Unmatched
    }
}

fn two_inputs(inputs: Vec<Input>) -> Result<(Input, Input)> {
    let mut it = inputs.into_iter();
    match (it.next(), it.next(), it.next()) {
        (Some(a), Some(b), None) => Ok((a, b)),
        _ => Err(Error::code("expected exactly two input relations")),
    }
}

fn join_pair(in1: Input, in2: Input, out: &mut dyn Write, config: &RelConfig) -> Result<u64> {
    let mut pair = KeyedPair::open(in1, in2, config)?;
    let rest2 = pair.right_rest();
    let mut names = pair.head1.names().to_vec();
    names.extend(rest2.iter().cloned());

    RecordWriter::new(&mut *out).write_names(&names)?;
    let left_fields = every_field(&pair.head1);
    let right_fields = pair.head2.positions(&rest2)?;
    CrossProduct::new(out, left_fields, right_fields, config)?.run(&mut pair)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Join;

impl Operator for Join {
    fn name(&self) -> &'static str {
        "join"
    }

    fn arity(&self) -> Arity {
        Arity::AT_LEAST_TWO
    }

    fn run(&self, args: &RunArgs, inputs: Vec<Input>, out: &mut dyn Write) -> Result<RunStats> {
        check_arity(self, &inputs)?;
        let config = &args.config;
        let mut inputs = inputs.into_iter();
        let (mut left, mut right) = match (inputs.next(), inputs.next()) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(Error::code("join needs two input relations")),
        };

        // Each intermediate result stays alive until the next one replaces it.
        let mut carried: Option<ScratchFile> = None;
        for next in inputs {
            let scratch = ScratchFile::create(&config.scratch_dir(), "join-", ".tsv.tmp")?;
            {
                let mut w = scratch.rewrite()?;
                join_pair(left, right, &mut w, config)?;
                w.flush()?;
            }
            left = Input::from_reader(
                scratch.path().display().to_string(),
                scratch.reader(config.read_buffer_bytes)?,
            );
            right = next;
            carried = Some(scratch);
        }

        let records_out = join_pair(left, right, out, config)?;
        if let Some(scratch) = carried {
            scratch.remove()?;
        }
        Ok(RunStats { records_out })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Compose;

impl Operator for Compose {
    fn name(&self) -> &'static str {
        "compose"
    }

    fn arity(&self) -> Arity {
        Arity::BINARY
    }

    fn run(&self, args: &RunArgs, inputs: Vec<Input>, out: &mut dyn Write) -> Result<RunStats> {
        check_arity(self, &inputs)?;
        let config = &args.config;
        let (in1, in2) = two_inputs(inputs)?;
        let mut pair = KeyedPair::open(in1, in2, config)?;
        let rest1 = pair.left_rest();
        let rest2 = pair.right_rest();
        let left_fields = pair.head1.positions(&rest1)?;
        let right_fields = pair.head2.positions(&rest2)?;
        let mut names = rest1;
        names.extend(rest2);

        let mut out = RecordWriter::new(out);
        out.write_names(&names)?;
        staged_unique(config, names.len(), &mut out, |stage| {
            CrossProduct::new(stage, left_fields, right_fields, config)?.run(&mut pair)?;
            Ok(())
        })?;
        Ok(RunStats {
            records_out: out.written(),
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Image;

impl Operator for Image {
    fn name(&self) -> &'static str {
        "image"
    }

    fn arity(&self) -> Arity {
        Arity::BINARY
    }

    fn run(&self, args: &RunArgs, inputs: Vec<Input>, out: &mut dyn Write) -> Result<RunStats> {
        check_arity(self, &inputs)?;
        let config = &args.config;
        let (in1, in2) = two_inputs(inputs)?;
        let mut pair = KeyedPair::open(in1, in2, config)?;
        let rest1 = pair.left_rest();
        let fields = pair.head1.positions(&rest1)?;

        let mut out = RecordWriter::new(out);
        out.write_names(&rest1)?;
        staged_unique(config, rest1.len(), &mut out, |stage| {
            let mut rows = LeftRows {
                out: RecordWriter::new(stage),
                fields,
                keep: Keep::Matched,
            };
            pair.merge(&mut rows)
        })?;
        Ok(RunStats {
            records_out: out.written(),
        })
    }
}

fn left_rows(args: &RunArgs, inputs: Vec<Input>, out: &mut dyn Write, keep: Keep) -> Result<RunStats> {
    let (in1, in2) = two_inputs(inputs)?;
    let mut pair = KeyedPair::open(in1, in2, &args.config)?;
    let mut rows = LeftRows {
        out: RecordWriter::new(out),
        fields: every_field(&pair.head1),
        keep,
    };
    rows.out.write_head(&pair.head1)?;
    pair.merge(&mut rows)?;
    Ok(RunStats {
        records_out: rows.out.written(),
    })
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Match;

impl Operator for Match {
    fn name(&self) -> &'static str {
        "match"
    }

    fn arity(&self) -> Arity {
        Arity::BINARY
    }

    fn run(&self, args: &RunArgs, inputs: Vec<Input>, out: &mut dyn Write) -> Result<RunStats> {
        check_arity(self, &inputs)?;
        left_rows(args, inputs, out, Keep::Matched)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Miss;

impl Operator for Miss {
    fn name(&self) -> &'static str {
        "miss"
    }

    fn arity(&self) -> Arity {
        Arity::BINARY
    }

    fn run(&self, args: &RunArgs, inputs: Vec<Input>, out: &mut dyn Write) -> Result<RunStats> {
        check_arity(self, &inputs)?;
        left_rows(args, inputs, out, Keep::Unmatched)
    }
}
