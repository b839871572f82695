//! Set operations over relations with one set of field names.
//!
//! All inputs are concatenated with an origin tag (`sum::SumFile`), sorted
//! on every field but the tag, and grouped. Each group is one distinct
//! record; whether it is kept depends only on how many tagged copies it has
//! and which relation the first copy came from. `SetOp` is that decision.

use std::io::{self, Write};

use rel_core::error::{Error, Result};
use rel_core::key::KeySpec;
use rel_core::record::{Record, Value};
use rel_io::{Input, RecordWriter};

use crate::group::Groups;
use crate::sort::{self, SortOptions};
use crate::sum::SumFile;
use crate::traits::{check_arity, Arity, Operator, RunArgs, RunStats};

/// Copies of one distinct record across the tagged inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    pub count: usize,
    /// Origin tag of the first copy, in input order.
    pub first_tag: Option<Value>,
}

impl Tally {
    /// Count `group`, whose records carry their tag at position `tag_at`.
    pub fn of<I>(group: I, tag_at: usize) -> Result<Tally>
    where
        I: IntoIterator<Item = Result<Record>>,
    {
        let mut tally = Tally::default();
        for r in group {
            let mut r = r?;
            if tally.first_tag.is_none() {
                tally.first_tag = Some(r.swap_remove(tag_at));
            }
            tally.count += 1;
        }
        Ok(tally)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    /// Every distinct record.
    Union,
    /// Records with as many copies as there are relations.
    Meet,
    /// Records found once, in the first relation only.
    Sans,
    /// Records found exactly once, anywhere.
    Symm,
}

impl SetOp {
    pub const ALL: [SetOp; 4] = [SetOp::Union, SetOp::Meet, SetOp::Sans, SetOp::Symm];

    pub fn admits(self, tally: &Tally, relations: usize) -> bool {
        match self {
            SetOp::Union => tally.count > 0,
            SetOp::Meet => tally.count == relations,
            SetOp::Sans => tally.count == 1 && tally.first_tag.as_deref() == Some(b"1".as_slice()),
            SetOp::Symm => tally.count == 1,
        }
    }
}

impl Operator for SetOp {
    fn name(&self) -> &'static str {
        match self {
            SetOp::Union => "union",
            SetOp::Meet => "meet",
            SetOp::Sans => "sans",
            SetOp::Symm => "symm",
        }
    }

    fn arity(&self) -> Arity {
        Arity::AT_LEAST_TWO
    }

    fn run(&self, args: &RunArgs, inputs: Vec<Input>, out: &mut dyn Write) -> Result<RunStats> {
        check_arity(self, &inputs)?;
        let config = &args.config;
        let sum = SumFile::build(inputs, args.tag.as_deref(), config)?;
        let relations = sum.relations();
        let width = sum.schema().len();

        let mut out = RecordWriter::new(out);
        out.write_head(sum.schema())?;

        let mut tagged = sum.open(config)?;
        let head = tagged.read_head()?;
        let key = KeySpec::leading(width);
        let mut groups = Groups::new(
            sort::records(tagged, head.len(), &SortOptions::keyed(key.clone()), config),
            key,
        );
        while let Some(record) = groups.next_key()? {
            let tally = Tally::of(groups.group(), width)?;
            if self.admits(&tally, relations) {
                out.write(&record)?;
            }
        }
        drop(groups);
        sum.remove()?;

        Ok(RunStats {
            records_out: out.written(),
        })
    }
}

/// Tagged concatenation, written out as is.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sum;

impl Operator for Sum {
    fn name(&self) -> &'static str {
        "sum"
    }

    fn arity(&self) -> Arity {
        Arity::AT_LEAST_TWO
    }

    fn run(&self, args: &RunArgs, inputs: Vec<Input>, out: &mut dyn Write) -> Result<RunStats> {
        check_arity(self, &inputs)?;
        let tag = args
            .tag
            .as_deref()
            .ok_or_else(|| Error::code("sum needs a tag name"))?;
        let config = &args.config;
        let sum = SumFile::build(inputs, Some(tag), config)?;
        let records_out = sum.records();
        {
            let mut reader = sum.open(config)?.into_reader();
            io::copy(&mut reader, out)?;
        }
        sum.remove()?;
        Ok(RunStats { records_out })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rel_core::config::RelConfig;

    const A: &str = "id\tx\n1\ta\n2\tb\n";
    const B: &str = "id\tx\n2\tb\n3\tc\n";

    fn run_args(dir: &std::path::Path) -> RunArgs {
        RunArgs::new(RelConfig {
            tmp_dir: Some(dir.to_path_buf()),
            ..Default::default()
        })
    }

    fn run(op: &dyn Operator, args: &RunArgs, rels: &[&str]) -> Result<String> {
        let inputs = rels
            .iter()
            .enumerate()
            .map(|(i, r)| Input::from_bytes(format!("r{i}"), r.to_string()))
            .collect();
        let mut buf = Vec::new();
        op.run(args, inputs, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap())
    }

    #[test]
    fn two_relations() {
        let dir = tempfile::tempdir().unwrap();
        let args = run_args(dir.path());
        assert_eq!(run(&SetOp::Union, &args, &[A, B]).unwrap(), "id\tx\n1\ta\n2\tb\n3\tc\n");
        assert_eq!(run(&SetOp::Meet, &args, &[A, B]).unwrap(), "id\tx\n2\tb\n");
        assert_eq!(run(&SetOp::Sans, &args, &[A, B]).unwrap(), "id\tx\n1\ta\n");
        assert_eq!(run(&SetOp::Symm, &args, &[A, B]).unwrap(), "id\tx\n1\ta\n3\tc\n");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn three_relations_with_permuted_head() {
        let dir = tempfile::tempdir().unwrap();
        let args = run_args(dir.path());
        let c = "x\tid\nb\t2\na\t1\n";
        assert_eq!(run(&SetOp::Union, &args, &[A, B, c]).unwrap(), "id\tx\n1\ta\n2\tb\n3\tc\n");
        assert_eq!(run(&SetOp::Meet, &args, &[A, B, c]).unwrap(), "id\tx\n2\tb\n");
        assert_eq!(run(&SetOp::Sans, &args, &[A, B, c]).unwrap(), "id\tx\n");
        assert_eq!(run(&SetOp::Symm, &args, &[A, B, c]).unwrap(), "id\tx\n3\tc\n");
    }

    #[test]
    fn head_mismatch_is_a_data_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = run_args(dir.path());
        let err = run(&SetOp::Union, &args, &[A, "id\ty\n1\ta\n"]).unwrap_err();
        assert!(matches!(err, Error::Data(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn tag_collision_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let args = run_args(dir.path()).with_tag("x");
        let err = run(&SetOp::Meet, &args, &[A, B]).unwrap_err();
        assert_eq!(err.to_string(), "error in data: tag is old: x");
    }

    #[test]
    fn taken_synthetic_tag_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let args = run_args(dir.path());
        let a = "T0\n1\n2\n";
        let b = "T0\n2\n";
        assert_eq!(run(&SetOp::Sans, &args, &[a, b]).unwrap(), "T0\n1\n");
    }

    #[test]
    fn sum_forwards_tagged_stream() {
        let dir = tempfile::tempdir().unwrap();
        let args = run_args(dir.path()).with_tag("src");
        assert_eq!(
            run(&Sum, &args, &[A, B]).unwrap(),
            "id\tx\tsrc\n1\ta\t1\n2\tb\t1\n2\tb\t2\n3\tc\t2\n"
        );
        let untagged = run_args(dir.path());
        assert!(matches!(run(&Sum, &untagged, &[A, B]), Err(Error::Code(_))));
    }

    #[test]
    fn membership_rules() {
        let once_first = Tally {
            count: 1,
            first_tag: Some(b"1".to_vec()),
        };
        let once_second = Tally {
            count: 1,
            first_tag: Some(b"2".to_vec()),
        };
        let everywhere = Tally {
            count: 3,
            first_tag: Some(b"1".to_vec()),
        };
        assert!(SetOp::Sans.admits(&once_first, 3));
        assert!(!SetOp::Sans.admits(&once_second, 3));
        assert!(SetOp::Symm.admits(&once_second, 3));
        assert!(SetOp::Meet.admits(&everywhere, 3));
        assert!(!SetOp::Meet.admits(&once_first, 3));
        assert!(SetOp::Union.admits(&once_second, 3));
        assert_eq!(SetOp::ALL.iter().filter(|op| op.admits(&everywhere, 3)).count(), 2);
    }
}
