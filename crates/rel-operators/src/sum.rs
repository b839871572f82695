//! Tagged concatenation of relations that share one set of field names.
//!
//! Every input is permuted into the field order of the first one, its body
//! is appended to a scratch file, and each record gets one extra field: the
//! 1-based position of the relation it came from. The scratch file holds a
//! header line too, so it reads back like any other relation.

use rel_core::config::RelConfig;
use rel_core::error::{Error, Result};
use rel_core::record::Record;
use rel_core::schema::{is_name, Schema};
use rel_io::{Input, RecordWriter};
use rel_mem::ScratchFile;

const SCRATCH_PREFIX: &str = "relsum-";
const SCRATCH_SUFFIX: &str = ".tsv.tmp";

/// First of `T0`, `T1`, ... that is not a field of `schema`.
pub fn synthesize_tag(schema: &Schema) -> String {
    (0..=schema.len())
        .map(|k| format!("T{k}"))
        .find(|t| !schema.contains(t))
        .unwrap_or_else(|| format!("T{}", schema.len() + 1))
}

/// Check a caller-supplied tag name against the schema it extends.
pub fn check_tag(schema: &Schema, tag: &str) -> Result<()> {
    if !is_name(tag.as_bytes()) {
        return Err(Error::data(format!("bad field names: {tag:?}")));
    }
    if schema.contains(tag) {
        return Err(Error::data(format!("tag is old: {tag}")));
    }
    Ok(())
}

/// The tagged concatenation, materialized. Dropping it deletes the file.
#[derive(Debug)]
pub struct SumFile {
    scratch: ScratchFile,
    /// Schema of the inputs, without the tag.
    schema: Schema,
    tag: String,
    relations: usize,
    records: u64,
}

impl SumFile {
    /// Read every header, then every body, into a new scratch file.
    ///
    /// All header checks happen before any body record is read. On failure
    /// the scratch file is already gone when this returns.
    pub fn build(inputs: Vec<Input>, tag: Option<&str>, config: &RelConfig) -> Result<SumFile> {
        if inputs.len() < 2 {
            return Err(Error::code(format!(
                "tagged concatenation needs at least two relations, got {}",
                inputs.len()
            )));
        }

        let mut heads = Vec::with_capacity(inputs.len());
        let mut inputs = inputs;
        for input in inputs.iter_mut() {
            heads.push(input.read_head()?);
        }
        let schema = heads[0].clone();
        for (input, head) in inputs.iter().zip(&heads).skip(1) {
            schema
                .require_same_names(head)
                .map_err(|e| prefix_data(e, input.name()))?;
        }

        let tag = match tag {
            Some(t) => {
                check_tag(&schema, t)?;
                t.to_string()
            }
            None => synthesize_tag(&schema),
        };
        let tagged = schema.with_field(&tag)?;

        let scratch = ScratchFile::create(&config.scratch_dir(), SCRATCH_PREFIX, SCRATCH_SUFFIX)?;
        let mut out = RecordWriter::new(scratch.rewrite()?);
        out.write_head(&tagged)?;

        let relations = inputs.len();
        for (k, (input, head)) in inputs.into_iter().zip(heads).enumerate() {
            let origin = (k + 1).to_string().into_bytes();
            let order = head.positions(schema.names())?;
            let identity = order.positions().iter().enumerate().all(|(i, &p)| i == p);
            let mut row: Record = Vec::with_capacity(schema.len() + 1);
            for r in input.records(head.len()) {
                let r = r?;
                row.clear();
                if identity {
                    row.extend(r);
                } else {
                    row.extend(order.positions().iter().map(|&p| r[p].clone()));
                }
                row.push(origin.clone());
                out.write(&row)?;
            }
        }
        out.flush()?;
        let records = out.written();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            relations,
            records,
            tag = %tag,
            path = %scratch.path().display(),
            "built tagged concatenation"
        );

        Ok(SumFile {
            scratch,
            schema,
            tag,
            relations,
            records,
        })
    }

    /// Field names shared by every input, in the first input's order.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn relations(&self) -> usize {
        self.relations
    }

    /// Body records in the file.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// A fresh reader from the start of the file, header included.
    pub fn open(&self, config: &RelConfig) -> Result<Input> {
        let reader = self.scratch.reader(config.read_buffer_bytes)?;
        Ok(Input::from_reader(
            self.scratch.path().display().to_string(),
            reader,
        ))
    }

    pub fn remove(self) -> Result<()> {
        self.scratch.remove()?;
        Ok(())
    }
}

fn prefix_data(e: Error, name: &str) -> Error {
    match e {
        Error::Data(msg) => Error::Data(format!("{name}: {msg}")),
        other => other,
    }
}
