//! Input endpoints: a named byte stream whose first line is the header.

use std::fmt;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::Path;

use rel_core::error::{Error, Result};
use rel_core::schema::Schema;

use crate::buf::{bounded_from_path, read_line};
use crate::readers::tsv::RecordReader;

/// The argument that names standard input.
pub const STDIN_ARG: &str = "-";

pub struct Input {
    name: String,
    reader: Box<dyn BufRead>,
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Input").field("name", &self.name).finish()
    }
}

impl Input {
    pub fn stdin(capacity: usize) -> Self {
        Self {
            name: "<stdin>".to_string(),
            reader: Box::new(BufReader::with_capacity(capacity, io::stdin())),
        }
    }

    pub fn open(path: &Path, capacity: usize) -> Result<Self> {
        let reader = bounded_from_path(path, capacity).map_err(|e| {
            Error::Io(io::Error::new(e.kind(), format!("{}: {e}", path.display())))
        })?;
        Ok(Self {
            name: path.display().to_string(),
            reader: Box::new(reader),
        })
    }

    /// `-` is standard input, anything else a file path.
    pub fn from_arg(arg: &str, capacity: usize) -> Result<Self> {
        if arg == STDIN_ARG {
            Ok(Self::stdin(capacity))
        } else {
            Self::open(Path::new(arg), capacity)
        }
    }

    pub fn from_reader(name: impl Into<String>, reader: impl BufRead + 'static) -> Self {
        Self {
            name: name.into(),
            reader: Box::new(reader),
        }
    }

    /// An in-memory relation, mostly for tests and embedding.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::from_reader(name, Cursor::new(bytes.into()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read and validate the header line.
    pub fn read_head(&mut self) -> Result<Schema> {
        let mut line = Vec::new();
        if !read_line(&mut self.reader, &mut line)? {
            return Err(Error::data(format!("no head in {}", self.name)));
        }
        Schema::parse(&line).map_err(|e| match e {
            Error::Data(msg) => Error::Data(format!("{}: {msg}", self.name)),
            other => other,
        })
    }

    /// Read the header and require every name in `old`.
    pub fn read_head_with<S: AsRef<str>>(&mut self, old: &[S]) -> Result<Schema> {
        let schema = self.read_head()?;
        schema.require_old(old)?;
        Ok(schema)
    }

    /// Decode the rest of the stream in order, no child process.
    pub fn records(self, width: usize) -> RecordReader<Box<dyn BufRead>> {
        RecordReader::new(self.reader, width)
    }

    /// The remaining bytes, positioned just after whatever was read so far.
    pub fn into_reader(self) -> Box<dyn BufRead> {
        self.reader
    }
}
