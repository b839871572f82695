//! Scratch files for spilled records and other engine-private temporaries.
//!
//! A `ScratchFile` owns one named temporary file. It can be rewritten from
//! the start and reread any number of times, and it is removed on `remove`
//! or, failing that, when dropped. Every scratch file has exactly one owner.

pub mod codec;

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use tempfile::TempPath;

pub use codec::{Codec, SpillReader, SpillWriter};

#[derive(Debug)]
pub struct ScratchFile {
    path: TempPath,
}

impl ScratchFile {
    /// Create an empty file `<prefix>XXXXXX<suffix>` in `dir`.
    pub fn create(dir: &Path, prefix: &str, suffix: &str) -> io::Result<Self> {
        let path = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(dir)?
            .into_temp_path();

        #[cfg(feature = "tracing")]
        tracing::debug!(path = %path.display(), "created scratch file");

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncate and open for writing from the start.
    pub fn rewrite(&self) -> io::Result<BufWriter<File>> {
        Ok(BufWriter::new(File::create(&self.path)?))
    }

    /// Open for reading from the start.
    pub fn reader(&self, capacity: usize) -> io::Result<BufReader<File>> {
        Ok(BufReader::with_capacity(capacity, File::open(&self.path)?))
    }

    /// Delete the file now, reporting any failure.
    pub fn remove(self) -> io::Result<()> {
        #[cfg(feature = "tracing")]
        tracing::debug!(path = %self.path.display(), "removing scratch file");

        self.path.close()
    }
}
