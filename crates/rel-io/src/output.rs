//! Output endpoints.
//!
//! A file target is never written directly: output goes to a temp file next
//! to it, which is renamed over the target on `commit`, or kept under its
//! temp name on `abandon` so a failed run's partial output can be inspected.

use std::fs::File;
use std::io::{self, BufWriter, Stdout, Write};
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use rel_core::error::{Error, Result};

pub enum Output {
    Stdout(BufWriter<Stdout>),
    File {
        writer: BufWriter<File>,
        temp: TempPath,
        target: PathBuf,
    },
}

impl Output {
    pub fn stdout() -> Self {
        Output::Stdout(BufWriter::new(io::stdout()))
    }

    /// Prepare to write `target`, which must not exist yet.
    pub fn file(target: &Path) -> Result<Self> {
        if target.exists() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("output file must not exist: {}", target.display()),
            )));
        }
        let dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let prefix = format!(
            "{}.",
            target
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        );
        let (file, temp) = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".tmp")
            .tempfile_in(&dir)?
            .into_parts();
        Ok(Output::File {
            writer: BufWriter::new(file),
            temp,
            target: target.to_path_buf(),
        })
    }

    /// Where the bytes are going right now.
    pub fn temp_path(&self) -> Option<&Path> {
        match self {
            Output::Stdout(_) => None,
            Output::File { temp, .. } => Some(&**temp),
        }
    }

    pub fn writer(&mut self) -> &mut dyn Write {
        match self {
            Output::Stdout(w) => w,
            Output::File { writer, .. } => writer,
        }
    }

    /// Flush and, for a file target, rename the temp file into place.
    pub fn commit(self) -> Result<()> {
        match self {
            Output::Stdout(mut w) => {
                w.flush()?;
                Ok(())
            }
            Output::File {
                mut writer,
                temp,
                target,
            } => {
                writer.flush()?;
                drop(writer);
                temp.persist(&target).map_err(|e| Error::Io(e.error))?;
                Ok(())
            }
        }
    }

    /// Flush what can be flushed and keep the temp file; return its path.
    pub fn abandon(self) -> Option<PathBuf> {
        match self {
            Output::Stdout(mut w) => {
                let _ = w.flush();
                None
            }
            Output::File {
                mut writer, temp, ..
            } => {
                let _ = writer.flush();
                drop(writer);
                temp.keep().ok()
            }
        }
    }
}
