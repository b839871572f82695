use std::io;

use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or inconsistent relation content: bad or duplicate names,
    /// schema mismatch between relations, tag collision, wrong record width.
    #[error("error in data: {0}")]
    Data(String),

    /// A broken engine invariant or a misuse of an engine API.
    #[error("error in code: {0}")]
    Code(String),

    /// The external sort process could not be started, fed or finished.
    #[error("sort failed: {0}")]
    Process(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    pub fn code(msg: impl Into<String>) -> Self {
        Error::Code(msg.into())
    }

    /// True when a downstream reader closed its end early.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, Error::Io(e) if e.kind() == io::ErrorKind::BrokenPipe)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Code(format!("json: {e}"))
    }
}
