use std::io;

use thiserror::Error;

/// Result type local to rel-mem.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cache contains no group")]
    NoGroup,

    #[error("cache limit must be positive")]
    ZeroLimit,

    #[error("spill storage error: {0}")]
    Spill(#[from] io::Error),

    #[error("unsupported codec: {0}")]
    CodecUnsupported(String),

    #[error(transparent)]
    Record(#[from] rel_core::Error),
}

impl From<Error> for rel_core::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::NoGroup | Error::ZeroLimit | Error::CodecUnsupported(_) => {
                rel_core::Error::Code(e.to_string())
            }
            Error::Spill(io) => rel_core::Error::Io(io),
            Error::Record(inner) => inner,
        }
    }
}
