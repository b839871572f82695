//! Compression facade for spill files (feature-gated).
//!
//! Keep this tiny and synchronous. We only support `None`, `Zstd`, `Lz4`.
//! Whatever the codec, the logical content of a spill file is tab-joined,
//! newline-terminated records.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Codec {
    #[default]
    None,
    Zstd,
    Lz4,
}

impl Codec {
    /// Parse a codec name as given on a command line or in the environment.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "none" => Ok(Codec::None),
            "zstd" => Ok(Codec::Zstd),
            "lz4" => Ok(Codec::Lz4),
            _ => Err(Error::CodecUnsupported(name.to_string())),
        }
    }

    /// Fail early if this build cannot handle the codec.
    pub fn check_available(self) -> Result<Self> {
        match self {
            Codec::None => Ok(self),
            Codec::Zstd => {
                if cfg!(feature = "zstd") {
                    Ok(self)
                } else {
                    Err(Error::CodecUnsupported("zstd".into()))
                }
            }
            Codec::Lz4 => {
                if cfg!(feature = "lz4") {
                    Ok(self)
                } else {
                    Err(Error::CodecUnsupported("lz4".into()))
                }
            }
        }
    }

    pub fn writer(self, out: BufWriter<File>) -> Result<SpillWriter> {
        match self {
            Codec::None => Ok(SpillWriter::Plain(out)),
            Codec::Zstd => {
                #[cfg(feature = "zstd")]
                {
                    let lvl = 3;
                    Ok(SpillWriter::Zstd(zstd::stream::write::Encoder::new(out, lvl)?))
                }
                #[cfg(not(feature = "zstd"))]
                {
                    drop(out);
                    Err(Error::CodecUnsupported("zstd".into()))
                }
            }
            Codec::Lz4 => {
                #[cfg(feature = "lz4")]
                {
                    Ok(SpillWriter::Lz4(lz4_flex::frame::FrameEncoder::new(out)))
                }
                #[cfg(not(feature = "lz4"))]
                {
                    drop(out);
                    Err(Error::CodecUnsupported("lz4".into()))
                }
            }
        }
    }

    pub fn reader(self, input: BufReader<File>) -> Result<SpillReader> {
        match self {
            Codec::None => Ok(SpillReader::Plain(input)),
            Codec::Zstd => {
                #[cfg(feature = "zstd")]
                {
                    let capacity = input.capacity();
                    let decoder = zstd::stream::read::Decoder::with_buffer(input)?;
                    Ok(SpillReader::Decoded(BufReader::with_capacity(
                        capacity,
                        Box::new(decoder),
                    )))
                }
                #[cfg(not(feature = "zstd"))]
                {
                    drop(input);
                    Err(Error::CodecUnsupported("zstd".into()))
                }
            }
            Codec::Lz4 => {
                #[cfg(feature = "lz4")]
                {
                    let capacity = input.capacity();
                    let decoder = lz4_flex::frame::FrameDecoder::new(input);
                    Ok(SpillReader::Decoded(BufReader::with_capacity(
                        capacity,
                        Box::new(decoder),
                    )))
                }
                #[cfg(not(feature = "lz4"))]
                {
                    drop(input);
                    Err(Error::CodecUnsupported("lz4".into()))
                }
            }
        }
    }
}

/// Write side of a spill file. Call `finish` to complete the stream.
pub enum SpillWriter {
    Plain(BufWriter<File>),
    #[cfg(feature = "zstd")]
    Zstd(zstd::stream::write::Encoder<'static, BufWriter<File>>),
    #[cfg(feature = "lz4")]
    Lz4(lz4_flex::frame::FrameEncoder<BufWriter<File>>),
}

impl SpillWriter {
    pub fn finish(self) -> io::Result<()> {
        match self {
            SpillWriter::Plain(mut w) => w.flush(),
            #[cfg(feature = "zstd")]
            SpillWriter::Zstd(enc) => enc.finish()?.flush(),
            #[cfg(feature = "lz4")]
            SpillWriter::Lz4(enc) => enc
                .finish()
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?
                .flush(),
        }
    }
}

impl Write for SpillWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            SpillWriter::Plain(w) => w.write(buf),
            #[cfg(feature = "zstd")]
            SpillWriter::Zstd(w) => w.write(buf),
            #[cfg(feature = "lz4")]
            SpillWriter::Lz4(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            SpillWriter::Plain(w) => w.flush(),
            #[cfg(feature = "zstd")]
            SpillWriter::Zstd(w) => w.flush(),
            #[cfg(feature = "lz4")]
            SpillWriter::Lz4(w) => w.flush(),
        }
    }
}

/// Read side of a spill file, always line-buffered.
pub enum SpillReader {
    Plain(BufReader<File>),
    Decoded(BufReader<Box<dyn Read>>),
}

impl Read for SpillReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            SpillReader::Plain(r) => r.read(buf),
            SpillReader::Decoded(r) => r.read(buf),
        }
    }
}

impl BufRead for SpillReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            SpillReader::Plain(r) => r.fill_buf(),
            SpillReader::Decoded(r) => r.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            SpillReader::Plain(r) => r.consume(amt),
            SpillReader::Decoded(r) => r.consume(amt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(Codec::from_name("none").unwrap(), Codec::None);
        assert_eq!(Codec::from_name("zstd").unwrap(), Codec::Zstd);
        let err = Codec::from_name("gzip").unwrap_err();
        assert_eq!(err.to_string(), "unsupported codec: gzip");
        assert!(Codec::None.check_available().is_ok());
    }

    #[cfg(not(feature = "lz4"))]
    #[test]
    fn missing_backend_is_reported() {
        assert!(matches!(
            Codec::Lz4.check_available(),
            Err(Error::CodecUnsupported(name)) if name == "lz4"
        ));
    }
}
