//! Bounded buffered readers with a fixed cap, and line reads on top of them.
//!
//! We rely on `BufReader` with an explicit capacity to bound the in-flight
//! buffer; a record line longer than the cap still reads correctly, it just
//! takes several fills.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use rel_core::record::LINE_END;

/// A thin wrapper over `BufReader` with a fixed capacity to bound in-flight bytes.
pub struct BoundedBufReader<R: Read> {
    inner: BufReader<R>,
}

impl<R: Read> BoundedBufReader<R> {
    /// Create a new bounded reader with a maximum internal buffer size.
    pub fn with_capacity(capacity: usize, reader: R) -> Self {
        Self {
            inner: BufReader::with_capacity(capacity, reader),
        }
    }

    /// Bytes currently buffered and not yet consumed.
    pub fn buffer_len(&self) -> usize {
        self.inner.buffer().len()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

impl<R: Read> Read for BoundedBufReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read> BufRead for BoundedBufReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }
    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt)
    }
}

/// Convenience helper to create a bounded reader from a file path.
pub fn bounded_from_path<P: AsRef<Path>>(
    path: P,
    cap: usize,
) -> io::Result<BoundedBufReader<File>> {
    let file = File::open(path)?;
    Ok(BoundedBufReader::with_capacity(cap, file))
}

/// Read one line, terminator included, into a cleared `line`.
/// Returns `false` at end of input.
pub fn read_line<R: BufRead + ?Sized>(reader: &mut R, line: &mut Vec<u8>) -> io::Result<bool> {
    line.clear();
    Ok(reader.read_until(LINE_END, line)? > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn long_lines_span_fills() {
        let data = format!("{}\nshort\n", "x".repeat(100));
        let mut r = BoundedBufReader::with_capacity(8, Cursor::new(data.into_bytes()));
        assert_eq!(r.capacity(), 8);
        let mut line = Vec::new();
        assert!(read_line(&mut r, &mut line).unwrap());
        assert_eq!(line.len(), 101);
        assert!(read_line(&mut r, &mut line).unwrap());
        assert_eq!(line, b"short\n");
        assert!(!read_line(&mut r, &mut line).unwrap());
        assert_eq!(r.buffer_len(), 0);
    }
}
