//! Lazy record decoding over any buffered byte stream.

use std::io::BufRead;

use rel_core::error::Result;
use rel_core::record::{self, Record};

use crate::buf::read_line;

/// Decodes body lines of a relation with a known number of fields.
///
/// Every record is checked against `width`; the first I/O or width error is
/// yielded once and ends the sequence.
pub struct RecordReader<R> {
    reader: R,
    width: usize,
    line: Vec<u8>,
    done: bool,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R, width: usize) -> Self {
        Self {
            reader,
            width,
            line: Vec::new(),
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match read_line(&mut self.reader, &mut self.line) {
            Ok(true) => {
                let decoded = record::decode(&self.line, self.width);
                if decoded.is_err() {
                    self.done = true;
                }
                Some(decoded)
            }
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rel_core::Error;
    use std::io::Cursor;

    #[test]
    fn decodes_in_order() {
        let r = RecordReader::new(Cursor::new(b"1\ta\r\n2\tb\n3\tc".to_vec()), 2);
        let got: Vec<Record> = r.collect::<Result<_>>().unwrap();
        assert_eq!(got.len(), 3);
        assert_eq!(got[2], vec![b"3".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn stops_after_width_error() {
        let mut r = RecordReader::new(Cursor::new(b"1\ta\n2\n3\tc\n".to_vec()), 2);
        assert!(r.next().unwrap().is_ok());
        assert!(matches!(r.next(), Some(Err(Error::Data(_)))));
        assert!(r.next().is_none());
    }
}
