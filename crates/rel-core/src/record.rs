//! Record codec: one tab-separated line to an ordered list of byte values and back.

use std::io::{self, Write};

use crate::error::{Error, Result};

pub const FIELD_SEP: u8 = b'\t';
pub const LINE_END: u8 = b'\n';

/// One opaque field value.
pub type Value = Vec<u8>;

/// One record: a value per schema field, in schema order.
pub type Record = Vec<Value>;

/// Strip any trailing `\r` and `\n` bytes.
pub fn trim_line(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|b| *b != b'\n' && *b != b'\r')
        .map_or(0, |i| i + 1);
    &line[..end]
}

/// Split a line on the field separator. An empty line is one empty value.
pub fn split(line: &[u8]) -> Record {
    trim_line(line)
        .split(|b| *b == FIELD_SEP)
        .map(<[u8]>::to_vec)
        .collect()
}

/// Decode a body line of a relation with `width` fields.
pub fn decode(line: &[u8], width: usize) -> Result<Record> {
    let line = trim_line(line);
    if width == 0 {
        return if line.is_empty() {
            Ok(Vec::new())
        } else {
            Err(Error::data("non-empty record in a relation with no fields"))
        };
    }
    let record = split(line);
    if record.len() != width {
        return Err(Error::data(format!(
            "record has {} fields, head has {}",
            record.len(),
            width
        )));
    }
    Ok(record)
}

/// Serialize a record (tab-joined, newline-terminated) into `buf`.
pub fn encode_into<V: AsRef<[u8]>>(record: &[V], buf: &mut Vec<u8>) {
    for (i, value) in record.iter().enumerate() {
        if i > 0 {
            buf.push(FIELD_SEP);
        }
        buf.extend_from_slice(value.as_ref());
    }
    buf.push(LINE_END);
}

pub fn encode<V: AsRef<[u8]>>(record: &[V]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(record.iter().map(|v| v.as_ref().len() + 1).sum());
    encode_into(record, &mut buf);
    buf
}

/// Write one record to `out` without an intermediate buffer.
pub fn write_record<W: Write + ?Sized, V: AsRef<[u8]>>(out: &mut W, record: &[V]) -> io::Result<()> {
    for (i, value) in record.iter().enumerate() {
        if i > 0 {
            out.write_all(&[FIELD_SEP])?;
        }
        out.write_all(value.as_ref())?;
    }
    out.write_all(&[LINE_END])
}
