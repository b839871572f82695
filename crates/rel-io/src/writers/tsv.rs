//! Streaming writer for tab-separated relations.

use std::io::Write;

use rel_core::error::Result;
use rel_core::record;
use rel_core::schema::Schema;

pub struct RecordWriter<W: Write> {
    out: W,
    written: u64,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn write_head(&mut self, schema: &Schema) -> Result<()> {
        self.write_names(schema.names())
    }

    /// Write a header from names that are already known to be valid.
    pub fn write_names<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        let fields: Vec<&[u8]> = names.iter().map(|n| n.as_ref().as_bytes()).collect();
        record::write_record(&mut self.out, &fields)?;
        Ok(())
    }

    pub fn write<V: AsRef<[u8]>>(&mut self, record: &[V]) -> Result<()> {
        record::write_record(&mut self.out, record)?;
        self.written += 1;
        Ok(())
    }

    /// Body records written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_head_and_body() {
        let mut w = RecordWriter::new(Vec::new());
        w.write_head(&Schema::new(["id", "x"]).unwrap()).unwrap();
        w.write(&[b"1".as_slice(), b"a".as_slice()]).unwrap();
        w.write(&Vec::<Vec<u8>>::new()).unwrap();
        assert_eq!(w.written(), 2);
        assert_eq!(w.into_inner(), b"id\tx\n1\ta\n\n");
    }

    #[test]
    fn zero_field_head_is_an_empty_line() {
        let mut w = RecordWriter::new(Vec::new());
        w.write_head(&Schema::default()).unwrap();
        assert_eq!(w.into_inner(), b"\n");
    }
}
