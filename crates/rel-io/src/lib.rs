#![forbid(unsafe_code)]
//! rel-io: where relations come from and go to.
//!
//! - `input`: standard input or a file, with the header read off the top
//! - `readers`: lazy decoding of body lines into records
//! - `writers`: record serialization onto any `Write`
//! - `output`: standard output or a file written through a temp file and
//!   renamed into place only on success

pub mod buf;
pub mod input;
pub mod output;
pub mod readers;
pub mod writers;

pub use input::Input;
pub use output::Output;
pub use readers::tsv::RecordReader;
pub use writers::tsv::RecordWriter;
