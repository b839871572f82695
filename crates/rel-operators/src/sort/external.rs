//! External sort through a child `sort` process.
//!
//! The child always runs with `LC_ALL=C`, so the output order is the bytewise
//! order that `Key`'s derived `Ord` also uses. A stream that needs neither
//! deduplication nor keyed ordering is decoded directly, with no child.
//!
//! Nothing happens until the first record is requested. At that point the
//! child is spawned, the whole remaining input is copied into its stdin (with
//! `\r\n` line ends cut back to `\n`) and stdin is closed, and only then is stdout read. `sort` produces no output
//! before end of input, so feeding and reading on one thread cannot deadlock.

use std::ffi::OsString;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::mem;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use rel_core::config::RelConfig;
use rel_core::error::{Error, Result};
use rel_core::key::KeySpec;
use rel_core::record::{self, Record};
use rel_io::buf::read_line;
use rel_io::{Input, RecordReader};

/// What the order provider must guarantee about its output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortOptions {
    /// Drop duplicate lines (whole-line comparison).
    pub unique: bool,
    /// Order by these fields, stably. Empty means no keyed order.
    pub key: KeySpec,
}

impl SortOptions {
    pub fn unique() -> Self {
        Self {
            unique: true,
            key: KeySpec::default(),
        }
    }

    pub fn keyed(key: KeySpec) -> Self {
        Self { unique: false, key }
    }

    pub fn needs_child(&self) -> bool {
        self.unique || !self.key.is_empty()
    }

    /// Arguments for the sort program, excluding the program itself.
    pub fn command_args(&self, config: &RelConfig) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        if self.unique {
            args.push("--unique".into());
        } else {
            args.push("--stable".into());
        }
        if !self.key.is_empty() {
            args.push(format!("--field-separator={}", record::FIELD_SEP as char).into());
            for k in self.key.sort_fields() {
                args.push(format!("--key={k},{k}").into());
            }
        }
        if let Some(size) = &config.sort_buffer_size {
            args.push(format!("--buffer-size={size}").into());
        }
        if let Some(dir) = &config.tmp_dir {
            let mut arg = OsString::from("--temporary-directory=");
            arg.push(dir);
            args.push(arg);
        }
        args
    }
}

/// A lazily ordered record sequence.
pub enum Records {
    /// Input order, decoded in-process.
    Direct(RecordReader<Box<dyn BufRead>>),
    /// Output of a child sort.
    Sorted(SortedRecords),
}

/// Order the rest of `input` (its header already consumed) as `options` say.
pub fn records(input: Input, width: usize, options: &SortOptions, config: &RelConfig) -> Records {
    if options.needs_child() {
        Records::Sorted(SortedRecords::new(
            input.into_reader(),
            width,
            options.command_args(config),
            config,
        ))
    } else {
        Records::Direct(input.records(width))
    }
}

impl Iterator for Records {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Records::Direct(r) => r.next(),
            Records::Sorted(s) => s.next(),
        }
    }
}

enum State {
    Pending(Box<dyn BufRead>),
    Running {
        child: Child,
        stdout: BufReader<ChildStdout>,
    },
    Done,
}

/// Records read back from a child sort, which is started on first use.
///
/// The first failure (spawn, feed, decode, or a non-zero exit noticed at end
/// of output) is yielded once and ends the sequence. Dropping the sequence
/// early kills and reaps a still-running child.
pub struct SortedRecords {
    program: String,
    args: Vec<OsString>,
    width: usize,
    capacity: usize,
    state: State,
    line: Vec<u8>,
}

impl SortedRecords {
    pub fn new(input: Box<dyn BufRead>, width: usize, args: Vec<OsString>, config: &RelConfig) -> Self {
        Self {
            program: config.sort_program.clone(),
            args,
            width,
            capacity: config.read_buffer_bytes,
            state: State::Pending(input),
            line: Vec::new(),
        }
    }

    fn start(&mut self) -> Result<()> {
        let mut input = match mem::replace(&mut self.state, State::Done) {
            State::Pending(input) => input,
            other => {
                self.state = other;
                return Ok(());
            }
        };

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env("LC_ALL", "C")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::Process(format!("cannot start {}: {e}", self.program)))?;

        #[cfg(feature = "tracing")]
        tracing::debug!(program = %self.program, args = ?self.args, pid = child.id(), "spawned sort");

        let fed = match child.stdin.take() {
            // stdin is closed when the handle drops at the end of this arm
            Some(mut stdin) => feed(&mut *input, &mut stdin, &self.program),
            None => Err(Error::Process(format!("{}: no stdin pipe", self.program))),
        };
        let stdout = fed.and_then(|_bytes| {
            #[cfg(feature = "tracing")]
            tracing::trace!(bytes = _bytes, "fed sort");
            child
                .stdout
                .take()
                .ok_or_else(|| Error::Process(format!("{}: no stdout pipe", self.program)))
        });
        match stdout {
            Ok(stdout) => {
                self.state = State::Running {
                    child,
                    stdout: BufReader::with_capacity(self.capacity, stdout),
                };
                Ok(())
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(e)
            }
        }
    }

    /// Reap the child after end of output and check its exit status.
    fn finish(&mut self) -> Result<()> {
        if let State::Running { mut child, stdout } = mem::replace(&mut self.state, State::Done) {
            drop(stdout);
            let status = child.wait()?;

            #[cfg(feature = "tracing")]
            tracing::debug!(program = %self.program, %status, "sort exited");

            if !status.success() {
                return Err(Error::Process(format!("{} exited with {status}", self.program)));
            }
        }
        Ok(())
    }

    /// Abandon the child, if any.
    fn stop(&mut self) {
        if let State::Running { mut child, stdout } = mem::replace(&mut self.state, State::Done) {
            drop(stdout);
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Copy every line to the child with its line end normalized to `\n`, so the
/// child orders the same bytes that `record::decode` later yields.
fn feed(input: &mut dyn BufRead, stdin: &mut ChildStdin, program: &str) -> Result<u64> {
    let broken = |e: std::io::Error| Error::Process(format!("feeding {program}: {e}"));
    let mut out = BufWriter::new(stdin);
    let mut line = Vec::new();
    let mut fed = 0u64;
    while read_line(input, &mut line)? {
        let body = record::trim_line(&line);
        out.write_all(body).map_err(broken)?;
        out.write_all(&[record::LINE_END]).map_err(broken)?;
        fed += body.len() as u64 + 1;
    }
    out.flush().map_err(broken)?;
    Ok(fed)
}

impl Iterator for SortedRecords {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, State::Pending(_)) {
            if let Err(e) = self.start() {
                return Some(Err(e));
            }
        }
        let stdout = match &mut self.state {
            State::Running { stdout, .. } => stdout,
            _ => return None,
        };
        match read_line(stdout, &mut self.line) {
            Ok(true) => {
                let decoded = record::decode(&self.line, self.width);
                if decoded.is_err() {
                    self.stop();
                }
                Some(decoded)
            }
            Ok(false) => match self.finish() {
                Ok(()) => None,
                Err(e) => Some(Err(e)),
            },
            Err(e) => {
                self.stop();
                Some(Err(e.into()))
            }
        }
    }
}

impl Drop for SortedRecords {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(body: &str) -> Input {
        Input::from_bytes("t", body)
    }

    fn collect(r: Records) -> Vec<String> {
        r.map(|r| {
            let r = r.unwrap();
            let fields: Vec<String> = r.iter().map(|v| String::from_utf8_lossy(v).into_owned()).collect();
            fields.join(",")
        })
        .collect()
    }

    #[test]
    fn neither_flag_reads_in_place() {
        let cfg = RelConfig {
            sort_program: "/nonexistent/sort".into(),
            ..Default::default()
        };
        let r = records(input("b\t1\na\t2\n"), 2, &SortOptions::default(), &cfg);
        assert!(matches!(r, Records::Direct(_)));
        assert_eq!(collect(r), vec!["b,1", "a,2"]);
    }

    #[test]
    fn keyed_sort_is_stable() {
        let cfg = RelConfig::default();
        let opts = SortOptions::keyed(KeySpec::new(vec![0]));
        let r = records(input("b\t1\na\t2\nb\t0\na\t1\n"), 2, &opts, &cfg);
        assert_eq!(collect(r), vec!["a,2", "a,1", "b,1", "b,0"]);
    }

    #[test]
    fn second_field_key() {
        let cfg = RelConfig::default();
        let opts = SortOptions::keyed(KeySpec::new(vec![1]));
        let r = records(input("x\tb\ny\ta\nz\tb\n"), 2, &opts, &cfg);
        assert_eq!(collect(r), vec!["y,a", "x,b", "z,b"]);
    }

    #[test]
    fn crlf_lines_sort_on_decoded_values() {
        let cfg = RelConfig::default();
        let opts = SortOptions::keyed(KeySpec::new(vec![1]));
        // With the `\r` left on, "b\x01\r" would sort before "b\r".
        let r = records(input("1\tb\x01\r\n2\tb\r\n3\ta\r\n"), 2, &opts, &cfg);
        assert_eq!(collect(r), vec!["3,a", "2,b", "1,b\u{1}"]);

        let r = records(input("b\r\nb\n\ra\r\n"), 1, &SortOptions::unique(), &cfg);
        assert_eq!(collect(r), vec!["\ra", "b"]);
    }

    #[test]
    fn unique_drops_duplicates_in_byte_order() {
        let cfg = RelConfig::default();
        let r = records(input("b\na\nb\n\u{e9}\nZ\n"), 1, &SortOptions::unique(), &cfg);
        assert_eq!(collect(r), vec!["Z", "a", "b", "\u{e9}"]);
    }

    #[test]
    fn command_line() {
        let cfg = RelConfig {
            sort_buffer_size: Some("10M".into()),
            tmp_dir: Some("/var/tmp".into()),
            ..Default::default()
        };
        let args = SortOptions::keyed(KeySpec::new(vec![0, 2])).command_args(&cfg);
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec![
                "--stable",
                "--field-separator=\t",
                "--key=1,1",
                "--key=3,3",
                "--buffer-size=10M",
                "--temporary-directory=/var/tmp",
            ]
        );
    }

    #[test]
    fn missing_program_fails_lazily() {
        let cfg = RelConfig {
            sort_program: "/nonexistent/sort".into(),
            ..Default::default()
        };
        let mut r = records(input("a\n"), 1, &SortOptions::unique(), &cfg);
        assert!(matches!(r.next(), Some(Err(Error::Process(_)))));
        assert!(r.next().is_none());
    }

    #[test]
    fn non_zero_exit_is_a_process_error() {
        let cfg = RelConfig {
            sort_program: "false".into(),
            ..Default::default()
        };
        let r = records(input("a\n"), 1, &SortOptions::unique(), &cfg);
        let results: Vec<Result<Record>> = r.collect();
        assert!(matches!(results.last(), Some(Err(Error::Process(_)))));
    }

    #[test]
    fn width_mismatch_from_sorted_output() {
        let cfg = RelConfig::default();
        let opts = SortOptions::keyed(KeySpec::new(vec![0]));
        let mut r = records(input("a\t1\nb\n"), 2, &opts, &cfg);
        assert!(r.next().unwrap().is_ok());
        assert!(matches!(r.next(), Some(Err(Error::Data(_)))));
        assert!(r.next().is_none());
    }
}
