//! Runtime: resolve endpoints, run one operator, settle the output.
//!
//! - Instantiates operators via `rel-operators::registry`.
//! - Input `-` is standard input; at most one input may be.
//! - A file output must not exist beforehand. It is written to a temp file
//!   in the same directory and renamed into place only after the operator
//!   succeeded; on failure the temp file is kept and reported.
//! - Scratch files belong to the operators and are gone either way.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rel_core::config::RelConfig;
use rel_io::input::STDIN_ARG;
use rel_io::{Input, Output};
use rel_operators::registry::Registry;
use rel_operators::traits::{RunArgs, RunStats};

use crate::metrics::emit_span;

pub const DEFAULT_PROGRAM: &str = "reltools";

#[derive(Debug, Error)]
pub enum ExecError {
    /// Bad command line; nothing was read or written.
    #[error("{0}")]
    Usage(String),

    /// The operator or an endpoint failed. `kept` is the partial output.
    #[error("{source}")]
    Run {
        source: rel_core::Error,
        kept: Option<PathBuf>,
    },

    /// The operator succeeded but the output could not be moved into place.
    #[error("{0}")]
    Persist(rel_core::Error),
}

/// One command: operation name, input arguments, optional output file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub operation: String,
    /// File paths, or `-` for standard input.
    pub inputs: Vec<String>,
    pub out: Option<PathBuf>,
    pub tag: Option<String>,
}

impl Invocation {
    pub fn new<S: Into<String>>(operation: impl Into<String>, inputs: impl IntoIterator<Item = S>) -> Self {
        Self {
            operation: operation.into(),
            inputs: inputs.into_iter().map(Into::into).collect(),
            out: None,
            tag: None,
        }
    }

    pub fn with_out(mut self, out: impl Into<PathBuf>) -> Self {
        self.out = Some(out.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub operation: String,
    pub relations: usize,
    pub records_out: u64,
    pub out: Option<PathBuf>,
}

impl RunReport {
    pub fn to_json(&self) -> rel_core::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Engine owns the configuration and the operator registry.
pub struct Engine {
    cfg: RelConfig,
    registry: Registry,
    program: String,
}

impl Engine {
    pub fn new(cfg: RelConfig) -> Self {
        Self {
            cfg,
            registry: Registry::new(),
            program: DEFAULT_PROGRAM.to_string(),
        }
    }

    /// Name used as the prefix of every reported message.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn config(&self) -> &RelConfig {
        &self.cfg
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn run(&self, inv: &Invocation) -> Result<RunReport, ExecError> {
        let op = self
            .registry
            .make(&inv.operation)
            .ok_or_else(|| ExecError::Usage(format!("unknown operation: {}", inv.operation)))?;
        if !op.arity().admits(inv.inputs.len()) {
            return Err(ExecError::Usage(format!(
                "{} cannot take {} input relations",
                op.name(),
                inv.inputs.len()
            )));
        }
        if inv.inputs.iter().filter(|a| a.as_str() == STDIN_ARG).count() > 1 {
            return Err(ExecError::Usage(
                "at most one input can be standard input".to_string(),
            ));
        }
        if let Some(path) = &inv.out {
            if path.exists() {
                return Err(ExecError::Usage("--out file must not exist".to_string()));
            }
        }

        let failed = |source| ExecError::Run { source, kept: None };
        let inputs = inv
            .inputs
            .iter()
            .map(|arg| Input::from_arg(arg, self.cfg.read_buffer_bytes))
            .collect::<rel_core::Result<Vec<_>>>()
            .map_err(failed)?;
        let mut out = match &inv.out {
            Some(path) => Output::file(path).map_err(failed)?,
            None => Output::stdout(),
        };

        let args = RunArgs {
            tag: inv.tag.clone(),
            config: self.cfg.clone(),
        };

        #[cfg(feature = "tracing")]
        tracing::info!(operation = op.name(), inputs = ?inv.inputs, out = ?out.temp_path(), "starting");
        emit_span("start", &[("operation", op.name().to_string())]);

        let stats: RunStats = match op.run(&args, inputs, out.writer()) {
            Ok(stats) => stats,
            Err(source) => {
                let kept = out.abandon();
                return Err(ExecError::Run { source, kept });
            }
        };
        out.commit().map_err(|e| {
            if e.is_broken_pipe() {
                failed(e)
            } else {
                ExecError::Persist(e)
            }
        })?;

        let report = RunReport {
            operation: op.name().to_string(),
            relations: inv.inputs.len(),
            records_out: stats.records_out,
            out: inv.out.clone(),
        };

        #[cfg(feature = "tracing")]
        tracing::info!(operation = op.name(), records_out = stats.records_out, "finished");
        if let Ok(json) = report.to_json() {
            emit_span("finish", &[("report", json)]);
        }
        Ok(report)
    }

    /// Lines to print on standard error for a failed run.
    pub fn report(&self, err: &ExecError) -> Vec<String> {
        let p = &self.program;
        match err {
            ExecError::Usage(msg) => vec![format!("{p}: {msg}")],
            ExecError::Run { source, kept } => {
                let mut lines = Vec::with_capacity(3);
                if source.is_broken_pipe() {
                    lines.push(format!("{p}: broken pipe"));
                } else {
                    lines.push(format!("{p}: {source}"));
                }
                lines.push(format!("{p}: non-zero status 1"));
                if let Some(temp) = kept {
                    lines.push(format!("{p}: leaving output in {}", temp.display()));
                }
                lines
            }
            ExecError::Persist(e) => vec![format!("{p}: {e}")],
        }
    }

    /// Run, report any failure on standard error, return the exit status.
    pub fn execute(&self, inv: &Invocation) -> i32 {
        match self.run(inv) {
            Ok(_) => 0,
            Err(e) => {
                for line in self.report(&e) {
                    eprintln!("{line}");
                }
                1
            }
        }
    }
}
