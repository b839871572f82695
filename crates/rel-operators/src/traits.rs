//! Operator trait + common interfaces.
//!
//! The exec runtime resolves input endpoints, looks the operator up in the
//! `Registry`, checks the input count against `arity()`, then calls `run`
//! once with all inputs and the output sink.

use std::io::Write;

use rel_core::config::RelConfig;
use rel_core::error::Result;
use rel_io::Input;
use serde::{Deserialize, Serialize};

/// Per-invocation parameters shared by every operator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunArgs {
    /// Name of the origin tag field. Required by `sum`, optional for the
    /// set operations (synthesized when absent), ignored by the rest.
    pub tag: Option<String>,

    pub config: RelConfig,
}

impl RunArgs {
    pub fn new(config: RelConfig) -> Self {
        Self { tag: None, config }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// How many input relations an operator takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    /// `None` means unbounded.
    pub max: Option<usize>,
}

impl Arity {
    pub const BINARY: Arity = Arity {
        min: 2,
        max: Some(2),
    };

    pub const AT_LEAST_TWO: Arity = Arity { min: 2, max: None };

    pub fn admits(&self, n: usize) -> bool {
        n >= self.min && self.max.map_or(true, |max| n <= max)
    }
}

/// What a finished run produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Body records written to the output (header excluded).
    pub records_out: u64,
}

/// Trait that all operators implement.
///
/// Invariants:
/// - `run` writes the output header before any body record, and only after
///   every input header has been read and validated.
/// - Scratch files created during `run` are gone when it returns, whether
///   it succeeds or not.
pub trait Operator: Send + Sync + 'static {
    /// Operator name as used on the command line (stable).
    fn name(&self) -> &'static str;

    fn arity(&self) -> Arity;

    fn run(&self, args: &RunArgs, inputs: Vec<Input>, out: &mut dyn Write) -> Result<RunStats>;
}

/// Shared input-count check so operators can be called directly.
pub(crate) fn check_arity(op: &dyn Operator, inputs: &[Input]) -> Result<()> {
    if op.arity().admits(inputs.len()) {
        Ok(())
    } else {
        Err(rel_core::Error::code(format!(
            "{} cannot take {} input relations",
            op.name(),
            inputs.len()
        )))
    }
}
