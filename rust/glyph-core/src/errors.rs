//! Per-call failure taxonomy.
//!
//! Every host module returns `Result<Value, CallError>`; no module aborts the
//! process. How a failed call surfaces to the script (halt, script-level
//! exception, …) is the embedding engine's decision.

use std::path::PathBuf;

use thiserror::Error;

use crate::grammar::BuildError;

#[derive(Debug, Error)]
pub enum CallError {
    #[error("argument slot {0} is missing")]
    MissingArgument(u32),

    #[error("argument slot {slot}: expected {expected}, found {found}")]
    TypeMismatch {
        slot: u32,
        expected: &'static str,
        found: &'static str,
    },

    #[error("malformed {what} literal: {input:?}")]
    ParseError { what: &'static str, input: String },

    #[error("invalid boolean literal: {0:?}")]
    InvalidBoolLiteral(String),

    #[error("index {index} out of bounds for list of length {len}")]
    IndexOutOfRange { index: u64, len: usize },

    #[error("path {0:?} escapes the sandbox root")]
    PathEscapesSandbox(PathBuf),

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("lock already held on {0:?}")]
    LockHeld(PathBuf),

    #[error("handle is shared by another caller and cannot be consumed")]
    HandleInUse,

    #[error("short read: wanted {wanted} bytes, got {got}")]
    ShortRead { wanted: u64, got: u64 },

    #[error("parser left {0} unconsumed bytes")]
    IncompleteParse(usize),

    #[error("interpreter produced no results")]
    EmptyResult,

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("engine: {0}")]
    Engine(String),
}

impl CallError {
    /// Shorthand for the ubiquitous "slot present but wrongly typed" case.
    pub fn mismatch(slot: u32, expected: &'static str, found: &'static str) -> Self {
        CallError::TypeMismatch {
            slot,
            expected,
            found,
        }
    }
}
