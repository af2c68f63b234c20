//! Error types for the TAC back end.
//!
//! Using thiserror for idiomatic error handling.

use std::path::PathBuf;

use thiserror::Error;

/// Failures at the crate boundary: reading input and decoding options.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed syntax tree: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown pass `{0}` (expected fold, propagate or eliminate-dead-code)")]
    UnknownPass(String),

    #[error("unknown return protocol `{0}` (expected link-register or trampoline)")]
    UnknownProtocol(String),
}

/// Result type alias for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;

/// Why a constant fold was skipped. The instruction is kept as written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("division by zero: {lhs} / 0")]
    DivisionByZero { lhs: String },

    #[error("`{0}` is not an integer literal")]
    MalformedLiteral(String),
}

/// Runtime faults of the reference interpreter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterpError {
    #[error("no `main` function")]
    NoEntry,

    #[error("call to unknown function `{0}`")]
    UnknownFunction(String),

    #[error("jump to unknown label `{0}`")]
    UnknownLabel(String),

    #[error("read of undefined variable `{0}`")]
    UndefinedVariable(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("`{0}` is not an integer literal")]
    MalformedLiteral(String),

    #[error("readIntFromSTDIN: input exhausted")]
    InputExhausted,

    #[error("step limit of {0} exceeded")]
    StepLimit(usize),
}
