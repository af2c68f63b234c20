//! Compilation options: which passes run and how calls return.

use std::fmt;
use std::str::FromStr;

use crate::error::CompileError;
use crate::tac::optimize::Pass;

/// How the emitter links calls to returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReturnProtocol {
    /// `jal` into the callee, which moves `$sp` past the caller's frame,
    /// keeps `$ra` at `0($sp)` and returns with `jr $ra`.
    #[default]
    LinkRegister,
    /// Single shared return label `f1` placed after every call site; every
    /// `Return` jumps to it and every `EndFunc` exits. Only holds for one
    /// call at a time.
    Trampoline,
}

impl ReturnProtocol {
    pub fn name(self) -> &'static str {
        match self {
            ReturnProtocol::LinkRegister => "link-register",
            ReturnProtocol::Trampoline => "trampoline",
        }
    }
}

impl FromStr for ReturnProtocol {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "link-register" | "ra" => Ok(ReturnProtocol::LinkRegister),
            "trampoline" => Ok(ReturnProtocol::Trampoline),
            other => Err(CompileError::UnknownProtocol(other.to_string())),
        }
    }
}

impl fmt::Display for ReturnProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Caller-supplied knobs for one compilation.
///
/// The default runs no optimization passes; callers opt in by listing
/// passes in the order they should run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub passes: Vec<Pass>,
    pub protocol: ReturnProtocol,
}

impl CompileOptions {
    /// Parse an ordered list of pass names.
    pub fn with_pass_names<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self, CompileError> {
        self.passes = names
            .iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    pub fn with_protocol(mut self, protocol: ReturnProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// All three passes in the classic order.
    pub fn all_passes() -> Self {
        Self {
            passes: vec![Pass::Fold, Pass::Propagate, Pass::EliminateDeadCode],
            ..Self::default()
        }
    }
}
