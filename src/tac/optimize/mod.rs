//! TAC optimizer.
//!
//! Three independent stream-to-stream passes over `Vec<TACInstr>`:
//! constant folding, constant propagation and dead-code elimination.
//! Each takes the stream by value and returns a new one, so passes can be
//! skipped, reordered or repeated freely.
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use super::{TACInstr, TACOp};
use crate::error::CompileError;

mod dce;
mod fold;
mod propagate;
#[cfg(test)]
mod tests;

pub use dce::{eliminate_dead_code, mark_dead};
pub use fold::{fold_binary, fold_constants};
pub use propagate::propagate_constants;

// ─── Pass selection ───────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pass {
    Fold,
    Propagate,
    EliminateDeadCode,
}

impl Pass {
    pub fn name(self) -> &'static str {
        match self {
            Pass::Fold => "fold",
            Pass::Propagate => "propagate",
            Pass::EliminateDeadCode => "eliminate-dead-code",
        }
    }

    pub fn apply(self, instrs: Vec<TACInstr>) -> Vec<TACInstr> {
        match self {
            Pass::Fold => fold_constants(instrs),
            Pass::Propagate => propagate_constants(instrs),
            Pass::EliminateDeadCode => eliminate_dead_code(instrs),
        }
    }
}

impl FromStr for Pass {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fold" => Ok(Pass::Fold),
            "propagate" => Ok(Pass::Propagate),
            "eliminate-dead-code" | "dce" => Ok(Pass::EliminateDeadCode),
            other => Err(CompileError::UnknownPass(other.to_string())),
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Run `passes` in order.
pub fn run_passes(instrs: Vec<TACInstr>, passes: &[Pass]) -> Vec<TACInstr> {
    let mut ir = instrs;
    for pass in passes {
        let before = ir.len();
        ir = pass.apply(ir);
        log::debug!("{}: {} -> {} instructions", pass, before, ir.len());
    }
    ir
}

// ─── Shared analysis ──────────────────────────────────────────────

/// Inclusive `(label, back_edge)` index pairs, one per loop.
///
/// A loop region runs from a label to the back-edge `Jump` that targets it.
pub(crate) fn loop_regions(instrs: &[TACInstr]) -> Vec<(usize, usize)> {
    let mut regions = Vec::new();
    for (j, instr) in instrs.iter().enumerate() {
        let TACOp::Jump {
            target,
            back_edge: true,
        } = &instr.op
        else {
            continue;
        };
        let start = instrs[..j].iter().rposition(|i| {
            matches!(&i.op, TACOp::Label { name, .. } if name == target)
        });
        if let Some(start) = start {
            regions.push((start, j));
        }
    }
    regions
}

/// Names given a module-scope word by `GlobalAssign`.
pub(crate) fn global_names(instrs: &[TACInstr]) -> HashSet<&str> {
    instrs
        .iter()
        .filter_map(|i| match &i.op {
            TACOp::GlobalAssign { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect()
}
