//! Dead-code elimination.
//!
//! A definition is dead when nothing reads the name afterwards, or when
//! the same straight-line stretch overwrites it before the next read.
//! Definitions inside a loop are never touched: a single forward scan
//! cannot see reads on the next iteration.

use std::collections::{HashMap, HashSet};

use super::{global_names, loop_regions};
use crate::tac::{is_number, is_temp, TACInstr, TACOp};

/// Remove dead definitions until none are left.
pub fn eliminate_dead_code(ops: Vec<TACInstr>) -> Vec<TACInstr> {
    let mut ir = ops;
    loop {
        let before = ir.len();
        ir = mark_dead(ir)
            .into_iter()
            .filter(|i| !i.flags.dead)
            .collect();
        if ir.len() == before {
            break;
        }
    }
    ir
}

/// Set `flags.dead` on every dead definition without removing anything.
pub fn mark_dead(mut ops: Vec<TACInstr>) -> Vec<TACInstr> {
    let globals: HashSet<String> = global_names(&ops)
        .into_iter()
        .map(str::to_string)
        .collect();
    let regions = loop_regions(&ops);
    let in_loop = |index: usize| regions.iter().any(|&(s, e)| s <= index && index <= e);

    // ── Pass 1: use and definition indices per name ──
    let mut uses: HashMap<String, Vec<usize>> = HashMap::new();
    let mut defs: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, instr) in ops.iter().enumerate() {
        for operand in instr.operands() {
            if !operand.is_empty() && !is_number(operand) {
                uses.entry(operand.to_string()).or_default().push(i);
            }
        }
        if let Some(name) = instr.defined_name() {
            defs.entry(name.to_string()).or_default().push(i);
        }
    }

    // ── Pass 2: classify each definition ──
    let mut dead = Vec::new();
    for (i, instr) in ops.iter().enumerate() {
        let Some(name) = instr.defined_name() else {
            continue;
        };
        if globals.contains(name) || in_loop(i) || assigns_temp(instr) {
            continue;
        }

        let next_use = uses
            .get(name)
            .and_then(|indices| indices.iter().copied().find(|&j| j > i));
        let is_dead = match next_use {
            None => true,
            Some(j) => defs
                .get(name)
                .and_then(|indices| indices.iter().copied().find(|&k| k > i && k < j))
                .is_some_and(|k| !ops[i + 1..k].iter().any(TACInstr::is_control_flow)),
        };
        if is_dead {
            dead.push(i);
        }
    }

    log::debug!("dce: {} dead definitions", dead.len());
    for i in dead {
        ops[i].flags.dead = true;
    }
    ops
}

/// `x := tN` copies are kept unconditionally.
fn assigns_temp(instr: &TACInstr) -> bool {
    matches!(&instr.op, TACOp::LocalAssign { value, .. } if is_temp(value))
}
