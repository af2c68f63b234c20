//! Constant propagation.
//!
//! Walks the stream once, left to right, keeping a `name → literal` table.
//! `x := 5` records `x`; later `BinaryOp` operands and `LocalAssign` values
//! naming `x` are replaced by `5`.
//!
//! Redefining a recorded name switches propagation off for the rest of the
//! stream, with one exception per `if`/`else` region (from a `CondBranch`
//! to its matching if-terminator label) to allow the duplicate definition
//! two-armed branches produce. Regions nest; an inner terminator closes only
//! the inner region.

use std::collections::{HashMap, HashSet};

use super::{global_names, loop_regions};
use crate::tac::{is_number, LabelRole, TACInstr, TACOp};

/// One `if` or loop nesting level.
#[derive(Debug, Default)]
struct Region {
    /// Opened by a loop test label rather than a branch.
    is_loop: bool,
    /// A `CondBranch` belongs to this region.
    branched: bool,
    allowance_used: bool,
    /// Names defined since the region opened, nested regions included.
    defs: HashSet<String>,
}

/// Per-pass state. Fresh for every call.
struct Propagator<'a> {
    values: HashMap<String, String>,
    globals: HashSet<&'a str>,
    enabled: bool,
    /// Open regions, innermost last.
    regions: Vec<Region>,
}

impl<'a> Propagator<'a> {
    fn new(globals: HashSet<&'a str>) -> Self {
        Self {
            values: HashMap::new(),
            globals,
            enabled: true,
            regions: Vec::new(),
        }
    }

    fn substitute(&self, operand: &mut String) {
        if let Some(value) = self.values.get(operand.as_str()) {
            *operand = value.clone();
        }
    }

    fn open_loop(&mut self) {
        self.regions.push(Region {
            is_loop: true,
            ..Region::default()
        });
    }

    /// A loop's own test branch joins the loop region; any other branch
    /// opens an `if` region.
    fn branch(&mut self) {
        match self.regions.last_mut() {
            Some(top) if top.is_loop && !top.branched => top.branched = true,
            _ => self.regions.push(Region {
                branched: true,
                ..Region::default()
            }),
        }
    }

    /// Entering another arm: values recorded by the previous arm do not hold.
    fn new_arm(&mut self) {
        if let Some(top) = self.regions.last() {
            for name in &top.defs {
                self.values.remove(name.as_str());
            }
        }
    }

    /// Close the innermost region; its names are unknown after the merge.
    fn close(&mut self) {
        let Some(region) = self.regions.pop() else {
            return;
        };
        for name in &region.defs {
            self.values.remove(name.as_str());
        }
        if let Some(parent) = self.regions.last_mut() {
            parent.defs.extend(region.defs);
        }
    }

    /// Handle a definition of `name` whose (already substituted) value is
    /// `value`, or `None` for a computed value.
    fn define(&mut self, name: &str, value: Option<&str>) {
        let mut value = value;
        if self.values.contains_key(name) {
            let region = self.regions.iter_mut().rev().find(|r| r.branched);
            match region {
                Some(region) if !region.allowance_used => {
                    // Unknown after the merge, whichever arm ran.
                    region.allowance_used = true;
                    self.values.remove(name);
                    value = None;
                }
                _ => {
                    if self.enabled {
                        log::debug!("propagate: `{}` redefined, disabling propagation", name);
                        self.enabled = false;
                    }
                }
            }
        }
        if let Some(top) = self.regions.last_mut() {
            top.defs.insert(name.to_string());
        }
        if let Some(value) = value {
            if self.enabled && is_number(value) && !self.globals.contains(name) {
                self.values.insert(name.to_string(), value.to_string());
            }
        }
    }

    fn forget<'n>(&mut self, names: impl IntoIterator<Item = &'n str>) {
        for name in names {
            self.values.remove(name);
        }
    }
}

pub fn propagate_constants(ops: Vec<TACInstr>) -> Vec<TACInstr> {
    // Names defined anywhere inside each loop, keyed by the region bounds.
    let loops: Vec<(usize, usize, HashSet<String>)> = loop_regions(&ops)
        .into_iter()
        .map(|(start, end)| {
            let defs = ops[start..=end]
                .iter()
                .filter_map(|i| i.defined_name().map(str::to_string))
                .collect();
            (start, end, defs)
        })
        .collect();

    let mut state = Propagator::new(global_names(&ops));
    let mut out: Vec<TACInstr> = Vec::with_capacity(ops.len());
    let mut substituted = 0usize;

    for (index, instr) in ops.iter().enumerate() {
        let mut instr = instr.clone();

        // Loop-carried names are unknown at the loop head.
        for (start, _, defs) in &loops {
            if *start == index {
                state.forget(defs.iter().map(String::as_str));
            }
        }

        if instr.is_loop_entry() {
            state.open_loop();
        } else if instr.is_loop_exit() {
            state.close();
        }

        match &mut instr.op {
            TACOp::FunctionLabel(_) => {
                state.values.clear();
                state.regions.clear();
            }
            TACOp::CondBranch { .. } => state.branch(),
            TACOp::Label {
                role: LabelRole::Plain,
                ..
            } => state.new_arm(),
            TACOp::Label {
                role: LabelRole::IfEnd,
                ..
            } => state.close(),
            TACOp::BinaryOp { dest, lhs, rhs, .. } => {
                if state.enabled {
                    let before = (lhs.clone(), rhs.clone());
                    state.substitute(lhs);
                    state.substitute(rhs);
                    if before != (lhs.clone(), rhs.clone()) {
                        substituted += 1;
                    }
                }
                let dest = dest.clone();
                state.define(&dest, None);
            }
            TACOp::LocalAssign { target, value } => {
                if state.enabled {
                    let before = value.clone();
                    state.substitute(value);
                    if *value != before {
                        substituted += 1;
                    }
                }
                let (target, value) = (target.clone(), value.clone());
                state.define(&target, Some(&value));
            }
            _ => {}
        }

        // A loop may run zero times; its definitions are unknown after it.
        for (_, end, defs) in &loops {
            if *end == index {
                state.forget(defs.iter().map(String::as_str));
            }
        }

        out.push(instr);
    }

    log::debug!("propagate: {} operands substituted", substituted);
    out
}
