//! TACBuilder: lowers a type-checked AST into a flat `Vec<TACInstr>`.
//!
//! Every `build_*` method appends instructions to the builder's stream and
//! returns the name (variable, temporary or literal text) that holds the
//! node's value. Function bodies are built into a detached sub-stream first
//! so the frame size is known before `BeginFrame` is placed.

mod expr;
mod helpers;
mod stmt;

use std::collections::HashSet;

use crate::ast::*;
use crate::tac::{Polarity, TACInstr, TACOp, WORD_SIZE};

// ─── TACBuilder ───────────────────────────────────────────────────

/// Translation context for one compilation unit.
///
/// Owns the instruction stream and the monotonic temporary and label
/// counters, so names never repeat within a unit. Build a fresh builder per
/// unit.
pub struct TACBuilder {
    /// Accumulated instructions.
    pub(crate) ops: Vec<TACInstr>,
    /// Next temporary id (`t1` is the first).
    pub(crate) temp_counter: u32,
    /// Next label id (`L0` is the first).
    pub(crate) label_counter: u32,
    /// Names that already own an identity in the current function.
    pub(crate) declared: HashSet<String>,
    /// Module-scope variables; never reserve frame slots.
    pub(crate) globals: HashSet<String>,
}

impl Default for TACBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TACBuilder {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            temp_counter: 1,
            label_counter: 0,
            declared: HashSet::new(),
            globals: HashSet::new(),
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // ── Top-level entry: build_program ────────────────────────────
    // ═══════════════════════════════════════════════════════════════

    /// Translate a whole program and apply the branch-polarity fix-up.
    pub fn build_program(mut self, program: &Program) -> Vec<TACInstr> {
        for decl in &program.decls {
            match decl {
                Decl::Var(var) => self.build_global(var),
                Decl::Fn(func) => self.build_fn(func),
            }
        }

        fix_branch_polarity(&mut self.ops);

        log::debug!(
            "built {} TAC instructions ({} temporaries, {} labels)",
            self.ops.len(),
            self.temp_counter - 1,
            self.label_counter
        );
        self.ops
    }

    /// Module-scope variables only take literal initializers; anything else
    /// would need code outside every function.
    fn build_global(&mut self, var: &VarDecl) {
        let value = match var.init.as_ref().map(|init| (init, init.literal())) {
            None => "0".to_string(),
            Some((_, Some(text))) => text,
            Some((init, None)) => {
                log::warn!(
                    "global `{}` has a non-literal {} initializer; using 0",
                    var.name,
                    init.kind()
                );
                "0".to_string()
            }
        };
        self.globals.insert(var.name.clone());
        self.ops.push(TACInstr::new(TACOp::GlobalAssign {
            name: var.name.clone(),
            value,
        }));
    }

    // ═══════════════════════════════════════════════════════════════
    // ── Function emission ─────────────────────────────────────────
    // ═══════════════════════════════════════════════════════════════

    /// Emit `FunctionLabel`, the `LoadParam`s, `BeginFrame`, the body and
    /// `EndFunction`.
    ///
    /// The frame holds one word per instruction in the body that reserved
    /// a slot, i.e. one per distinct name defined in the function.
    pub(crate) fn build_fn(&mut self, func: &FnDecl) {
        let Some(body) = &func.body else {
            return;
        };

        self.declared.clear();
        self.ops.push(TACInstr::new(TACOp::FunctionLabel(func.name.clone())));
        for formal in &func.formals {
            self.declared.insert(formal.clone());
            self.ops.push(TACInstr::new(TACOp::LoadParam(formal.clone())));
        }

        let body_ops = self.build_stmt_as_ir(body);
        let slots = body_ops.iter().filter(|i| i.flags.reserves_slot).count() as u32;
        log::trace!("function {} reserves {} frame slots", func.name, slots);

        self.ops
            .push(TACInstr::new(TACOp::BeginFrame(slots * WORD_SIZE)));
        self.ops.extend(body_ops);
        self.ops.push(TACInstr::new(TACOp::EndFunction));
        self.declared.clear();
    }
}

/// Translate `program` with a fresh builder.
pub fn build_program(program: &Program) -> Vec<TACInstr> {
    TACBuilder::new().build_program(program)
}

// ─── Branch polarity fix-up ───────────────────────────────────────

/// Every `CondBranch` right after a `<=` comparison branches on a false
/// comparison register.
///
/// The `<=` lowering computes `rhs < lhs` (the negation), so the branch
/// has to be taken when that register is 0.
pub fn fix_branch_polarity(instrs: &mut [TACInstr]) {
    for i in 1..instrs.len() {
        let after_le = matches!(instrs[i - 1].op, TACOp::BinaryOp { op: BinOp::Le, .. });
        if !after_le {
            continue;
        }
        if let TACOp::CondBranch { polarity, .. } = &mut instrs[i].op {
            *polarity = Polarity::IfFalse;
        }
    }
}
