//! Name minting, slot reservation and sub-stream helpers.

use crate::ast::Stmt;
use crate::tac::{LabelRole, TACInstr, TACOp};

use super::TACBuilder;

impl TACBuilder {
    // ── Name generation ───────────────────────────────────────────

    pub(crate) fn fresh_temp(&mut self) -> String {
        let id = self.temp_counter;
        self.temp_counter += 1;
        format!("t{}", id)
    }

    pub(crate) fn fresh_label(&mut self) -> String {
        let id = self.label_counter;
        self.label_counter += 1;
        format!("L{}", id)
    }

    // ── Emit helpers ──────────────────────────────────────────────

    /// Push an instruction that defines `name`.
    ///
    /// The first definition of a non-global name in the current function
    /// owns its frame slot.
    pub(crate) fn emit_definition(&mut self, name: &str, op: TACOp) {
        let first = !self.globals.contains(name) && self.declared.insert(name.to_string());
        let instr = if first {
            TACInstr::reserving(op)
        } else {
            TACInstr::new(op)
        };
        self.ops.push(instr);
    }

    pub(crate) fn emit(&mut self, op: TACOp) {
        self.ops.push(TACInstr::new(op));
    }

    pub(crate) fn emit_label(&mut self, name: &str, role: LabelRole) {
        self.emit(TACOp::Label {
            name: name.to_string(),
            role,
        });
    }

    pub(crate) fn emit_jump(&mut self, target: &str, back_edge: bool) {
        self.emit(TACOp::Jump {
            target: target.to_string(),
            back_edge,
        });
    }

    /// Build a statement into a separate stream by temporarily swapping out
    /// `self.ops`.
    pub(crate) fn build_stmt_as_ir(&mut self, stmt: &Stmt) -> Vec<TACInstr> {
        let saved_ops = std::mem::take(&mut self.ops);
        self.build_stmt(stmt);
        let nested = std::mem::take(&mut self.ops);
        self.ops = saved_ops;
        nested
    }
}
