//! Expression translation and call dispatch.

use crate::ast::*;
use crate::tac::{Callee, TACOp, PRINT_INT, READ_INT, WORD_SIZE};

use super::TACBuilder;

impl TACBuilder {
    /// Translate an expression; returns the name holding its value.
    ///
    /// Literals and variable references emit nothing and return their text.
    pub(crate) fn build_expr(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::Int { .. } | Expr::Bool { .. } => expr.literal().unwrap_or_default(),

            Expr::Var { name } => name.clone(),

            Expr::Binary { left, op, right } => {
                let lhs = self.build_expr(left);
                let rhs = self.build_expr(right);
                let dest = self.fresh_temp();
                self.emit_definition(
                    &dest,
                    TACOp::BinaryOp {
                        dest: dest.clone(),
                        lhs,
                        op: *op,
                        rhs,
                    },
                );
                dest
            }

            Expr::Assign { target, value } => {
                let value = self.build_expr(value);
                self.emit_definition(
                    target,
                    TACOp::LocalAssign {
                        target: target.clone(),
                        value,
                    },
                );
                target.clone()
            }

            Expr::Postfix { operand, op } => {
                let bin_op = match op {
                    PostfixOp::Increment => BinOp::Add,
                    PostfixOp::Decrement => BinOp::Sub,
                };
                let temp = self.fresh_temp();
                self.emit_definition(
                    &temp,
                    TACOp::BinaryOp {
                        dest: temp.clone(),
                        lhs: operand.clone(),
                        op: bin_op,
                        rhs: "1".to_string(),
                    },
                );
                self.emit_definition(
                    operand,
                    TACOp::LocalAssign {
                        target: operand.clone(),
                        value: temp,
                    },
                );
                operand.clone()
            }

            Expr::Call { callee, args } => self.build_call(callee, args),

            Expr::Empty => String::new(),
        }
    }

    /// Emit a call: built-in I/O or a user function.
    ///
    /// User calls evaluate every argument first, then stage them left to
    /// right with `PushParam`, `Call` into a fresh temporary and release
    /// `4 × argc` bytes with `PopParam`. Nested calls in an argument finish
    /// before the outer call stages anything.
    pub(crate) fn build_call(&mut self, callee: &str, args: &[Expr]) -> String {
        match callee {
            PRINT_INT => {
                let mut last = String::new();
                for arg in args {
                    last = self.build_expr(arg);
                    self.emit(TACOp::PrintOut(last.clone()));
                }
                last
            }

            READ_INT => {
                let dest = self.fresh_temp();
                self.emit_definition(
                    &dest,
                    TACOp::Call {
                        dest: dest.clone(),
                        callee: Callee::ReadInt,
                        argc: 0,
                    },
                );
                dest
            }

            _ => {
                let values: Vec<String> = args.iter().map(|arg| self.build_expr(arg)).collect();
                for value in values {
                    self.emit(TACOp::PushParam(value));
                }
                let dest = self.fresh_temp();
                self.emit_definition(
                    &dest,
                    TACOp::Call {
                        dest: dest.clone(),
                        callee: Callee::Function(callee.to_string()),
                        argc: args.len(),
                    },
                );
                self.emit(TACOp::PopParam(WORD_SIZE * args.len() as u32));
                dest
            }
        }
    }
}
