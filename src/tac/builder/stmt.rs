//! Statement translation: blocks, declarations, branches and loops.

use crate::ast::*;
use crate::tac::{LabelRole, Polarity, TACOp};

use super::TACBuilder;

impl TACBuilder {
    pub(crate) fn build_stmt(&mut self, stmt: &Stmt) {
        log::trace!("build {} statement", stmt.kind());
        match stmt {
            Stmt::Block { stmts } => {
                for stmt in stmts {
                    self.build_stmt(stmt);
                }
            }

            Stmt::Expr { expr } => {
                self.build_expr(expr);
            }

            Stmt::Decl(var) => {
                // An uninitialized local gets its slot from its first assignment.
                if let Some(init) = &var.init {
                    let value = self.build_expr(init);
                    self.emit_definition(
                        &var.name,
                        TACOp::LocalAssign {
                            target: var.name.clone(),
                            value,
                        },
                    );
                }
            }

            Stmt::If {
                test,
                then_body,
                else_body,
            } => self.build_if(test, then_body, else_body.as_deref()),

            Stmt::While { test, body } => self.build_loop(Some(test), None, body),

            Stmt::For {
                init,
                test,
                step,
                body,
            } => {
                if let Some(init) = init {
                    self.build_expr(init);
                }
                self.build_loop(test.as_ref(), step.as_ref(), body);
            }

            Stmt::Return { value } => {
                let value = value.as_ref().map(|v| self.build_expr(v));
                self.emit(TACOp::Return(value));
            }
        }
    }

    /// `cond → if cond goto body → goto else|end → body: … goto end →
    /// [else: …] → end:`
    fn build_if(&mut self, test: &Expr, then_body: &Stmt, else_body: Option<&Stmt>) {
        let body_label = self.fresh_label();
        let else_label = else_body.map(|_| self.fresh_label());
        let end_label = self.fresh_label();

        let cond = self.build_expr(test);
        self.emit(TACOp::CondBranch {
            cond,
            target: body_label.clone(),
            polarity: Polarity::IfTrue,
        });
        let skip_target = else_label.as_deref().unwrap_or(&end_label).to_string();
        self.emit_jump(&skip_target, false);

        self.emit_label(&body_label, LabelRole::Plain);
        self.build_stmt(then_body);
        self.emit_jump(&end_label, false);

        if let (Some(label), Some(body)) = (&else_label, else_body) {
            self.emit_label(label, LabelRole::Plain);
            self.build_stmt(body);
        }

        self.emit_label(&end_label, LabelRole::IfEnd);
    }

    /// Shared `while` / `for` shape:
    ///
    /// ```text
    /// test:  cond; if cond goto body; goto end
    /// body:  …; step; goto test (back edge)
    /// end:
    /// ```
    ///
    /// A missing test falls straight into the body.
    fn build_loop(&mut self, test: Option<&Expr>, step: Option<&Expr>, body: &Stmt) {
        let test_label = self.fresh_label();
        let body_label = self.fresh_label();
        let end_label = self.fresh_label();

        self.emit_label(&test_label, LabelRole::LoopTest);
        if let Some(test) = test {
            let cond = self.build_expr(test);
            self.emit(TACOp::CondBranch {
                cond,
                target: body_label.clone(),
                polarity: Polarity::IfTrue,
            });
            self.emit_jump(&end_label, false);
        }

        self.emit_label(&body_label, LabelRole::Plain);
        self.build_stmt(body);
        if let Some(step) = step {
            self.build_expr(step);
        }
        self.emit_jump(&test_label, true);
        self.emit_label(&end_label, LabelRole::LoopEnd);
    }
}
