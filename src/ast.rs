//! Syntax-tree input model.
//!
//! The lexer, parser and type checker live upstream; this module only
//! describes the already-validated tree they hand over. Every node
//! deserializes from JSON with an internal `"kind"` tag, e.g.
//!
//! ```json
//! { "kind": "binary", "op": "+", "left": { "kind": "int", "value": 2 },
//!   "right": { "kind": "var", "name": "x" } }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A whole compilation unit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub decls: Vec<Decl>,
}

/// Top-level declarations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decl {
    Var(VarDecl),
    Fn(FnDecl),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    #[serde(default)]
    pub init: Option<Expr>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FnDecl {
    pub name: String,
    #[serde(default)]
    pub formals: Vec<String>,
    /// `None` for a prototype without a body.
    #[serde(default)]
    pub body: Option<Stmt>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stmt {
    Block {
        stmts: Vec<Stmt>,
    },
    Expr {
        expr: Expr,
    },
    Decl(VarDecl),
    If {
        test: Expr,
        #[serde(rename = "then")]
        then_body: Box<Stmt>,
        #[serde(rename = "else", default)]
        else_body: Option<Box<Stmt>>,
    },
    While {
        test: Expr,
        body: Box<Stmt>,
    },
    For {
        #[serde(default)]
        init: Option<Expr>,
        #[serde(default)]
        test: Option<Expr>,
        #[serde(default)]
        step: Option<Expr>,
        body: Box<Stmt>,
    },
    Return {
        #[serde(default)]
        value: Option<Expr>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    Int {
        value: i32,
    },
    Bool {
        value: bool,
    },
    Var {
        name: String,
    },
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    Assign {
        target: String,
        value: Box<Expr>,
    },
    Postfix {
        operand: String,
        op: PostfixOp,
    },
    Call {
        callee: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
    Empty,
}

/// Binary operator tokens accepted by the back end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Rem,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
}

impl BinOp {
    pub fn token(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }

    /// True for operators whose result is a 0/1 truth value.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Lt
                | BinOp::Le
                | BinOp::Gt
                | BinOp::Ge
                | BinOp::Eq
                | BinOp::Ne
                | BinOp::And
                | BinOp::Or
        )
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostfixOp {
    #[serde(rename = "++")]
    Increment,
    #[serde(rename = "--")]
    Decrement,
}

impl PostfixOp {
    pub fn token(self) -> &'static str {
        match self {
            PostfixOp::Increment => "++",
            PostfixOp::Decrement => "--",
        }
    }
}

// ─── Read accessors ───────────────────────────────────────────────

impl Program {
    /// Parse a program from its JSON encoding.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Total number of statement and expression nodes in the tree.
    pub fn node_count(&self) -> usize {
        fn stmt_count(stmt: &Stmt) -> usize {
            let nested: usize = stmt.child_stmts().into_iter().map(stmt_count).sum();
            let exprs: usize = stmt.child_exprs().into_iter().map(expr_count).sum();
            1 + nested + exprs
        }
        fn expr_count(expr: &Expr) -> usize {
            1 + expr.children().into_iter().map(expr_count).sum::<usize>()
        }

        self.decls
            .iter()
            .map(|decl| match decl {
                Decl::Var(var) => 1 + var.init.as_ref().map_or(0, expr_count),
                Decl::Fn(func) => 1 + func.body.as_ref().map_or(0, stmt_count),
            })
            .sum()
    }
}

impl Stmt {
    pub fn kind(&self) -> &'static str {
        match self {
            Stmt::Block { .. } => "block",
            Stmt::Expr { .. } => "expr",
            Stmt::Decl(_) => "decl",
            Stmt::If { .. } => "if",
            Stmt::While { .. } => "while",
            Stmt::For { .. } => "for",
            Stmt::Return { .. } => "return",
        }
    }

    /// Nested statements, in source order.
    pub fn child_stmts(&self) -> Vec<&Stmt> {
        match self {
            Stmt::Block { stmts } => stmts.iter().collect(),
            Stmt::If {
                then_body,
                else_body,
                ..
            } => {
                let mut out = vec![then_body.as_ref()];
                out.extend(else_body.as_deref());
                out
            }
            Stmt::While { body, .. } | Stmt::For { body, .. } => vec![body.as_ref()],
            Stmt::Expr { .. } | Stmt::Decl(_) | Stmt::Return { .. } => Vec::new(),
        }
    }

    /// Directly owned expressions, in source order.
    pub fn child_exprs(&self) -> Vec<&Expr> {
        match self {
            Stmt::Expr { expr } => vec![expr],
            Stmt::Decl(var) => var.init.iter().collect(),
            Stmt::If { test, .. } | Stmt::While { test, .. } => vec![test],
            Stmt::For {
                init, test, step, ..
            } => init.iter().chain(test.iter()).chain(step.iter()).collect(),
            Stmt::Return { value } => value.iter().collect(),
            Stmt::Block { .. } => Vec::new(),
        }
    }
}

impl Expr {
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::Int { .. } => "int",
            Expr::Bool { .. } => "bool",
            Expr::Var { .. } => "var",
            Expr::Binary { .. } => "binary",
            Expr::Assign { .. } => "assign",
            Expr::Postfix { .. } => "postfix",
            Expr::Call { .. } => "call",
            Expr::Empty => "empty",
        }
    }

    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Expr::Assign { value, .. } => vec![value.as_ref()],
            Expr::Call { args, .. } => args.iter().collect(),
            Expr::Int { .. }
            | Expr::Bool { .. }
            | Expr::Var { .. }
            | Expr::Postfix { .. }
            | Expr::Empty => Vec::new(),
        }
    }

    /// Identifier name for variable references, assignment targets and
    /// postfix operands.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Expr::Var { name } => Some(name),
            Expr::Assign { target, .. } => Some(target),
            Expr::Postfix { operand, .. } => Some(operand),
            _ => None,
        }
    }

    /// Textual literal value; booleans lower to `1` / `0`.
    pub fn literal(&self) -> Option<String> {
        match self {
            Expr::Int { value } => Some(value.to_string()),
            Expr::Bool { value } => Some(if *value { "1" } else { "0" }.to_string()),
            _ => None,
        }
    }

    /// Operator token of binary and postfix expressions.
    pub fn operator(&self) -> Option<&'static str> {
        match self {
            Expr::Binary { op, .. } => Some(op.token()),
            Expr::Postfix { op, .. } => Some(op.token()),
            _ => None,
        }
    }
}

// ─── Construction helpers ─────────────────────────────────────────

impl Expr {
    pub fn int(value: i32) -> Self {
        Expr::Int { value }
    }

    pub fn var(name: &str) -> Self {
        Expr::Var {
            name: name.to_string(),
        }
    }

    pub fn binary(left: Expr, op: BinOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn assign(target: &str, value: Expr) -> Self {
        Expr::Assign {
            target: target.to_string(),
            value: Box::new(value),
        }
    }

    pub fn call(callee: &str, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: callee.to_string(),
            args,
        }
    }
}

impl Stmt {
    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr { expr }
    }

    pub fn block(stmts: Vec<Stmt>) -> Self {
        Stmt::Block { stmts }
    }
}
