//! Three-address code (TAC).
//!
//! The TAC is a single flat list of instructions. Functions are delimited by
//! `FunctionLabel` / `EndFunction` pairs, control flow by labels and jumps.
//! The builder produces it from the syntax tree, the optimizer rewrites it
//! stream-to-stream, and a `Lowering` turns it into target assembly text.

pub mod builder;
pub mod interp;
pub mod lower;
pub mod optimize;

use std::fmt;

pub use crate::ast::BinOp;

/// Bytes per stack slot, per staged argument and per data word.
pub const WORD_SIZE: u32 = 4;

/// Built-in that reads one integer from standard input.
pub const READ_INT: &str = "readIntFromSTDIN";

/// Built-in that prints one integer.
pub const PRINT_INT: &str = "printInt";

// ─── Instruction payloads ─────────────────────────────────────────

/// Which comparison outcome makes a `CondBranch` jump.
///
/// Encoded as the value the comparison register is tested against:
/// `IfTrue` = 1, `IfFalse` = 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Polarity {
    #[default]
    IfTrue,
    IfFalse,
}

impl Polarity {
    pub fn bit(self) -> u8 {
        match self {
            Polarity::IfTrue => 1,
            Polarity::IfFalse => 0,
        }
    }
}

/// What a label closes or opens, for passes that care about regions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LabelRole {
    #[default]
    Plain,
    /// Loop test label; target of the loop's back edge.
    LoopTest,
    /// Label right after a loop's back edge.
    LoopEnd,
    /// Terminator of an `if` / `if-else` statement.
    IfEnd,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Callee {
    /// `readIntFromSTDIN`: lowered to a system call, not a jump.
    ReadInt,
    Function(String),
}

impl Callee {
    pub fn name(&self) -> &str {
        match self {
            Callee::ReadInt => READ_INT,
            Callee::Function(name) => name,
        }
    }
}

/// One TAC line.
///
/// Operands are textual: either a variable / temporary name or a numeric
/// literal (see [`is_number`]).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TACOp {
    GlobalAssign {
        name: String,
        value: String,
    },
    LocalAssign {
        target: String,
        value: String,
    },
    BinaryOp {
        dest: String,
        lhs: String,
        op: BinOp,
        rhs: String,
    },
    FunctionLabel(String),
    /// Frame size in bytes.
    BeginFrame(u32),
    EndFunction,
    LoadParam(String),
    PushParam(String),
    /// Bytes of staged arguments to release.
    PopParam(u32),
    Call {
        dest: String,
        callee: Callee,
        argc: usize,
    },
    Return(Option<String>),
    CondBranch {
        cond: String,
        target: String,
        polarity: Polarity,
    },
    Jump {
        target: String,
        back_edge: bool,
    },
    Label {
        name: String,
        role: LabelRole,
    },
    PrintOut(String),
}

/// Bookkeeping carried next to every instruction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InstrFlags {
    /// The instruction's destination owns a frame slot in its function.
    pub reserves_slot: bool,
    /// Produced by constant folding.
    pub folded: bool,
    /// Marked by dead-code elimination.
    pub dead: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TACInstr {
    pub op: TACOp,
    pub flags: InstrFlags,
}

impl From<TACOp> for TACInstr {
    fn from(op: TACOp) -> Self {
        Self {
            op,
            flags: InstrFlags::default(),
        }
    }
}

impl TACInstr {
    pub fn new(op: TACOp) -> Self {
        op.into()
    }

    /// An instruction whose destination owns a frame slot.
    pub fn reserving(op: TACOp) -> Self {
        let mut instr = Self::new(op);
        instr.flags.reserves_slot = true;
        instr
    }

    /// Name written by this instruction, if it is a definition the
    /// optimizer tracks.
    pub fn defined_name(&self) -> Option<&str> {
        match &self.op {
            TACOp::LocalAssign { target, .. } => Some(target),
            TACOp::BinaryOp { dest, .. } => Some(dest),
            _ => None,
        }
    }

    /// Every operand this instruction reads, literals included.
    pub fn operands(&self) -> Vec<&str> {
        match &self.op {
            TACOp::BinaryOp { lhs, rhs, .. } => vec![lhs, rhs],
            TACOp::LocalAssign { value, .. } | TACOp::GlobalAssign { value, .. } => vec![value],
            TACOp::CondBranch { cond, .. } => vec![cond],
            TACOp::PrintOut(value) | TACOp::PushParam(value) => vec![value],
            TACOp::Return(value) => value.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_loop_entry(&self) -> bool {
        matches!(
            self.op,
            TACOp::Label {
                role: LabelRole::LoopTest,
                ..
            }
        )
    }

    pub fn is_loop_exit(&self) -> bool {
        matches!(
            self.op,
            TACOp::Label {
                role: LabelRole::LoopEnd,
                ..
            }
        )
    }

    /// Labels, jumps and branches: anything that splits straight-line code.
    pub fn is_control_flow(&self) -> bool {
        matches!(
            self.op,
            TACOp::Label { .. }
                | TACOp::Jump { .. }
                | TACOp::CondBranch { .. }
                | TACOp::FunctionLabel(_)
                | TACOp::EndFunction
                | TACOp::Return(_)
        )
    }
}

// ─── Operand predicates ───────────────────────────────────────────

/// True iff `value` is non-empty and made only of digits, `.` and `-`.
pub fn is_number(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == '-')
}

/// True for builder-minted temporaries: `t` followed by digits.
pub fn is_temp(name: &str) -> bool {
    name.strip_prefix('t')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

// ─── Display ──────────────────────────────────────────────────────

impl fmt::Display for TACOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TACOp::GlobalAssign { name, value } => write!(f, "{} := {}", name, value),
            TACOp::LocalAssign { target, value } => write!(f, "{} := {}", target, value),
            TACOp::BinaryOp { dest, lhs, op, rhs } => {
                write!(f, "{} := {} {} {}", dest, lhs, op, rhs)
            }
            TACOp::FunctionLabel(name) => write!(f, "{}:", name),
            TACOp::BeginFrame(size) => write!(f, "BeginFunc {}", size),
            TACOp::EndFunction => write!(f, "EndFunc"),
            TACOp::LoadParam(name) => write!(f, "LoadParam {}", name),
            TACOp::PushParam(name) => write!(f, "PushParam {}", name),
            TACOp::PopParam(bytes) => write!(f, "PopParam {}", bytes),
            TACOp::Call { dest, callee, argc } => {
                write!(f, "{} call {} {}", dest, callee.name(), argc)
            }
            TACOp::Return(Some(value)) => write!(f, "Return {}", value),
            TACOp::Return(None) => write!(f, "Return"),
            TACOp::CondBranch { cond, target, .. } => write!(f, "if {} goto {}", cond, target),
            TACOp::Jump { target, .. } => write!(f, "goto {}", target),
            TACOp::Label { name, .. } => write!(f, "{}:", name),
            TACOp::PrintOut(value) => write!(f, "Print {}", value),
        }
    }
}

impl fmt::Display for TACInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.op.fmt(f)
    }
}

/// Render a stream as a TAC listing: labels flush left, the rest indented.
pub fn listing(instrs: &[TACInstr]) -> String {
    let mut out = String::new();
    for instr in instrs {
        match instr.op {
            TACOp::Label { .. } | TACOp::FunctionLabel(_) => {}
            _ => out.push_str("    "),
        }
        out.push_str(&instr.to_string());
        out.push('\n');
    }
    out
}

// ─── Tests ────────────────────────────────────────────────────────
