//! MIPS lowering: produces SPIM-style assembly from TAC.
//!
//! Values live in stack slots addressed from `$sp`. Every name written by a
//! `LocalAssign` (or a fused `BinaryOp`) gets a slot at `(index + 1) × 4`;
//! formal parameters sit below the caller's `$sp` at `-(position + 1) × 4`,
//! where the caller's `PushParam`s put them. Globals are `.data` words.
//!
//! Temporaries have no slot: the emitter keeps the most recent result in
//! `$t0` (arithmetic) or `$s0` (comparisons) and reads it back from there.

use std::collections::HashMap;

use super::Lowering;
use crate::config::ReturnProtocol;
use crate::tac::{is_number, is_temp, BinOp, Callee, TACInstr, TACOp, WORD_SIZE};

const ENTRY: &str = "main";
const TRAMPOLINE: &str = "f1";

/// Lowered assembly plus the operands that resolved to no storage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Lowered {
    pub lines: Vec<String>,
    /// Non-temporary names that fell back to the scratch register.
    pub unresolved: Vec<String>,
}

/// MIPS lowering for one return protocol.
#[derive(Clone, Copy, Debug, Default)]
pub struct MipsLowering {
    protocol: ReturnProtocol,
}

impl MipsLowering {
    pub fn new(protocol: ReturnProtocol) -> Self {
        Self { protocol }
    }

    /// Lower `ops`, also reporting unresolvable operands.
    pub fn lower_with_report(&self, ops: &[TACInstr]) -> Lowered {
        let layout = Layout::scan(ops);
        let mut lowerer = MipsLowerer::new(self.protocol, &layout);
        let mut out = Vec::new();
        lowerer.header(&mut out);
        for op in ops {
            lowerer.lower_op(&op.op, &mut out);
        }
        Lowered {
            lines: out,
            unresolved: lowerer.unresolved,
        }
    }
}

impl Lowering for MipsLowering {
    fn lower(&self, ops: &[TACInstr]) -> Vec<String> {
        self.lower_with_report(ops).lines
    }
}

// ─── Storage layout ───────────────────────────────────────────────

/// Offset tables derived from the whole stream before emission.
#[derive(Debug, Default)]
struct Layout {
    /// Local name → `$sp` offset, in first-appearance order.
    locals: HashMap<String, i32>,
    local_count: usize,
    /// Function → formal parameters in declaration order.
    params: HashMap<String, Vec<String>>,
    /// Module-scope words with their initial values.
    globals: Vec<(String, String)>,
}

impl Layout {
    fn scan(ops: &[TACInstr]) -> Self {
        let mut layout = Layout::default();
        let mut current: Option<&str> = None;
        let mut candidates: Vec<&str> = Vec::new();

        for instr in ops {
            match &instr.op {
                TACOp::GlobalAssign { name, value } => {
                    layout.globals.push((name.clone(), value.clone()));
                }
                TACOp::FunctionLabel(name) => {
                    layout.params.entry(name.clone()).or_default();
                    current = Some(name);
                }
                TACOp::LoadParam(name) => {
                    if let Some(func) = current {
                        layout
                            .params
                            .entry(func.to_string())
                            .or_default()
                            .push(name.clone());
                    }
                }
                TACOp::LocalAssign { target, .. } => candidates.push(target),
                TACOp::BinaryOp { dest, .. } if !is_temp(dest) => candidates.push(dest),
                _ => {}
            }
        }

        for name in candidates {
            let is_global = layout.globals.iter().any(|(g, _)| g == name);
            if is_global || layout.locals.contains_key(name) {
                continue;
            }
            layout.local_count += 1;
            let offset = (layout.local_count as u32 * WORD_SIZE) as i32;
            layout.locals.insert(name.to_string(), offset);
        }
        layout
    }

    fn is_global(&self, name: &str) -> bool {
        self.globals.iter().any(|(g, _)| g == name)
    }

    /// Bytes a callee moves `$sp` by under the link-register protocol:
    /// every local slot, the deepest incoming-parameter area, and the word
    /// at `0($sp)` holding `$ra`.
    fn frame_bytes(&self) -> i32 {
        let max_params = self.params.values().map(Vec::len).max().unwrap_or(0);
        ((self.local_count + max_params + 1) as u32 * WORD_SIZE) as i32
    }
}

/// Where a name's value lives.
enum Slot<'a> {
    Stack(i32),
    Global(&'a str),
}

// ─── Lowerer ──────────────────────────────────────────────────────

struct MipsLowerer<'a> {
    protocol: ReturnProtocol,
    layout: &'a Layout,
    frame_bytes: i32,
    current_fn: String,
    /// Arguments staged for the next call.
    pushed: u32,
    /// Register holding the latest computed value.
    last: &'static str,
    unresolved: Vec<String>,
}

impl<'a> MipsLowerer<'a> {
    fn new(protocol: ReturnProtocol, layout: &'a Layout) -> Self {
        Self {
            protocol,
            layout,
            frame_bytes: layout.frame_bytes(),
            current_fn: String::new(),
            pushed: 0,
            last: "$t0",
            unresolved: Vec::new(),
        }
    }

    fn links_via_ra(&self) -> bool {
        self.protocol == ReturnProtocol::LinkRegister && self.current_fn != ENTRY
    }

    // ── Sections ──

    fn header(&self, out: &mut Vec<String>) {
        out.push(".data".to_string());
        for (name, value) in &self.layout.globals {
            let value = if is_number(value) {
                value.as_str()
            } else {
                log::warn!("global `{}` has non-literal value `{}`; emitting 0", name, value);
                "0"
            };
            out.push(format!("{}: .word {}", name, value));
        }
        out.push(".text".to_string());
    }

    // ── Operand access ──

    fn resolve(&self, name: &'a str) -> Option<Slot<'a>> {
        let position = self
            .layout
            .params
            .get(&self.current_fn)
            .and_then(|formals| formals.iter().position(|p| p == name));
        if let Some(position) = position {
            let below_caller = -(((position as u32 + 1) * WORD_SIZE) as i32);
            let base = if self.links_via_ra() { self.frame_bytes } else { 0 };
            return Some(Slot::Stack(base + below_caller));
        }
        if let Some(offset) = self.layout.locals.get(name) {
            return Some(Slot::Stack(*offset));
        }
        if self.layout.is_global(name) {
            return Some(Slot::Global(name));
        }
        None
    }

    fn note_unresolved(&mut self, name: &str) {
        if name.is_empty() || is_temp(name) || self.unresolved.iter().any(|n| n == name) {
            return;
        }
        log::warn!(
            "`{}` has no stack slot or data word; reusing {}",
            name,
            self.last
        );
        self.unresolved.push(name.to_string());
    }

    /// Load `operand` into `reg`.
    fn load(&mut self, operand: &'a str, reg: &str, out: &mut Vec<String>) {
        if is_number(operand) {
            out.push(format!("    li {}, {}", reg, operand));
            return;
        }
        match self.resolve(operand) {
            Some(Slot::Stack(offset)) => out.push(format!("    lw {}, {}($sp)", reg, offset)),
            Some(Slot::Global(label)) => out.push(format!("    lw {}, {}", reg, label)),
            None => {
                self.note_unresolved(operand);
                if reg != self.last {
                    out.push(format!("    move {}, {}", reg, self.last));
                }
            }
        }
    }

    /// Store `reg` into `target`'s storage; temporaries stay in registers.
    fn store(&mut self, target: &'a str, reg: &str, out: &mut Vec<String>) {
        match self.resolve(target) {
            Some(Slot::Stack(offset)) => out.push(format!("    sw {}, {}($sp)", reg, offset)),
            Some(Slot::Global(label)) => out.push(format!("    sw {}, {}", reg, label)),
            None => self.note_unresolved(target),
        }
    }

    fn is_addressable(&self, operand: &'a str) -> bool {
        is_number(operand) || self.resolve(operand).is_some()
    }

    // ── Calling convention ──

    fn exit(out: &mut Vec<String>) {
        out.push("    li $v0, 10".to_string());
        out.push("    syscall".to_string());
    }

    /// Callee frames keep the return address in their spare word at `0($sp)`.
    fn prologue(&self, out: &mut Vec<String>) {
        out.push(format!("    addiu $sp, $sp, -{}", self.frame_bytes));
        out.push("    sw $ra, 0($sp)".to_string());
    }

    fn epilogue(&self, out: &mut Vec<String>) {
        out.push("    lw $ra, 0($sp)".to_string());
        out.push(format!("    addiu $sp, $sp, {}", self.frame_bytes));
        out.push("    jr $ra".to_string());
    }

    // ── Instruction selection ──

    fn lower_op(&mut self, op: &'a TACOp, out: &mut Vec<String>) {
        match op {
            // ── Data movement ──
            TACOp::GlobalAssign { .. } => {}
            TACOp::LocalAssign { target, value } => {
                let src = if self.is_addressable(value) {
                    self.load(value, "$t0", out);
                    self.last = "$t0";
                    "$t0"
                } else {
                    self.note_unresolved(value);
                    self.last
                };
                self.store(target, src, out);
            }

            // ── Arithmetic ──
            TACOp::BinaryOp { dest, lhs, op, rhs } => {
                self.load(lhs, "$t1", out);
                self.load(rhs, "$t2", out);
                let result = match op {
                    BinOp::Add => Self::arith(out, "add"),
                    BinOp::Sub => Self::arith(out, "sub"),
                    BinOp::Mul => Self::arith(out, "mul"),
                    BinOp::Div => Self::arith(out, "div"),
                    BinOp::Rem => Self::arith(out, "rem"),
                    BinOp::Lt => Self::compare(out, "slt $s0, $t1, $t2"),
                    // `<=` yields `rhs < lhs`; the following branch tests for 0.
                    BinOp::Le | BinOp::Gt => Self::compare(out, "slt $s0, $t2, $t1"),
                    BinOp::Ge => {
                        out.push("    slt $s0, $t1, $t2".to_string());
                        Self::compare(out, "xori $s0, $s0, 1")
                    }
                    BinOp::Eq => Self::compare(out, "seq $s0, $t1, $t2"),
                    BinOp::Ne => Self::compare(out, "sne $s0, $t1, $t2"),
                    BinOp::And => Self::compare(out, "and $s0, $t1, $t2"),
                    BinOp::Or => Self::compare(out, "or $s0, $t1, $t2"),
                };
                self.last = result;
                if !is_temp(dest) {
                    self.store(dest, result, out);
                }
            }

            // ── Functions ──
            TACOp::FunctionLabel(name) => {
                self.current_fn = name.clone();
                self.pushed = 0;
                out.push(format!("{}:", name));
                if self.links_via_ra() {
                    self.prologue(out);
                }
            }
            TACOp::BeginFrame(_) | TACOp::LoadParam(_) => {}
            TACOp::EndFunction => {
                if self.links_via_ra() {
                    self.epilogue(out);
                } else {
                    Self::exit(out);
                }
            }
            TACOp::Return(value) => match self.protocol {
                ReturnProtocol::Trampoline => {
                    if let Some(value) = value {
                        self.load(value, "$t0", out);
                    }
                    out.push("    move $v0, $t0".to_string());
                    out.push(format!("    jal {}", TRAMPOLINE));
                }
                ReturnProtocol::LinkRegister => {
                    if let Some(value) = value {
                        self.load(value, "$t0", out);
                        out.push("    move $v0, $t0".to_string());
                    }
                    if self.links_via_ra() {
                        self.epilogue(out);
                    } else {
                        Self::exit(out);
                    }
                }
            },

            // ── Calls ──
            TACOp::PushParam(value) => {
                self.pushed += 1;
                self.load(value, "$t0", out);
                self.last = "$t0";
                let offset = -((self.pushed * WORD_SIZE) as i32);
                out.push(format!("    sw $t0, {}($sp)", offset));
            }
            TACOp::Call { callee, .. } => {
                self.pushed = 0;
                match callee {
                    Callee::ReadInt => {
                        out.push("    li $v0, 5".to_string());
                        out.push("    syscall".to_string());
                        out.push("    move $t0, $v0".to_string());
                        self.last = "$t0";
                    }
                    Callee::Function(name) => {
                        out.push(format!("    jal {}", name));
                        if self.protocol == ReturnProtocol::Trampoline {
                            out.push(format!("{}:", TRAMPOLINE));
                        }
                    }
                }
            }
            TACOp::PopParam(_) => {
                out.push("    move $t0, $v0".to_string());
                self.last = "$t0";
            }

            // ── Control flow ──
            TACOp::CondBranch {
                cond,
                target,
                polarity,
            } => {
                if self.is_addressable(cond) {
                    self.load(cond, "$s0", out);
                } else if self.last != "$s0" {
                    self.note_unresolved(cond);
                    out.push(format!("    move $s0, {}", self.last));
                }
                out.push(format!("    beq $s0, {}, {}", polarity.bit(), target));
            }
            TACOp::Jump { target, .. } => out.push(format!("    j {}", target)),
            TACOp::Label { name, .. } => out.push(format!("{}:", name)),

            // ── I/O ──
            TACOp::PrintOut(value) => {
                self.load(value, "$t0", out);
                self.last = "$t0";
                out.push("    li $v0, 1".to_string());
                out.push("    move $a0, $t0".to_string());
                out.push("    syscall".to_string());
            }
        }
    }

    fn arith(out: &mut Vec<String>, mnemonic: &str) -> &'static str {
        out.push(format!("    {} $t0, $t1, $t2", mnemonic));
        "$t0"
    }

    fn compare(out: &mut Vec<String>, instr: &str) -> &'static str {
        out.push(format!("    {}", instr));
        "$s0"
    }
}
