//! Reference interpreter for TAC streams.
//!
//! Runs a stream from `main` with per-call frames and records everything
//! `printInt` prints. Branch polarity is a property of the machine lowering
//! and is ignored here: a `CondBranch` jumps when its condition is nonzero.

use std::collections::{HashMap, VecDeque};

use super::{is_number, BinOp, Callee, TACInstr, TACOp};
use crate::error::InterpError;

/// Default bound on executed instructions.
pub const DEFAULT_STEP_LIMIT: usize = 1_000_000;

struct Frame {
    vars: HashMap<String, i32>,
    args: Vec<i32>,
    next_arg: usize,
    /// Caller's resume point and the temporary receiving the result.
    return_to: Option<(usize, String)>,
}

impl Frame {
    fn new(args: Vec<i32>, return_to: Option<(usize, String)>) -> Self {
        Self {
            vars: HashMap::new(),
            args,
            next_arg: 0,
            return_to,
        }
    }
}

/// Executes one stream. Labels and function entries are indexed up front.
pub struct Interpreter<'a> {
    ops: &'a [TACInstr],
    labels: HashMap<&'a str, usize>,
    functions: HashMap<&'a str, usize>,
    globals: HashMap<String, i32>,
    input: VecDeque<i32>,
    output: Vec<i32>,
    step_limit: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(ops: &'a [TACInstr]) -> Self {
        let mut labels = HashMap::new();
        let mut functions = HashMap::new();
        for (index, instr) in ops.iter().enumerate() {
            match &instr.op {
                TACOp::Label { name, .. } => {
                    labels.insert(name.as_str(), index);
                }
                TACOp::FunctionLabel(name) => {
                    functions.insert(name.as_str(), index);
                }
                _ => {}
            }
        }
        Self {
            ops,
            labels,
            functions,
            globals: HashMap::new(),
            input: VecDeque::new(),
            output: Vec::new(),
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }

    /// Values handed out by `readIntFromSTDIN`, in order.
    pub fn with_input(mut self, input: &[i32]) -> Self {
        self.input = input.iter().copied().collect();
        self
    }

    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = limit;
        self
    }

    /// Run `main` to completion and return everything it printed.
    pub fn run(mut self) -> Result<Vec<i32>, InterpError> {
        let ops = self.ops;
        for instr in ops {
            if let TACOp::GlobalAssign { name, value } = &instr.op {
                let value = if value.is_empty() { 0 } else { literal(value)? };
                self.globals.insert(name.clone(), value);
            }
        }

        let mut pc = *self.functions.get("main").ok_or(InterpError::NoEntry)?;
        let mut frames = vec![Frame::new(Vec::new(), None)];
        let mut pending: Vec<i32> = Vec::new();
        let mut steps = 0usize;

        while pc < ops.len() {
            steps += 1;
            if steps > self.step_limit {
                return Err(InterpError::StepLimit(self.step_limit));
            }
            let Some(frame) = frames.last_mut() else {
                break;
            };

            let mut next = pc + 1;
            match &ops[pc].op {
                TACOp::GlobalAssign { .. }
                | TACOp::FunctionLabel(_)
                | TACOp::BeginFrame(_)
                | TACOp::Label { .. }
                | TACOp::PopParam(_) => {}

                TACOp::LocalAssign { target, value } => {
                    let value = self.read(frame, value)?;
                    self.write(frame, target, value);
                }
                TACOp::BinaryOp { dest, lhs, op, rhs } => {
                    let a = self.read(frame, lhs)?;
                    let b = self.read(frame, rhs)?;
                    let value = evaluate(a, *op, b)?;
                    self.write(frame, dest, value);
                }
                TACOp::LoadParam(name) => {
                    let value = frame.args.get(frame.next_arg).copied().unwrap_or(0);
                    frame.next_arg += 1;
                    frame.vars.insert(name.clone(), value);
                }
                TACOp::PushParam(value) => {
                    let value = self.read(frame, value)?;
                    pending.push(value);
                }
                TACOp::Call { dest, callee, .. } => match callee {
                    Callee::ReadInt => {
                        let value = self.input.pop_front().ok_or(InterpError::InputExhausted)?;
                        frame.vars.insert(dest.clone(), value);
                    }
                    Callee::Function(name) => {
                        let entry = *self
                            .functions
                            .get(name.as_str())
                            .ok_or_else(|| InterpError::UnknownFunction(name.clone()))?;
                        let args = std::mem::take(&mut pending);
                        frames.push(Frame::new(args, Some((pc + 1, dest.clone()))));
                        next = entry;
                    }
                },
                TACOp::Return(value) => {
                    let value = match value {
                        Some(value) => self.read(frame, value)?,
                        None => 0,
                    };
                    match Self::unwind(&mut frames, value) {
                        Some(resume) => next = resume,
                        None => break,
                    }
                }
                TACOp::EndFunction => match Self::unwind(&mut frames, 0) {
                    Some(resume) => next = resume,
                    None => break,
                },
                TACOp::CondBranch { cond, target, .. } => {
                    if self.read(frame, cond)? != 0 {
                        next = self.label(target)?;
                    }
                }
                TACOp::Jump { target, .. } => next = self.label(target)?,
                TACOp::PrintOut(value) => {
                    let value = self.read(frame, value)?;
                    self.output.push(value);
                }
            }
            pc = next;
        }

        log::debug!("interp: {} steps, {} values printed", steps, self.output.len());
        Ok(self.output)
    }

    /// Pop the current frame and deliver `value` to the caller. `None` once
    /// `main` has returned.
    fn unwind(frames: &mut Vec<Frame>, value: i32) -> Option<usize> {
        let (resume, dest) = frames.pop()?.return_to?;
        let caller = frames.last_mut()?;
        caller.vars.insert(dest, value);
        Some(resume)
    }

    fn label(&self, name: &str) -> Result<usize, InterpError> {
        self.labels
            .get(name)
            .copied()
            .ok_or_else(|| InterpError::UnknownLabel(name.to_string()))
    }

    fn read(&self, frame: &Frame, operand: &str) -> Result<i32, InterpError> {
        if is_number(operand) {
            return literal(operand);
        }
        frame
            .vars
            .get(operand)
            .or_else(|| self.globals.get(operand))
            .copied()
            .ok_or_else(|| InterpError::UndefinedVariable(operand.to_string()))
    }

    fn write(&mut self, frame: &mut Frame, name: &str, value: i32) {
        if !frame.vars.contains_key(name) {
            if let Some(global) = self.globals.get_mut(name) {
                *global = value;
                return;
            }
        }
        frame.vars.insert(name.to_string(), value);
    }
}

/// Run `ops` from `main` with the given input.
pub fn run(ops: &[TACInstr], input: &[i32]) -> Result<Vec<i32>, InterpError> {
    Interpreter::new(ops).with_input(input).run()
}

fn literal(text: &str) -> Result<i32, InterpError> {
    text.parse()
        .map_err(|_| InterpError::MalformedLiteral(text.to_string()))
}

fn evaluate(a: i32, op: BinOp, b: i32) -> Result<i32, InterpError> {
    let truth = |c: bool| c as i32;
    Ok(match op {
        BinOp::Add => a.wrapping_add(b),
        BinOp::Sub => a.wrapping_sub(b),
        BinOp::Mul => a.wrapping_mul(b),
        BinOp::Div | BinOp::Rem if b == 0 => return Err(InterpError::DivisionByZero),
        BinOp::Div => a.wrapping_div(b),
        BinOp::Rem => a.wrapping_rem(b),
        BinOp::Lt => truth(a < b),
        BinOp::Le => truth(a <= b),
        BinOp::Gt => truth(a > b),
        BinOp::Ge => truth(a >= b),
        BinOp::Eq => truth(a == b),
        BinOp::Ne => truth(a != b),
        BinOp::And => truth(a != 0 && b != 0),
        BinOp::Or => truth(a != 0 || b != 0),
    })
}
