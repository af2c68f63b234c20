//! Constant folding.
//!
//! `tN := 2 + 3; x := tN` becomes `x := 5`. A second sub-pass then fuses
//! `tM := x + 1; y := tM` into `y := x + 1` whenever the operand `x` was
//! itself produced by the fold (or by an earlier link of the same chain)
//! right before it.

use crate::error::ArithmeticError;
use crate::tac::{is_number, is_temp, BinOp, InstrFlags, TACInstr, TACOp};

/// Fold every literal-only arithmetic `BinaryOp`, then fuse the chains the
/// folds started.
pub fn fold_constants(ops: Vec<TACInstr>) -> Vec<TACInstr> {
    fuse_chains(fold_pairs(ops))
}

/// Evaluate `lhs op rhs` over i32 with wrapping semantics.
///
/// `Ok(None)` for operators folding leaves alone (remainder, comparisons,
/// logic). Division truncates toward zero.
pub fn fold_binary(lhs: &str, op: BinOp, rhs: &str) -> Result<Option<i32>, ArithmeticError> {
    let apply: fn(i32, i32) -> i32 = match op {
        BinOp::Add => i32::wrapping_add,
        BinOp::Sub => i32::wrapping_sub,
        BinOp::Mul => i32::wrapping_mul,
        BinOp::Div => i32::wrapping_div,
        _ => return Ok(None),
    };
    let a = parse_literal(lhs)?;
    let b = parse_literal(rhs)?;
    if op == BinOp::Div && b == 0 {
        return Err(ArithmeticError::DivisionByZero {
            lhs: lhs.to_string(),
        });
    }
    Ok(Some(apply(a, b)))
}

fn parse_literal(text: &str) -> Result<i32, ArithmeticError> {
    text.parse()
        .map_err(|_| ArithmeticError::MalformedLiteral(text.to_string()))
}

/// `Some((dest, value))` when `instr` folds to a constant.
fn try_fold(instr: &TACInstr) -> Option<(String, i32)> {
    let TACOp::BinaryOp { dest, lhs, op, rhs } = &instr.op else {
        return None;
    };
    if !is_number(lhs) || !is_number(rhs) {
        return None;
    }
    match fold_binary(lhs, *op, rhs) {
        Ok(Some(value)) => Some((dest.clone(), value)),
        Ok(None) => None,
        Err(e) => {
            log::warn!("not folding `{}`: {}", instr, e);
            None
        }
    }
}

/// Target of `instr` if it is a plain copy `target := source` out of a
/// temporary. User variables are never fused away.
fn copy_of<'a>(instr: &'a TACInstr, source: &str) -> Option<&'a str> {
    if !is_temp(source) {
        return None;
    }
    match &instr.op {
        TACOp::LocalAssign { target, value } if value == source => Some(target),
        _ => None,
    }
}

fn fold_pairs(ops: Vec<TACInstr>) -> Vec<TACInstr> {
    let mut out: Vec<TACInstr> = Vec::with_capacity(ops.len());
    let mut i = 0;
    while i < ops.len() {
        let Some((dest, value)) = try_fold(&ops[i]) else {
            out.push(ops[i].clone());
            i += 1;
            continue;
        };

        let copy = ops.get(i + 1).and_then(|next| copy_of(next, &dest));
        let (target, flags) = match copy {
            Some(target) => (target.to_string(), ops[i + 1].flags),
            None => (dest, ops[i].flags),
        };
        out.push(TACInstr {
            op: TACOp::LocalAssign {
                target,
                value: value.to_string(),
            },
            flags: InstrFlags {
                folded: true,
                ..flags
            },
        });
        i += if copy.is_some() { 2 } else { 1 };
    }
    out
}

/// True when `prev` is a link of a fold chain that defines one of the
/// operands.
fn continues_chain(prev: &TACInstr, lhs: &str, rhs: &str) -> bool {
    prev.flags.folded
        && prev
            .defined_name()
            .is_some_and(|name| name == lhs || name == rhs)
}

fn fuse_chains(ops: Vec<TACInstr>) -> Vec<TACInstr> {
    let mut out: Vec<TACInstr> = Vec::with_capacity(ops.len());
    let mut i = 0;
    while i < ops.len() {
        if let (TACOp::BinaryOp { dest, lhs, op, rhs }, Some(next)) = (&ops[i].op, ops.get(i + 1))
        {
            let linked = !op.is_comparison()
                && out
                    .last()
                    .is_some_and(|prev| continues_chain(prev, lhs, rhs));
            if let (true, Some(target)) = (linked, copy_of(next, dest)) {
                out.push(TACInstr {
                    op: TACOp::BinaryOp {
                        dest: target.to_string(),
                        lhs: lhs.clone(),
                        op: *op,
                        rhs: rhs.clone(),
                    },
                    flags: InstrFlags {
                        folded: true,
                        ..next.flags
                    },
                });
                i += 2;
                continue;
            }
        }
        out.push(ops[i].clone());
        i += 1;
    }
    out
}
