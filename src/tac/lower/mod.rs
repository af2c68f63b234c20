//! Lowering: consumes `Vec<TACInstr>` and produces target assembly text.
//!
//! Each target implements `Lowering` to control instruction selection and
//! the calling convention.

mod mips;

use super::TACInstr;
use crate::config::ReturnProtocol;

pub use mips::{Lowered, MipsLowering};

/// Lowers TAC instructions into target assembly lines.
pub trait Lowering {
    /// Convert a sequence of TAC instructions into assembly text lines.
    fn lower(&self, ops: &[TACInstr]) -> Vec<String>;
}

/// Create the MIPS lowering for the given return protocol.
pub fn create_lowering(protocol: ReturnProtocol) -> Box<dyn Lowering> {
    Box::new(MipsLowering::new(protocol))
}
