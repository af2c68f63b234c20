use std::path::Path;

use crate::ast::Program;
use crate::config::CompileOptions;
use crate::error::{CompileError, CompileResult, InterpError};
use crate::tac::builder::TACBuilder;
use crate::tac::interp::Interpreter;
use crate::tac::lower::MipsLowering;
use crate::tac::optimize::run_passes;
use crate::tac::{self, TACInstr};


/// Everything one compilation produced, stage by stage.
#[derive(Clone, Debug)]
pub struct Compilation {
    /// Translator output, before any pass.
    pub tac: Vec<TACInstr>,
    /// Stream after the requested passes.
    pub optimized: Vec<TACInstr>,
    /// Assembly lines.
    pub assembly: Vec<String>,
    /// Names the emitter could not place in any storage.
    pub unresolved: Vec<String>,
}

impl Compilation {
    /// Assembly as one newline-terminated text.
    pub fn assembly_text(&self) -> String {
        let mut text = self.assembly.join("\n");
        text.push('\n');
        text
    }

    /// TAC listing of the optimized stream.
    pub fn listing(&self) -> String {
        tac::listing(&self.optimized)
    }
}

/// Read and decode a JSON syntax tree.
pub fn load_program(path: &Path) -> CompileResult<Program> {
    let text = std::fs::read_to_string(path).map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Program::from_json(&text)?)
}

/// Translate a program to TAC with a fresh translation context.
pub fn translate(program: &Program) -> Vec<TACInstr> {
    TACBuilder::new().build_program(program)
}

/// Translate and run the requested passes.
pub fn optimize(program: &Program, options: &CompileOptions) -> Vec<TACInstr> {
    run_passes(translate(program), &options.passes)
}

/// Run the whole pipeline on a decoded program.
pub fn compile(program: &Program, options: &CompileOptions) -> Compilation {
    let tac = translate(program);
    let optimized = run_passes(tac.clone(), &options.passes);
    let lowered = MipsLowering::new(options.protocol).lower_with_report(&optimized);
    log::info!(
        "compiled {} TAC instructions ({} after passes) into {} assembly lines",
        tac.len(),
        optimized.len(),
        lowered.lines.len()
    );
    Compilation {
        tac,
        optimized,
        assembly: lowered.lines,
        unresolved: lowered.unresolved,
    }
}

/// Decode a JSON syntax tree and compile it.
pub fn compile_json(source: &str, options: &CompileOptions) -> CompileResult<Compilation> {
    let program = Program::from_json(source)?;
    Ok(compile(&program, options))
}

/// Load a JSON syntax tree from disk and compile it.
pub fn compile_file(path: &Path, options: &CompileOptions) -> CompileResult<Compilation> {
    let program = load_program(path)?;
    Ok(compile(&program, options))
}

/// Translate, optimize and interpret; returns the printed values.
pub fn run_program(
    program: &Program,
    options: &CompileOptions,
    input: &[i32],
) -> Result<Vec<i32>, InterpError> {
    let ops = optimize(program, options);
    Interpreter::new(&ops).with_input(input).run()
}
