use std::path::PathBuf;
use std::process;

use clap::Args;

use tacc::ReturnProtocol;

use super::{load_or_exit, PassArgs};

#[derive(Args)]
pub struct BuildArgs {
    /// Input JSON syntax tree
    pub input: PathBuf,
    /// Output .s file (default: <input>.s)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub passes: PassArgs,
    /// Call/return linkage (link-register or trampoline)
    #[arg(long, value_name = "PROTOCOL", default_value = "link-register")]
    pub return_protocol: ReturnProtocol,
    /// Also write the TAC listing next to the assembly (<output>.tac)
    #[arg(long)]
    pub emit_tac: bool,
}

pub fn cmd_build(args: BuildArgs) {
    let BuildArgs {
        input,
        output,
        passes,
        return_protocol,
        emit_tac,
    } = args;

    let program = load_or_exit(&input);
    let options = passes.options().with_protocol(return_protocol);
    let compilation = tacc::compile(&program, &options);

    for name in &compilation.unresolved {
        eprintln!("warning: `{}` has no storage; emitted register fallback", name);
    }

    let out_path = output.unwrap_or_else(|| input.with_extension("s"));
    if let Err(e) = std::fs::write(&out_path, compilation.assembly_text()) {
        eprintln!("error: cannot write '{}': {}", out_path.display(), e);
        process::exit(1);
    }
    if emit_tac {
        let tac_path = out_path.with_extension("tac");
        if let Err(e) = std::fs::write(&tac_path, compilation.listing()) {
            eprintln!("error: cannot write '{}': {}", tac_path.display(), e);
            process::exit(1);
        }
    }

    eprintln!(
        "Compiled -> {} ({} TAC instructions, {} after passes)",
        out_path.display(),
        compilation.tac.len(),
        compilation.optimized.len()
    );
}
