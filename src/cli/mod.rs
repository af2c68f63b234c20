pub mod build;
pub mod run;
pub mod tac;

use std::path::Path;
use std::process;

use clap::Args;

use tacc::{CompileOptions, Pass, Program};

/// Pass selection shared by every subcommand.
#[derive(Args)]
pub struct PassArgs {
    /// Optimization pass to run, in order (fold, propagate, eliminate-dead-code)
    #[arg(long = "pass", value_name = "PASS")]
    pub passes: Vec<Pass>,
    /// Run every pass once in the default order
    #[arg(short = 'O', long, conflicts_with = "passes")]
    pub optimize: bool,
}

impl PassArgs {
    pub fn options(&self) -> CompileOptions {
        if self.optimize {
            CompileOptions::all_passes()
        } else {
            CompileOptions {
                passes: self.passes.clone(),
                ..CompileOptions::default()
            }
        }
    }
}

/// Load a syntax tree or exit with a diagnostic.
pub fn load_or_exit(input: &Path) -> Program {
    match tacc::load_program(input) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}
