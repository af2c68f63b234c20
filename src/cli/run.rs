use std::path::PathBuf;
use std::process;

use clap::Args;

use tacc::tac::interp::{Interpreter, DEFAULT_STEP_LIMIT};

use super::{load_or_exit, PassArgs};

#[derive(Args)]
pub struct RunArgs {
    /// Input JSON syntax tree
    pub input: PathBuf,
    #[command(flatten)]
    pub passes: PassArgs,
    /// Values returned by successive readIntFromSTDIN calls
    #[arg(long = "input", value_name = "N", allow_negative_numbers = true)]
    pub input_values: Vec<i32>,
    /// Abort after this many executed instructions
    #[arg(long, default_value_t = DEFAULT_STEP_LIMIT)]
    pub max_steps: usize,
}

pub fn cmd_run(args: RunArgs) {
    let program = load_or_exit(&args.input);
    let ops = tacc::optimize(&program, &args.passes.options());
    let result = Interpreter::new(&ops)
        .with_input(&args.input_values)
        .with_step_limit(args.max_steps)
        .run();
    match result {
        Ok(printed) => {
            for value in printed {
                println!("{}", value);
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}
