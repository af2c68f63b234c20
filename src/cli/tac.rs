use std::path::PathBuf;

use clap::Args;

use super::{load_or_exit, PassArgs};

#[derive(Args)]
pub struct TacArgs {
    /// Input JSON syntax tree
    pub input: PathBuf,
    #[command(flatten)]
    pub passes: PassArgs,
}

pub fn cmd_tac(args: TacArgs) {
    let program = load_or_exit(&args.input);
    let ops = tacc::optimize(&program, &args.passes.options());
    print!("{}", tacc::tac::listing(&ops));
}
