mod cli;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tacc",
    version,
    about = "TAC back end: syntax tree to three-address code to MIPS"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a JSON syntax tree to MIPS assembly
    Build(cli::build::BuildArgs),
    /// Print the TAC listing after the requested passes
    Tac(cli::tac::TacArgs),
    /// Interpret the TAC and print every value the program writes
    Run(cli::run::RunArgs),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Build(args) => cli::build::cmd_build(args),
        Command::Tac(args) => cli::tac::cmd_tac(args),
        Command::Run(args) => cli::run::cmd_run(args),
    }
}
