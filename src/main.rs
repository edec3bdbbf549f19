use clap::Parser;
use crossover::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
