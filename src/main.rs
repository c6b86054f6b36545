use clap::Parser;
use fxsim::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
