use std::process::ExitCode;

use clap::Parser;
use jsonrepair::cli::{self, Cli};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    cli::run(Cli::parse())
}
