use std::process::ExitCode;

use clap::Parser;
use octoschema::cli::Cli;
use octoschema::telemetry;

fn main() -> ExitCode {
    telemetry::init_tracing();
    Cli::parse().run()
}
