//! `zcc` entry point: parse arguments, install logging, run the command.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use zcc::CliError;
use zcc::cli::Cli;
use zcc::settings::verbose_from_env;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = cli.verbose || verbose_from_env();
    let outcome =
        zcc::logging::init(verbose).and_then(|()| zcc::run(&cli, verbose, &mut io::stdout()));
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

#[expect(clippy::print_stderr, reason = "last-resort report of a failed command")]
fn report(err: &CliError) {
    eprintln!("Error: {err}");
}
