//! Command-line front end for the Zowe configuration converter.
//!
//! The binary parses [`cli::Cli`], installs logging and hands the selected
//! command to [`run`]. Handlers live in [`commands`] and call straight into
//! `zcc_core`.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod settings;

use std::io::Write;

use zcc_core::Context;

pub use error::CliError;

/// Run the parsed command line with the given verbosity.
///
/// # Errors
///
/// Returns the failure of the selected command.
pub fn run<W: Write>(cli: &cli::Cli, verbose: bool, out: &mut W) -> error::Result<()> {
    let ctx = Context::new(verbose);
    ctx.note(format!("CLI arguments: {:?}", cli.command));
    commands::dispatch(&cli.command, &ctx, out)?;
    out.flush()?;
    Ok(())
}
