//! Tracing setup for the `zcc` binary.
//!
//! Notices (`info` and below) go to standard output so verbose runs read as
//! one transcript; warnings and errors go to standard error. `RUST_LOG`
//! overrides the level picked from the verbosity switch.

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::Result;

/// Install the global subscriber.
///
/// # Errors
///
/// Returns [`crate::CliError::Logging`] when a subscriber is already
/// installed.
pub fn init(verbose: bool) -> Result<()> {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stdout.with_min_level(Level::INFO))
                .with_ansi(false)
                .with_target(false)
                .with_level(false)
                .without_time(),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr.with_max_level(Level::WARN))
                .with_ansi(false)
                .with_target(false)
                .without_time(),
        )
        .try_init()?;
    Ok(())
}
