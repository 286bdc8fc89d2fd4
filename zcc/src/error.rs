//! Errors reported by the `zcc` binary.

use std::sync::Arc;

use thiserror::Error;
use zcc_core::ZccError;

/// Failures surfaced to the user as `Error: <message>`.
#[derive(Debug, Error)]
pub enum CliError {
    /// The engine rejected the input or failed to process it.
    #[error(transparent)]
    Engine(#[from] Arc<ZccError>),

    /// Layered settings could not be extracted.
    #[error("failed to load settings: {0}")]
    Settings(#[source] Box<figment::Error>),

    /// Writing to standard output failed.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    /// The tracing subscriber could not be installed.
    #[error("failed to initialise logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Settings(Box::new(err))
    }
}

/// Result alias for command handlers.
pub type Result<T, E = CliError> = std::result::Result<T, E>;
