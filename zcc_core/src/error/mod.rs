//! Error types produced by the resolution engine.
//!
//! Library functions return [`ZccResult`], which shares the error through an
//! [`Arc`] so that callers can attach the same failure to several diagnostics
//! without cloning the underlying source.

mod constructors;

use camino::Utf8PathBuf;
use std::sync::Arc;
use thiserror::Error;

pub(crate) use constructors::{
    edit_error, file_error, invalid_path, malformed, precondition, read_error,
};

/// Result alias used throughout the engine.
pub type ZccResult<T> = Result<T, Arc<ZccError>>;

/// Errors that can occur while resolving, rendering, or editing configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ZccError {
    /// A source document, include target, or manifest does not exist.
    #[error("no such file or directory: '{path}'")]
    InputNotFound {
        /// Path that could not be found.
        path: Utf8PathBuf,
    },

    /// Reading, parsing, or writing a file failed.
    #[error("configuration file error in '{path}': {source}")]
    File {
        /// Path that triggered the failure.
        path: Utf8PathBuf,
        /// Underlying error reported by the reader or writer.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A flat-namespace source contained a line that is not a `KEY=value` pair.
    #[error("malformed input in '{path}': {message}")]
    MalformedInput {
        /// File or command the input came from.
        path: Utf8PathBuf,
        /// Parser message, including the offending line.
        message: String,
    },

    /// A required input such as the workspace directory or instance id is absent.
    #[error("{message}")]
    PreconditionMissing {
        /// Human-readable description of the missing precondition.
        message: String,
    },

    /// Cycle detected while expanding include directives.
    #[error("cyclic include detected: {cycle}")]
    CyclicInclude {
        /// Chain of documents participating in the cycle.
        cycle: String,
    },

    /// A dot/bracket path expression could not be parsed or applied.
    #[error("invalid configuration path '{path}': {message}")]
    InvalidPath {
        /// Path expression as supplied.
        path: String,
        /// Reason the path was rejected.
        message: String,
    },

    /// The file extension does not name a supported serialization.
    #[error("unsupported file format for '{path}': expected .yaml, .yml or .json")]
    UnsupportedFormat {
        /// Path with the unsupported extension.
        path: Utf8PathBuf,
    },

    /// JSON encoding or decoding failed.
    #[error("failed to serialise configuration: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A format-preserving edit produced an invalid document.
    #[error("cannot edit '{path}': {message}")]
    Edit {
        /// Tree path being edited.
        path: String,
        /// Description of the failure.
        message: String,
    },
}

#[cfg(test)]
mod tests;
