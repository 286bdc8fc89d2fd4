//! Shorthand constructors returning shared errors.

use camino::Utf8Path;
use std::error::Error;
use std::sync::Arc;

use super::ZccError;

/// Construct a [`ZccError::File`] for `path`.
pub(crate) fn file_error(
    path: &Utf8Path,
    err: impl Into<Box<dyn Error + Send + Sync>>,
) -> Arc<ZccError> {
    Arc::new(ZccError::File {
        path: path.to_path_buf(),
        source: err.into(),
    })
}

fn not_found(path: &Utf8Path) -> Arc<ZccError> {
    Arc::new(ZccError::InputNotFound {
        path: path.to_path_buf(),
    })
}

/// Map an I/O failure while reading `path`, surfacing missing files as
/// [`ZccError::InputNotFound`].
pub(crate) fn read_error(path: &Utf8Path, err: std::io::Error) -> Arc<ZccError> {
    if err.kind() == std::io::ErrorKind::NotFound {
        not_found(path)
    } else {
        file_error(path, err)
    }
}

pub(crate) fn malformed(path: &Utf8Path, message: impl Into<String>) -> Arc<ZccError> {
    Arc::new(ZccError::MalformedInput {
        path: path.to_path_buf(),
        message: message.into(),
    })
}

pub(crate) fn precondition(message: impl Into<String>) -> Arc<ZccError> {
    Arc::new(ZccError::PreconditionMissing {
        message: message.into(),
    })
}

pub(crate) fn invalid_path(path: &str, message: impl Into<String>) -> Arc<ZccError> {
    Arc::new(ZccError::InvalidPath {
        path: path.to_owned(),
        message: message.into(),
    })
}

pub(crate) fn edit_error(path: &str, message: impl Into<String>) -> Arc<ZccError> {
    Arc::new(ZccError::Edit {
        path: path.to_owned(),
        message: message.into(),
    })
}
