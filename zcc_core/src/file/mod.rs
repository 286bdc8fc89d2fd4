//! Reading and writing configuration documents.
//!
//! Two serializations are supported, chosen by file extension: YAML
//! (`.yaml`/`.yml`) and JSON (`.json`). YAML is parsed with strict YAML 1.2
//! booleans so that `yes`/`on` stay strings.

mod helpers;
mod include;
mod yaml;

use camino::Utf8Path;
use serde_json::Value;

use crate::error::{file_error, read_error};
use crate::{ZccError, ZccResult, ZccResultExt};

pub use helpers::NEW_FILE_MODE;
pub use include::{INCLUDE_KEY, resolve};
pub(crate) use helpers::parent_or_dot;
pub(crate) use yaml::{emit_yaml, inline_value, is_block, parse_yaml, scalar_string};

/// Serialization of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Block/flow hierarchical format.
    Yaml,
    /// Compact record format.
    Json,
}

impl Format {
    /// Determine the format from the extension of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ZccError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Utf8Path) -> ZccResult<Self> {
        match path.extension().map(str::to_ascii_lowercase).as_deref() {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(std::sync::Arc::new(ZccError::UnsupportedFormat {
                path: path.to_path_buf(),
            })),
        }
    }
}

/// Read a file into a string.
///
/// # Errors
///
/// Returns [`ZccError::InputNotFound`] when the file is missing, otherwise
/// [`ZccError::File`].
pub fn read_text(path: &Utf8Path) -> ZccResult<String> {
    helpers::read_to_string(path).map_err(|err| read_error(path, err))
}

/// Parse `contents` in the given format. `path` is used for error messages.
///
/// # Errors
///
/// Returns [`ZccError::File`] if the text is not valid for `format`.
pub fn parse_document(contents: &str, format: Format, path: &Utf8Path) -> ZccResult<Value> {
    match format {
        Format::Yaml => parse_yaml(contents).map_err(|err| file_error(path, err)),
        Format::Json => serde_json::from_str(contents).map_err(|err| file_error(path, err)),
    }
}

/// Read and parse one document without expanding includes.
///
/// # Errors
///
/// Propagates read and parse failures from [`read_text`] and
/// [`parse_document`].
pub fn read_tree(path: &Utf8Path) -> ZccResult<Value> {
    let format = Format::from_path(path)?;
    let contents = read_text(path)?;
    parse_document(&contents, format, path)
}

/// Render `tree` in `format`, terminated by a newline.
///
/// # Errors
///
/// Returns [`ZccError::Serialization`] if JSON encoding fails.
pub fn render(tree: &Value, format: Format) -> ZccResult<String> {
    match format {
        Format::Yaml => Ok(emit_yaml(tree)),
        Format::Json => {
            let mut text = serde_json::to_string_pretty(tree).into_zcc()?;
            text.push('\n');
            Ok(text)
        }
    }
}

/// Write `contents` to `path`, creating parents and applying
/// [`NEW_FILE_MODE`] to new files.
///
/// # Errors
///
/// Returns [`ZccError::File`] when the file cannot be written.
pub fn write_text(path: &Utf8Path, contents: &str) -> ZccResult<()> {
    helpers::write_string(path, contents).map_err(|err| file_error(path, err))
}

/// Serialize `tree` in the format implied by `path` and write it.
///
/// # Errors
///
/// Propagates format detection, rendering, and write failures.
pub fn write_tree(path: &Utf8Path, tree: &Value) -> ZccResult<()> {
    let format = Format::from_path(path)?;
    write_text(path, &render(tree, format)?)
}

#[cfg(test)]
mod tests;
