//! Reading legacy flat environment files.
//!
//! Values are obtained by sourcing the file with `/bin/sh` and reading the
//! resulting environment, so shell expansions behave exactly as they do at
//! launch. Only keys the file itself assigns are kept, in declaration order.

use std::process::Command;

use camino::{Utf8Path, Utf8PathBuf};

use crate::ZccResult;
use crate::error::{file_error, malformed, precondition};
use crate::file::read_text;
use crate::flat::FlatNamespace;

/// Variable naming the directory that holds [`CERTIFICATE_ENV_FILE`].
pub const KEYSTORE_DIRECTORY: &str = "KEYSTORE_DIRECTORY";

/// Certificate settings file expected inside [`KEYSTORE_DIRECTORY`].
pub const CERTIFICATE_ENV_FILE: &str = "zowe-certificates.env";

const SOURCE_SCRIPT: &str = "set -a && . \"$1\" && env";

/// Keys assigned by `contents`, in declaration order.
///
/// Blank lines and `#` comments are skipped, as are lines without a key
/// before `=`. A leading `export` is ignored.
#[must_use]
pub fn declared_keys(contents: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let assignment = line.strip_prefix("export ").map_or(line, str::trim_start);
        let Some((key, _)) = assignment.split_once('=') else {
            continue;
        };
        if !key.is_empty() && !keys.iter().any(|known| known == key) {
            keys.push(key.to_owned());
        }
    }
    keys
}

/// Parse the output of `env` into a namespace.
///
/// A value beginning with `"` continues over following lines until one ends
/// with `"`; the quotes are dropped.
///
/// # Errors
///
/// Returns [`crate::ZccError::MalformedInput`] for any other non-empty line
/// that is not a `KEY=value` assignment.
pub fn parse_env_output(output: &str, source: &Utf8Path) -> ZccResult<FlatNamespace> {
    let mut entries: Vec<(String, String)> = Vec::new();
    let mut quoted = false;
    for line in output.lines().filter(|line| !line.is_empty()) {
        if quoted {
            let closing = line.ends_with('"');
            if let Some((_, value)) = entries.last_mut() {
                value.push('\n');
                value.push_str(line.strip_suffix('"').unwrap_or(line));
            }
            quoted = !closing;
            continue;
        }
        let Some((key, raw)) = line.split_once('=').filter(|(key, _)| !key.is_empty()) else {
            return Err(malformed(source, format!("Invalid env line: {line}")));
        };
        let (value, opens) = unquote(raw);
        quoted = opens;
        entries.push((key.to_owned(), value));
    }
    Ok(entries.into_iter().collect())
}

/// Strip a leading `"` and, when present on the same line, the closing one.
/// The flag reports an unterminated quote.
fn unquote(raw: &str) -> (String, bool) {
    let Some(inner) = raw.strip_prefix('"') else {
        return (raw.to_owned(), false);
    };
    inner
        .strip_suffix('"')
        .map_or_else(|| (inner.to_owned(), true), |closed| (closed.to_owned(), false))
}

/// Source `path` with `/bin/sh` and return the variables it assigns.
///
/// # Errors
///
/// Returns [`crate::ZccError::InputNotFound`] for a missing file, and
/// [`crate::ZccError::File`] when the shell cannot run or reports failure.
pub fn read_env_file(path: &Utf8Path) -> ZccResult<FlatNamespace> {
    let contents = read_text(path)?;
    let keys = declared_keys(&contents);
    // `.` searches PATH for bare file names
    let script = if path.is_relative() && !path.as_str().contains('/') {
        format!("./{path}")
    } else {
        path.to_string()
    };
    // Inherited multi-line values (exported shell functions, for one) would
    // not survive the line-oriented parse of the `env` output.
    let inherited = std::env::vars_os()
        .filter(|(_, value)| !value.as_encoded_bytes().contains(&b'\n'));
    let output = Command::new("/bin/sh")
        .env_clear()
        .envs(inherited)
        .args(["-c", SOURCE_SCRIPT, "sh", &script])
        .output()
        .map_err(|err| file_error(path, err))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(file_error(
            path,
            format!("sourcing failed ({}): {}", output.status, stderr.trim()),
        ));
    }
    let sourced = parse_env_output(&String::from_utf8_lossy(&output.stdout), path)?;
    Ok(keys
        .into_iter()
        .filter_map(|key| {
            let value = sourced.get(&key)?.to_owned();
            Some((key, value))
        })
        .collect())
}

/// Read `<keystore_dir>/zowe-certificates.env`.
///
/// # Errors
///
/// Returns [`crate::ZccError::PreconditionMissing`] when the file does not
/// exist, otherwise the errors of [`read_env_file`].
pub fn load_certificate_env(keystore_dir: &Utf8Path) -> ZccResult<FlatNamespace> {
    let path: Utf8PathBuf = keystore_dir.join(CERTIFICATE_ENV_FILE);
    if !path.is_file() {
        return Err(precondition(format!(
            "Keystore directory \"{keystore_dir}\" doesn't have \"{CERTIFICATE_ENV_FILE}\" file"
        )));
    }
    read_env_file(&path)
}

/// Read `path` and, when it names a [`KEYSTORE_DIRECTORY`], layer the
/// certificate settings found there on top.
///
/// # Errors
///
/// Propagates the errors of [`read_env_file`] and [`load_certificate_env`].
pub fn read_with_certificates(path: &Utf8Path) -> ZccResult<FlatNamespace> {
    let mut flat = read_env_file(path)?;
    let keystore = flat
        .get(KEYSTORE_DIRECTORY)
        .filter(|dir| !dir.is_empty())
        .map(Utf8PathBuf::from);
    if let Some(dir) = keystore {
        flat.extend_from(load_certificate_env(&dir)?);
    }
    Ok(flat)
}
