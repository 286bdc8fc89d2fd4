//! Include expansion across documents.
//!
//! Any object node may carry an [`INCLUDE_KEY`] member naming one document,
//! or a sequence of documents, relative to the file that contains it. A key
//! repeated at one level arrives here as a single list, in encounter order.
//! Once the node's ordinary members are resolved, each referenced document is
//! resolved in turn and deep-merged on top, in reference order.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{file_error, read_error};
use crate::tree::deep_merge;
use crate::{ZccError, ZccResult};

use super::{parent_or_dot, read_tree};

/// Reserved member name holding include references.
pub const INCLUDE_KEY: &str = "@include";

/// Parse `root` and expand every include directive it reaches.
///
/// # Errors
///
/// Returns [`ZccError::InputNotFound`] when `root` or any referenced
/// document is missing, [`ZccError::CyclicInclude`] when a document
/// (directly or indirectly) includes itself, and parse failures from the
/// underlying reader.
///
/// # Examples
///
/// ```rust,no_run
/// use camino::Utf8Path;
///
/// # fn run() -> zcc_core::ZccResult<()> {
/// let tree = zcc_core::file::resolve(Utf8Path::new("zowe.yaml"))?;
/// assert!(tree.is_object());
/// # Ok(())
/// # }
/// ```
pub fn resolve(root: &Utf8Path) -> ZccResult<Value> {
    let mut visited = HashSet::new();
    let mut stack = Vec::new();
    resolve_file(root, &mut visited, &mut stack)
}

fn resolve_file(
    path: &Utf8Path,
    visited: &mut HashSet<Utf8PathBuf>,
    stack: &mut Vec<Utf8PathBuf>,
) -> ZccResult<Value> {
    with_cycle_detection(path, visited, stack, |canonical, visited_paths, stack_paths| {
        let tree = read_tree(canonical)?;
        resolve_node(tree, canonical, visited_paths, stack_paths)
    })
}

fn with_cycle_detection<T, F>(
    path: &Utf8Path,
    visited: &mut HashSet<Utf8PathBuf>,
    stack: &mut Vec<Utf8PathBuf>,
    operation: F,
) -> ZccResult<T>
where
    F: FnOnce(&Utf8Path, &mut HashSet<Utf8PathBuf>, &mut Vec<Utf8PathBuf>) -> ZccResult<T>,
{
    let canonical = path
        .canonicalize_utf8()
        .map_err(|err| read_error(path, err))?;
    if !visited.insert(canonical.clone()) {
        let mut cycle: Vec<&str> = stack.iter().map(|entry| entry.as_str()).collect();
        cycle.push(canonical.as_str());
        return Err(Arc::new(ZccError::CyclicInclude {
            cycle: cycle.join(" -> "),
        }));
    }
    stack.push(canonical.clone());
    let result = operation(&canonical, visited, stack);
    visited.remove(&canonical);
    stack.pop();
    result
}

fn resolve_node(
    node: Value,
    source: &Utf8Path,
    visited: &mut HashSet<Utf8PathBuf>,
    stack: &mut Vec<Utf8PathBuf>,
) -> ZccResult<Value> {
    match node {
        Value::Object(map) => {
            let mut resolved = Map::new();
            let mut references = Vec::new();
            for (key, child) in map {
                if key == INCLUDE_KEY {
                    collect_references(&child, source, &mut references)?;
                } else {
                    resolved.insert(key, resolve_node(child, source, visited, stack)?);
                }
            }
            let mut merged = Value::Object(resolved);
            for reference in references {
                let included = resolve_file(&reference, visited, stack)?;
                deep_merge(&mut merged, included);
            }
            Ok(merged)
        }
        Value::Array(items) => items
            .into_iter()
            .map(|item| resolve_node(item, source, visited, stack))
            .collect::<ZccResult<Vec<_>>>()
            .map(Value::Array),
        scalar => Ok(scalar),
    }
}

fn collect_references(
    value: &Value,
    source: &Utf8Path,
    out: &mut Vec<Utf8PathBuf>,
) -> ZccResult<()> {
    match value {
        Value::String(reference) if !reference.is_empty() => {
            out.push(reference_path(source, reference));
            Ok(())
        }
        Value::Array(items) => items
            .iter()
            .try_for_each(|item| match item {
                Value::Array(_) => Err(invalid_reference(source)),
                other => collect_references(other, source, out),
            }),
        _ => Err(invalid_reference(source)),
    }
}

fn reference_path(source: &Utf8Path, reference: &str) -> Utf8PathBuf {
    let candidate = Utf8Path::new(reference);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        parent_or_dot(source).join(candidate)
    }
}

fn invalid_reference(source: &Utf8Path) -> Arc<ZccError> {
    file_error(
        source,
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("'{INCLUDE_KEY}' must be a non-empty path or a list of paths"),
        ),
    )
}
