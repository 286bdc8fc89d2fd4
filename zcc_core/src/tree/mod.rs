//! Configuration tree model: path addressing and merge semantics.
//!
//! Trees are plain [`serde_json::Value`]s built with order-preserving maps, so
//! object members keep the order they had in the source document.

mod merge;
mod path;

use serde_json::Value;

pub use merge::{deep_merge, merge_defaults};
pub use path::{Segment, TreePath};

use crate::ZccResult;

/// Read the value at `path`, parsing the expression first.
///
/// # Errors
///
/// Returns [`crate::ZccError::InvalidPath`] if `path` does not parse.
pub fn get<'a>(tree: &'a Value, path: &str) -> ZccResult<Option<&'a Value>> {
    Ok(TreePath::parse(path)?.get(tree))
}

/// Write `value` at `path`, creating intermediate containers as needed.
///
/// # Errors
///
/// Returns [`crate::ZccError::InvalidPath`] if `path` does not parse.
pub fn set(tree: &mut Value, path: &str, value: Value) -> ZccResult<()> {
    TreePath::parse(path)?.set(tree, value);
    Ok(())
}

/// Every scalar leaf of `tree` with its path, in document order.
///
/// Empty objects and arrays produce no leaves.
#[must_use]
pub fn leaves(tree: &Value) -> Vec<(TreePath, Value)> {
    let mut out = Vec::new();
    collect_leaves(tree, &TreePath::from_segments(Vec::new()), &mut out);
    out
}

fn collect_leaves(node: &Value, prefix: &TreePath, out: &mut Vec<(TreePath, Value)>) {
    match node {
        Value::Object(map) => {
            for (key, child) in map {
                collect_leaves(child, &prefix.child(Segment::Key(key.clone())), out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                collect_leaves(child, &prefix.child(Segment::Index(index)), out);
            }
        }
        _ => out.push((prefix.clone(), node.clone())),
    }
}

/// Interpret a tree value as a flag.
///
/// Booleans are taken as-is; the strings `"true"`/`"false"` (any case) are
/// coerced. Anything else yields `None`.
#[must_use]
pub fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) if text.eq_ignore_ascii_case("true") => Some(true),
        Value::String(text) if text.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

/// Loose truthiness used by mapping rules: `null`, `false`, `0` and the
/// empty string are false; everything else, containers included, is true.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number
            .as_f64()
            .is_some_and(|n| n.classify() != std::num::FpCategory::Zero),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Whether an `enabled`-style value switches its owner on.
///
/// Flag values follow [`as_flag`], so the string `"false"` is off; other
/// values fall back to [`is_truthy`].
#[must_use]
pub fn is_enabled(value: &Value) -> bool {
    as_flag(value).unwrap_or_else(|| is_truthy(value))
}
