//! Bidirectional mapping between the flat legacy namespace and the tree.
//!
//! Both directions are driven by static tables of [`MappingEntry`] rules.
//! The import table ([`to_tree`]) is consulted per flat key; the export table
//! ([`to_flat`]) is walked in declared order, which fixes the section layout
//! of rendered legacy files.

mod export;
mod import;

use serde_json::Value;

use crate::diagnostics::Context;
use crate::flat::FlatNamespace;
use crate::tree::{Segment, TreePath};
use crate::{ZccResult, tree};

pub use export::EXPORT_TABLE;
pub use import::IMPORT_TABLE;

/// Tree path that receives flat keys unknown to the import table.
pub const EXTENSION_PATH: &str = "zowe.environments";

/// Per-key rule shared by both mapping directions.
#[derive(Debug, Clone, Copy)]
pub enum MappingEntry<F> {
    /// Drop the key (noted in verbose mode).
    Ignore,
    /// Read or write exactly one tree path.
    Path(&'static str),
    /// Write every listed path; on export, read all and let the last win.
    Paths(&'static [&'static str]),
    /// Derive the value with a function.
    Computed(F),
}

/// Import rule: raw value, whole flat namespace, target tree, context.
pub type ImportFn = fn(&str, &FlatNamespace, &mut Value, &Context) -> ZccResult<()>;

/// Export rule: returns the value to render, or `None` to emit no line.
pub type ExportFn = fn(&RenderInput<'_>) -> ZccResult<Option<Value>>;

/// One row of the import table.
#[derive(Debug, Clone, Copy)]
pub struct ImportRule {
    /// Flat-namespace variable name.
    pub key: &'static str,
    /// How the variable maps into the tree.
    pub entry: MappingEntry<ImportFn>,
}

/// One row of the export table.
#[derive(Debug, Clone, Copy)]
pub enum ExportLine {
    /// Blank line between sections.
    Separator,
    /// Literal `#` comment line.
    Comment(&'static str),
    /// Variable rendered from the tree.
    Entry {
        /// Flat-namespace variable name.
        key: &'static str,
        /// How the value is read from the tree.
        rule: MappingEntry<ExportFn>,
    },
}

/// Everything an export rule may consult.
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    /// Tree being rendered: an instance tree, or an effective component tree
    /// carrying the component subtree under `configs`.
    pub tree: &'a Value,
    /// Instance the tree was resolved for.
    pub instance_id: &'a str,
    /// Component being rendered, when rendering a component view.
    pub component_id: Option<&'a str>,
    /// Composed document before instance resolution.
    pub original: &'a Value,
}

/// One rendered line of a legacy flat file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlatLine {
    /// Blank line.
    Separator,
    /// Comment text including the leading `#`.
    Comment(String),
    /// `KEY=value` assignment.
    Pair {
        /// Variable name.
        key: String,
        /// Unquoted value.
        value: String,
    },
}

/// Convert a flat namespace into a configuration tree.
///
/// Keys are processed in the namespace's own order. Keys missing from
/// [`IMPORT_TABLE`] are kept under [`EXTENSION_PATH`].
///
/// # Errors
///
/// Propagates failures raised by computed rules.
pub fn to_tree(flat: &FlatNamespace, ctx: &Context) -> ZccResult<Value> {
    let mut tree = Value::Object(serde_json::Map::new());
    for (key, value) in flat.iter() {
        match import::lookup(key) {
            Some(MappingEntry::Ignore) => {
                ctx.note(format!("Ignore key {key} with value {}", quoted(value)));
            }
            Some(MappingEntry::Path(path)) => tree::set(&mut tree, path, Value::from(value))?,
            Some(MappingEntry::Paths(paths)) => {
                for path in paths {
                    tree::set(&mut tree, path, Value::from(value))?;
                }
            }
            Some(MappingEntry::Computed(apply)) => apply(value, flat, &mut tree, ctx)?,
            None => {
                ctx.note(format!("Unknown key {key} with value {}", quoted(value)));
                extension_path(key).set(&mut tree, Value::from(value));
            }
        }
    }
    Ok(tree)
}

/// Render a tree into ordered flat lines.
///
/// Walks [`EXPORT_TABLE`] in order, then appends every entry under
/// [`EXTENSION_PATH`] that the table did not already emit.
///
/// # Errors
///
/// Propagates failures raised by computed rules.
pub fn to_flat(input: &RenderInput<'_>, ctx: &Context) -> ZccResult<Vec<FlatLine>> {
    let mut lines = Vec::new();
    let mut emitted: Vec<&str> = Vec::new();
    for line in EXPORT_TABLE {
        match line {
            ExportLine::Separator => lines.push(FlatLine::Separator),
            ExportLine::Comment(text) => lines.push(FlatLine::Comment((*text).to_owned())),
            ExportLine::Entry { key, rule } => {
                let Some(value) = export_value(key, rule, input, ctx)? else {
                    continue;
                };
                emitted.push(*key);
                lines.push(FlatLine::Pair {
                    key: (*key).to_owned(),
                    value: flat_value(&value),
                });
            }
        }
    }
    let extras = extension_lines(input.tree, &emitted)?;
    if !extras.is_empty() {
        lines.push(FlatLine::Separator);
        lines.push(FlatLine::Comment("# extra environments".to_owned()));
        lines.extend(extras);
    }
    Ok(lines)
}

fn export_value(
    key: &str,
    rule: &MappingEntry<ExportFn>,
    input: &RenderInput<'_>,
    ctx: &Context,
) -> ZccResult<Option<Value>> {
    match rule {
        MappingEntry::Ignore => Ok(None),
        MappingEntry::Path(path) => Ok(tree::get(input.tree, path)?.cloned()),
        MappingEntry::Paths(paths) => {
            let mut present = Vec::new();
            for path in *paths {
                if let Some(value) = tree::get(input.tree, path)? {
                    present.push((*path, value));
                }
            }
            if let Some((last_path, last)) = present.last() {
                if present.iter().any(|(_, value)| value != last) {
                    let listing: Vec<String> = present
                        .iter()
                        .map(|(path, value)| format!("{path}={}", flat_value(value)))
                        .collect();
                    ctx.warn(format!(
                        "Values for {key} differ ({}); using {last_path}",
                        listing.join(", ")
                    ));
                }
            }
            Ok(present.last().map(|(_, value)| (*value).clone()))
        }
        MappingEntry::Computed(derive) => derive(input),
    }
}

fn extension_lines(tree: &Value, emitted: &[&str]) -> ZccResult<Vec<FlatLine>> {
    let Some(Value::Object(extras)) = tree::get(tree, EXTENSION_PATH)? else {
        return Ok(Vec::new());
    };
    Ok(extras
        .iter()
        .filter(|(key, _)| !emitted.contains(&key.as_str()))
        .map(|(key, value)| FlatLine::Pair {
            key: key.clone(),
            value: flat_value(value),
        })
        .collect())
}

fn extension_path(key: &str) -> TreePath {
    TreePath::from_segments(vec![
        Segment::Key("zowe".to_owned()),
        Segment::Key("environments".to_owned()),
        Segment::Key(key.to_owned()),
    ])
}

fn quoted(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
}

/// Render a tree value as a flat string.
///
/// `null` renders empty; sequences join their rendered items with `,`;
/// objects render as compact JSON.
#[must_use]
pub fn flat_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(items) => items.iter().map(flat_value).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Render flat lines as the text of a legacy environment file.
///
/// Values the shell would split or expand are double-quoted with `"`, `\`,
/// `$` and backtick escaped.
#[must_use]
pub fn render_env(lines: &[FlatLine]) -> String {
    let mut out = String::new();
    for line in lines {
        match line {
            FlatLine::Separator => out.push('\n'),
            FlatLine::Comment(text) => {
                out.push_str(text);
                out.push('\n');
            }
            FlatLine::Pair { key, value } => {
                out.push_str(key);
                out.push('=');
                out.push_str(&shell_value(value));
                out.push('\n');
            }
        }
    }
    out
}

fn shell_value(value: &str) -> String {
    let is_plain = value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || "_-.,/:@%+=".contains(ch));
    if is_plain {
        return value.to_owned();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        if matches!(ch, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

/// Collect the `KEY=value` pairs of rendered lines into a namespace.
#[must_use]
pub fn pairs(lines: &[FlatLine]) -> FlatNamespace {
    lines
        .iter()
        .filter_map(|line| match line {
            FlatLine::Pair { key, value } => Some((key.clone(), value.clone())),
            FlatLine::Separator | FlatLine::Comment(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests;
