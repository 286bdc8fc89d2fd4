//! Format-preserving point edits on YAML documents.
//!
//! [`YamlDocument`] keeps the raw lines of a file and rewrites only the span
//! an edit touches, so comments, key order and unrelated formatting survive
//! `update`, `delete` and `update-all`. Every edit is checked by re-parsing
//! the whole document; a rejected edit leaves the document as it was.

mod lines;

use std::fmt;

use camino::Utf8Path;
use serde_json::Value;

use crate::error::edit_error;
use crate::file::{
    emit_yaml, inline_value, is_block, parse_yaml, read_text, scalar_string, write_text,
};
use crate::tree::{self, Segment, TreePath};
use crate::{Context, FlatNamespace, ZccResult, mapping};
use lines::{ItemStart, dash_at, indent_of, is_content, key_at, split_comment};

const INDENT: usize = 2;
const DOCUMENT: &str = "<document>";

/// Lines `[start, end)` holding the children of one mapping or sequence.
#[derive(Debug, Clone, Copy)]
struct Block {
    start: usize,
    end: usize,
    /// Column of the keys or dashes; for an empty block, where new children go.
    col: usize,
    empty: bool,
}

/// A `key:` line plus everything nested under it.
#[derive(Debug, Clone, Copy)]
struct Entry {
    line: usize,
    end: usize,
    col: usize,
    value_start: usize,
    inline: bool,
}

#[derive(Debug, Clone, Copy)]
struct Item {
    line: usize,
    end: usize,
    start: ItemStart,
}

/// A YAML document held as its original lines.
///
/// ```
/// use zcc_core::editor::YamlDocument;
///
/// let mut doc = YamlDocument::parse("zowe:\n  # edge port\n  externalPort: 7554\n")?;
/// doc.set("zowe.externalPort", serde_json::json!(8554))?;
/// assert_eq!(doc.to_string(), "zowe:\n  # edge port\n  externalPort: 8554\n");
/// # Ok::<(), std::sync::Arc<zcc_core::ZccError>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YamlDocument {
    lines: Vec<String>,
    trailing_newline: bool,
}

impl YamlDocument {
    /// Keep the lines of `text` after checking that it parses.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ZccError::Edit`] when `text` is not valid YAML.
    pub fn parse(text: &str) -> ZccResult<Self> {
        parse_yaml(text).map_err(|err| edit_error(DOCUMENT, err.to_string()))?;
        Ok(Self {
            lines: text.lines().map(str::to_owned).collect(),
            trailing_newline: text.is_empty() || text.ends_with('\n'),
        })
    }

    /// Read and parse the YAML file at `path`.
    ///
    /// # Errors
    ///
    /// Propagates read failures and rejects invalid YAML.
    pub fn load(path: &Utf8Path) -> ZccResult<Self> {
        Self::parse(&read_text(path)?)
    }

    /// Parsed view of the current text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ZccError::Edit`] if the text no longer parses.
    pub fn tree(&self) -> ZccResult<Value> {
        parse_yaml(&self.to_string()).map_err(|err| edit_error(DOCUMENT, err.to_string()))
    }

    /// Write `value` at the dot/bracket `path`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ZccError::InvalidPath`] for a malformed path and
    /// [`crate::ZccError::Edit`] when the edit cannot be applied.
    pub fn set(&mut self, path: &str, value: Value) -> ZccResult<()> {
        self.set_at(&TreePath::parse(path)?, value)
    }

    /// Write `value` at `target`.
    ///
    /// The strings `"true"` and `"false"` are written as booleans. Missing
    /// keys are appended to their parent block and missing parents created.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ZccError::Edit`] when the path crosses a node of the
    /// wrong kind, indexes past the end of a sequence, or the result does not
    /// read back as `value`.
    pub fn set_at(&mut self, target: &TreePath, value: Value) -> ZccResult<()> {
        let path = target.to_string();
        let coerced = coerce(value);
        let saved = self.lines.clone();
        let root = self.root();
        let outcome = self
            .set_in(root, target.segments(), &coerced, &path)
            .and_then(|()| self.confirm(&path, |tree| target.get(tree) == Some(&coerced)));
        if outcome.is_err() {
            self.lines = saved;
        }
        outcome
    }

    /// Remove the entry at `path` with everything nested under it.
    ///
    /// Returns whether anything was removed; a missing path is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ZccError::InvalidPath`] for a malformed path and
    /// [`crate::ZccError::Edit`] if the removal leaves invalid YAML.
    pub fn unset(&mut self, path: &str) -> ZccResult<bool> {
        let target = TreePath::parse(path)?;
        let saved = self.lines.clone();
        let root = self.root();
        let outcome = self
            .unset_in(root, target.segments(), path)
            .and_then(|removed| self.confirm(path, |_| true).map(|()| removed));
        if outcome.is_err() {
            self.lines = saved;
        }
        outcome
    }

    fn confirm(&self, path: &str, check: impl FnOnce(&Value) -> bool) -> ZccResult<()> {
        let tree = parse_yaml(&self.to_string())
            .map_err(|err| edit_error(path, format!("edit produces invalid YAML: {err}")))?;
        if check(&tree) {
            Ok(())
        } else {
            Err(edit_error(path, "edit does not read back as the requested value"))
        }
    }

    fn line(&self, index: usize) -> &str {
        self.lines.get(index).map_or("", String::as_str)
    }

    fn root(&self) -> Block {
        self.block(0, self.lines.len(), 0)
    }

    fn block(&self, start: usize, end: usize, fallback: usize) -> Block {
        (start..end)
            .find(|&index| is_content(self.line(index)))
            .map_or(
                Block {
                    start,
                    end,
                    col: fallback,
                    empty: true,
                },
                |first| Block {
                    start,
                    end,
                    col: indent_of(self.line(first)),
                    empty: false,
                },
            )
    }

    fn is_sequence(&self, block: Block) -> bool {
        !block.empty
            && (block.start..block.end)
                .find(|&index| is_content(self.line(index)))
                .is_some_and(|first| {
                    let line = self.line(first);
                    key_at(line, block.col).is_none() && dash_at(line, block.col).is_some()
                })
    }

    /// Drop trailing blank and comment lines from `[floor, end)`.
    fn trim_back(&self, floor: usize, end: usize) -> usize {
        let mut last = end;
        while last > floor && !is_content(self.line(last - 1)) {
            last -= 1;
        }
        last
    }

    fn insertion_point(&self, block: Block) -> usize {
        if block.empty {
            block.end
        } else {
            self.trim_back(block.start, block.end)
        }
    }

    fn find_entry(&self, block: Block, key: &str) -> Option<Entry> {
        (block.start..block.end).find_map(|index| {
            let found = key_at(self.line(index), block.col).filter(|found| found.key == key)?;
            Some(self.entry(index, found.value_start, block))
        })
    }

    fn entry(&self, index: usize, value_start: usize, block: Block) -> Entry {
        let (value, _) = split_comment(self.line(index).get(value_start..).unwrap_or(""));
        let inline = !value.is_empty();
        let col = block.col;
        let end = (index + 1..block.end)
            .find(|&next| {
                let text = self.line(next);
                is_content(text) && ends_entry(text, col, inline)
            })
            .unwrap_or(block.end);
        Entry {
            line: index,
            end: self.trim_back(index + 1, end),
            col,
            value_start,
            inline,
        }
    }

    fn items(&self, block: Block) -> Vec<Item> {
        let starts: Vec<(usize, ItemStart)> = (block.start..block.end)
            .filter(|&index| indent_of(self.line(index)) == block.col)
            .filter_map(|index| dash_at(self.line(index), block.col).map(|start| (index, start)))
            .collect();
        starts
            .iter()
            .enumerate()
            .map(|(position, &(line, start))| {
                let next = starts
                    .get(position + 1)
                    .map_or(block.end, |&(following, _)| following);
                Item {
                    line,
                    end: self.trim_back(line + 1, next),
                    start,
                }
            })
            .collect()
    }

    /// Trimmed inline text starting at byte `from` of `line`, and whether it
    /// is a flow collection.
    fn inline_text(&self, line: usize, from: usize) -> (String, bool) {
        let (text, _) = split_comment(self.line(line).get(from..).unwrap_or(""));
        (text.to_owned(), text.starts_with(['[', '{']))
    }

    fn set_in(
        &mut self,
        block: Block,
        segments: &[Segment],
        value: &Value,
        path: &str,
    ) -> ZccResult<()> {
        let Some((first, rest)) = segments.split_first() else {
            return Err(edit_error(path, "empty path"));
        };
        match first {
            Segment::Key(key) => self.set_key(block, key, rest, value, path),
            Segment::Index(index) => self.set_index(block, *index, rest, value, path),
        }
    }

    fn set_key(
        &mut self,
        block: Block,
        key: &str,
        rest: &[Segment],
        value: &Value,
        path: &str,
    ) -> ZccResult<()> {
        if self.is_sequence(block) {
            return Err(edit_error(path, format!("'{key}' is not a sequence index")));
        }
        let Some(entry) = self.find_entry(block, key) else {
            self.insert_entry(block, key, &build(rest, value));
            return Ok(());
        };
        if rest.is_empty() {
            self.replace_entry(entry, value, false);
            return Ok(());
        }
        if entry.inline {
            let (text, flow) = self.inline_text(entry.line, entry.value_start);
            let updated = nested_update(&text, rest, value, path)?;
            self.replace_entry(entry, &updated, flow);
            return Ok(());
        }
        let child = self.block(entry.line + 1, entry.end, entry.col + INDENT);
        self.set_in(child, rest, value, path)
    }

    fn set_index(
        &mut self,
        block: Block,
        index: usize,
        rest: &[Segment],
        value: &Value,
        path: &str,
    ) -> ZccResult<()> {
        if !block.empty && !self.is_sequence(block) {
            return Err(edit_error(path, format!("[{index}] indexes a mapping")));
        }
        let items = self.items(block);
        if let Some(item) = items.get(index) {
            return self.set_item(block, *item, rest, value, path);
        }
        if index == items.len() {
            self.insert_item(block, &build(rest, value));
            return Ok(());
        }
        Err(edit_error(
            path,
            format!("index {index} is past the end of a sequence of {} items", items.len()),
        ))
    }

    fn set_item(
        &mut self,
        block: Block,
        item: Item,
        rest: &[Segment],
        value: &Value,
        path: &str,
    ) -> ZccResult<()> {
        if rest.is_empty() {
            self.replace_item(block, item, value, false);
            return Ok(());
        }
        match item.start {
            ItemStart::Inline(content) if key_at(self.line(item.line), content).is_some() => {
                let inner = Block {
                    start: item.line,
                    end: item.end,
                    col: content,
                    empty: false,
                };
                self.set_in(inner, rest, value, path)
            }
            ItemStart::Inline(content) => {
                let (text, flow) = self.inline_text(item.line, content);
                let updated = nested_update(&text, rest, value, path)?;
                self.replace_item(block, item, &updated, flow);
                Ok(())
            }
            ItemStart::Nested => {
                let inner = self.block(item.line + 1, item.end, block.col + INDENT);
                self.set_in(inner, rest, value, path)
            }
        }
    }

    fn replace_entry(&mut self, entry: Entry, value: &Value, flow: bool) {
        let line = self.line(entry.line);
        let head = line.get(..entry.value_start).unwrap_or(line);
        let (_, comment) = split_comment(line.get(entry.value_start..).unwrap_or(""));
        let replacement = render_entry(head, comment, value, entry.col + INDENT, flow);
        self.lines.splice(entry.line..entry.end, replacement);
    }

    fn insert_entry(&mut self, block: Block, key: &str, value: &Value) {
        let head = format!("{}{}:", " ".repeat(block.col), scalar_string(key));
        let added = render_entry(&head, "", value, block.col + INDENT, false);
        let at = self.insertion_point(block);
        self.lines.splice(at..at, added);
    }

    fn replace_item(&mut self, block: Block, item: Item, value: &Value, flow: bool) {
        let line = self.line(item.line);
        let dash_end = block.col + 1;
        let dash = line.get(..dash_end).unwrap_or(line);
        let (_, comment) = split_comment(line.get(dash_end..).unwrap_or(""));
        let replacement = render_item(dash, comment, value, block.col + INDENT, flow);
        self.lines.splice(item.line..item.end, replacement);
    }

    fn insert_item(&mut self, block: Block, value: &Value) {
        let dash = format!("{}-", " ".repeat(block.col));
        let added = render_item(&dash, "", value, block.col + INDENT, false);
        let at = self.insertion_point(block);
        self.lines.splice(at..at, added);
    }

    fn unset_in(&mut self, block: Block, segments: &[Segment], path: &str) -> ZccResult<bool> {
        let Some((first, rest)) = segments.split_first() else {
            return Ok(false);
        };
        match first {
            Segment::Key(key) => self.unset_key(block, key, rest, path),
            Segment::Index(index) => self.unset_index(block, *index, rest, path),
        }
    }

    fn unset_key(
        &mut self,
        block: Block,
        key: &str,
        rest: &[Segment],
        path: &str,
    ) -> ZccResult<bool> {
        if self.is_sequence(block) {
            return Ok(false);
        }
        let Some(entry) = self.find_entry(block, key) else {
            return Ok(false);
        };
        if rest.is_empty() {
            self.remove_entry(block, entry);
            return Ok(true);
        }
        if entry.inline {
            let (text, flow) = self.inline_text(entry.line, entry.value_start);
            let Some(updated) = nested_removal(&text, rest, path)? else {
                return Ok(false);
            };
            self.replace_entry(entry, &updated, flow);
            return Ok(true);
        }
        let child = self.block(entry.line + 1, entry.end, entry.col + INDENT);
        self.unset_in(child, rest, path)
    }

    fn unset_index(
        &mut self,
        block: Block,
        index: usize,
        rest: &[Segment],
        path: &str,
    ) -> ZccResult<bool> {
        if !self.is_sequence(block) {
            return Ok(false);
        }
        let Some(item) = self.items(block).get(index).copied() else {
            return Ok(false);
        };
        if rest.is_empty() {
            self.lines.drain(item.line..item.end);
            return Ok(true);
        }
        match item.start {
            ItemStart::Inline(content) if key_at(self.line(item.line), content).is_some() => {
                let inner = Block {
                    start: item.line,
                    end: item.end,
                    col: content,
                    empty: false,
                };
                self.unset_in(inner, rest, path)
            }
            ItemStart::Inline(content) => {
                let (text, flow) = self.inline_text(item.line, content);
                let Some(updated) = nested_removal(&text, rest, path)? else {
                    return Ok(false);
                };
                self.replace_item(block, item, &updated, flow);
                Ok(true)
            }
            ItemStart::Nested => {
                let inner = self.block(item.line + 1, item.end, block.col + INDENT);
                self.unset_in(inner, rest, path)
            }
        }
    }

    /// Remove an entry. A key sharing its line with a sequence dash hands the
    /// dash to the next key of the same item, or leaves an empty mapping.
    fn remove_entry(&mut self, block: Block, entry: Entry) {
        let line = self.line(entry.line);
        let prefix = line.get(..entry.col).unwrap_or("");
        if !prefix.contains('-') {
            self.lines.drain(entry.line..entry.end);
            return;
        }
        let sibling = (entry.end..block.end)
            .find(|&index| is_content(self.line(index)))
            .filter(|&index| key_at(self.line(index), entry.col).is_some());
        let Some(next) = sibling else {
            let emptied = format!("{} {{}}", prefix.trim_end());
            self.lines.splice(entry.line..entry.end, [emptied]);
            return;
        };
        let moved = format!("{prefix}{}", self.line(next).get(entry.col..).unwrap_or(""));
        self.lines.splice(entry.line..=next, [moved]);
    }
}

impl fmt::Display for YamlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("\n"))?;
        if self.trailing_newline && !self.lines.is_empty() {
            f.write_str("\n")?;
        }
        Ok(())
    }
}

fn ends_entry(line: &str, col: usize, inline: bool) -> bool {
    let indent = indent_of(line);
    indent < col || (indent == col && (inline || dash_at(line, col).is_none()))
}

fn coerce(value: Value) -> Value {
    match value {
        Value::String(text) if text == "true" => Value::Bool(true),
        Value::String(text) if text == "false" => Value::Bool(false),
        other => other,
    }
}

/// The value to insert for a missing key: `value` wrapped in whatever
/// containers the remaining segments name.
fn build(rest: &[Segment], value: &Value) -> Value {
    let mut node = Value::Null;
    TreePath::from_segments(rest.to_vec()).set(&mut node, value.clone());
    node
}

fn nested_update(text: &str, rest: &[Segment], value: &Value, path: &str) -> ZccResult<Value> {
    let mut current = parse_yaml(text).map_err(|err| edit_error(path, err.to_string()))?;
    TreePath::from_segments(rest.to_vec()).set(&mut current, value.clone());
    Ok(current)
}

fn nested_removal(text: &str, rest: &[Segment], path: &str) -> ZccResult<Option<Value>> {
    let mut current = parse_yaml(text).map_err(|err| edit_error(path, err.to_string()))?;
    Ok(TreePath::from_segments(rest.to_vec())
        .remove(&mut current)
        .map(|_| current))
}

fn indented(value: &Value, indent: usize) -> Vec<String> {
    let pad = " ".repeat(indent);
    emit_yaml(value)
        .lines()
        .map(|line| format!("{pad}{line}"))
        .collect()
}

fn render_entry(
    head: &str,
    comment: &str,
    value: &Value,
    child_indent: usize,
    flow: bool,
) -> Vec<String> {
    if flow || !is_block(value) {
        return vec![format!("{head} {}{comment}", inline_value(value))];
    }
    let mut out = vec![format!("{head}{comment}")];
    out.extend(indented(value, child_indent));
    out
}

fn render_item(
    dash: &str,
    comment: &str,
    value: &Value,
    child_indent: usize,
    flow: bool,
) -> Vec<String> {
    if flow || !is_block(value) {
        return vec![format!("{dash} {}{comment}", inline_value(value))];
    }
    let pad = " ".repeat(child_indent);
    let mut out = indented(value, child_indent);
    if let Some(first) = out.first_mut() {
        let content = first
            .strip_prefix(pad.as_str())
            .unwrap_or(first.as_str())
            .to_owned();
        *first = format!("{dash} {content}{comment}");
    }
    out
}

/// Set `path` to `value` in the YAML file at `file`, keeping its layout.
///
/// # Errors
///
/// Propagates read, edit and write failures.
pub fn update_file(file: &Utf8Path, path: &str, value: Value) -> ZccResult<()> {
    let mut document = YamlDocument::load(file)?;
    document.set(path, value)?;
    write_text(file, &document.to_string())
}

/// Remove `path` from the YAML file at `file`. The file is only rewritten
/// when something was removed.
///
/// # Errors
///
/// Propagates read, edit and write failures.
pub fn delete_file(file: &Utf8Path, path: &str) -> ZccResult<bool> {
    let mut document = YamlDocument::load(file)?;
    let removed = document.unset(path)?;
    if removed {
        write_text(file, &document.to_string())?;
    }
    Ok(removed)
}

/// Map `flat` into a tree and apply each of its leaves to the YAML file at
/// `file` as a point edit. Returns the number of edits.
///
/// # Errors
///
/// Propagates mapping, read, edit and write failures. Nothing is written if
/// any edit fails.
pub fn update_file_from_flat(flat: &FlatNamespace, file: &Utf8Path, ctx: &Context) -> ZccResult<usize> {
    let updates = mapping::to_tree(flat, ctx)?;
    let mut document = YamlDocument::load(file)?;
    let edits = tree::leaves(&updates);
    for (target, value) in &edits {
        ctx.note(format!("Updating {target} in {file}"));
        document.set_at(target, value.clone())?;
    }
    write_text(file, &document.to_string())?;
    Ok(edits.len())
}
