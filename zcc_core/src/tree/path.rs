//! Dot/bracket path expressions over a configuration tree.
//!
//! Paths use `.` between object keys and `[n]` for sequence indices, e.g.
//! `components.gateway.port` or `zowe.externalDomains[0]`. A bracket holding
//! anything other than digits is a literal key, which lets keys containing
//! dots be addressed as `zowe.environments[SOME.KEY]`.

use std::fmt;

use serde_json::{Map, Value};

use crate::ZccResult;
use crate::error::invalid_path;

/// One step of a [`TreePath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object member name.
    Key(String),
    /// Sequence position.
    Index(usize),
}

/// Parsed dot/bracket path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreePath {
    segments: Vec<Segment>,
}

impl TreePath {
    /// Parse a path expression.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ZccError::InvalidPath`] for empty segments, unterminated
    /// brackets, or text directly following a closing bracket.
    pub fn parse(raw: &str) -> ZccResult<Self> {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut after_bracket = false;
        let mut chars = raw.chars();
        while let Some(ch) = chars.next() {
            match ch {
                '.' => {
                    if current.is_empty() && !after_bracket {
                        return Err(invalid_path(raw, "empty key segment"));
                    }
                    if !current.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut current)));
                    }
                    after_bracket = false;
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut current)));
                    }
                    let mut token = String::new();
                    let mut closed = false;
                    for inner in chars.by_ref() {
                        if inner == ']' {
                            closed = true;
                            break;
                        }
                        token.push(inner);
                    }
                    if !closed {
                        return Err(invalid_path(raw, "unterminated '['"));
                    }
                    segments.push(bracket_segment(raw, &token)?);
                    after_bracket = true;
                }
                _ => {
                    if after_bracket {
                        return Err(invalid_path(raw, "expected '.' or '[' after ']'"));
                    }
                    current.push(ch);
                }
            }
        }
        if !current.is_empty() {
            segments.push(Segment::Key(current));
        } else if !after_bracket {
            return Err(invalid_path(raw, "empty key segment"));
        }
        Ok(Self { segments })
    }

    /// Build a path from pre-split segments.
    #[must_use]
    pub const fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Segments making up the path.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Path with one more segment appended.
    #[must_use]
    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// Look up the value at this path.
    #[must_use]
    pub fn get<'a>(&self, tree: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(tree, |node, segment| match (segment, node) {
                (Segment::Key(key), Value::Object(map)) => map.get(key),
                (Segment::Index(index), Value::Array(items)) => items.get(*index),
                (Segment::Index(index), Value::Object(map)) => map.get(&index.to_string()),
                _ => None,
            })
    }

    /// Mutable access to the value at this path, if present.
    pub fn get_mut<'a>(&self, tree: &'a mut Value) -> Option<&'a mut Value> {
        self.segments
            .iter()
            .try_fold(tree, |node, segment| match (segment, node) {
                (Segment::Key(key), Value::Object(map)) => map.get_mut(key),
                (Segment::Index(index), Value::Array(items)) => items.get_mut(*index),
                (Segment::Index(index), Value::Object(map)) => map.get_mut(&index.to_string()),
                _ => None,
            })
    }

    /// Whether a value (including `null`) is present at this path.
    #[must_use]
    pub fn has(&self, tree: &Value) -> bool {
        self.get(tree).is_some()
    }

    /// Write `value` at this path, creating intermediate containers.
    ///
    /// Missing or scalar intermediates become objects, or arrays when the next
    /// segment is an index. Writing past the end of an array pads it with
    /// `null`.
    pub fn set(&self, tree: &mut Value, value: Value) {
        let Some((last, parents)) = self.segments.split_last() else {
            *tree = value;
            return;
        };
        let mut node = tree;
        for segment in parents {
            match slot(node, segment) {
                Some(next) => node = next,
                None => return,
            }
        }
        if let Some(target) = slot(node, last) {
            *target = value;
        }
    }

    /// Remove and return the value at this path.
    pub fn remove(&self, tree: &mut Value) -> Option<Value> {
        let (last, parents) = self.segments.split_last()?;
        let mut node = tree;
        for segment in parents {
            node = match (segment, node) {
                (Segment::Key(key), Value::Object(map)) => map.get_mut(key)?,
                (Segment::Index(index), Value::Array(items)) => items.get_mut(*index)?,
                _ => return None,
            };
        }
        match (last, node) {
            (Segment::Key(key), Value::Object(map)) => map.shift_remove(key),
            (Segment::Index(index), Value::Array(items)) if *index < items.len() => {
                Some(items.remove(*index))
            }
            _ => None,
        }
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if key.contains(['.', '[', ']']) => write!(f, "[{key}]")?,
                Segment::Key(key) if position == 0 => f.write_str(key)?,
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

fn bracket_segment(raw: &str, token: &str) -> ZccResult<Segment> {
    let trimmed = token.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return trimmed
            .parse()
            .map(Segment::Index)
            .map_err(|_| invalid_path(raw, format!("index '{trimmed}' is out of range")));
    }
    let unquoted = trimmed
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .or_else(|| trimmed.strip_prefix('"').and_then(|t| t.strip_suffix('"')))
        .unwrap_or(trimmed);
    if unquoted.is_empty() {
        return Err(invalid_path(raw, "empty bracket segment"));
    }
    Ok(Segment::Key(unquoted.to_owned()))
}

fn slot<'a>(node: &'a mut Value, segment: &Segment) -> Option<&'a mut Value> {
    match segment {
        Segment::Key(key) => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            node.as_object_mut()
                .map(|map| map.entry(key.clone()).or_insert(Value::Null))
        }
        Segment::Index(index) => {
            if node.is_object() {
                return node
                    .as_object_mut()
                    .map(|map| map.entry(index.to_string()).or_insert(Value::Null));
            }
            if !node.is_array() {
                *node = Value::Array(Vec::new());
            }
            let items = node.as_array_mut()?;
            if items.len() <= *index {
                items.resize(*index + 1, Value::Null);
            }
            items.get_mut(*index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow, ensure};
    use rstest::rstest;
    use serde_json::json;

    fn key(name: &str) -> Segment {
        Segment::Key(name.to_owned())
    }

    #[rstest]
    #[case("a.b.c", vec![key("a"), key("b"), key("c")])]
    #[case("a.b[2]", vec![key("a"), key("b"), Segment::Index(2)])]
    #[case("zowe.environments[SOME.KEY]", vec![key("zowe"), key("environments"), key("SOME.KEY")])]
    #[case("list[0].name", vec![key("list"), Segment::Index(0), key("name")])]
    fn parses_dot_and_bracket_notation(
        #[case] raw: &str,
        #[case] expected: Vec<Segment>,
    ) -> Result<()> {
        let path = TreePath::parse(raw)?;
        ensure!(path.segments() == expected.as_slice(), "unexpected segments for {raw}");
        Ok(())
    }

    #[rstest]
    #[case("")]
    #[case("a..b")]
    #[case("a.")]
    #[case("a[1")]
    #[case("a[0]b")]
    #[case("a[]")]
    fn rejects_malformed_paths(#[case] raw: &str) {
        assert!(TreePath::parse(raw).is_err(), "{raw} should be rejected");
    }

    #[rstest]
    fn set_creates_intermediate_containers() -> Result<()> {
        let mut tree = json!({});
        TreePath::parse("zowe.externalDomains[1]")?.set(&mut tree, json!("b.com"));
        ensure!(tree == json!({"zowe": {"externalDomains": [null, "b.com"]}}));
        Ok(())
    }

    #[rstest]
    fn set_replaces_scalar_intermediates() -> Result<()> {
        let mut tree = json!({"components": {"gateway": true}});
        TreePath::parse("components.gateway.port")?.set(&mut tree, json!(7554));
        ensure!(tree == json!({"components": {"gateway": {"port": 7554}}}));
        Ok(())
    }

    #[rstest]
    fn remove_keeps_sibling_order() -> Result<()> {
        let mut tree = json!({"a": 1, "b": 2, "c": 3});
        let removed = TreePath::parse("b")?.remove(&mut tree);
        ensure!(removed == Some(json!(2)));
        let keys: Vec<_> = tree
            .as_object()
            .ok_or_else(|| anyhow!("tree should stay an object"))?
            .keys()
            .cloned()
            .collect();
        ensure!(keys == vec!["a", "c"], "order changed: {keys:?}");
        Ok(())
    }

    #[rstest]
    fn get_distinguishes_null_from_absent() -> Result<()> {
        let tree = json!({"a": null});
        ensure!(TreePath::parse("a")?.has(&tree));
        ensure!(!TreePath::parse("b")?.has(&tree));
        Ok(())
    }

    #[rstest]
    #[case("zowe.environments[SOME.KEY]")]
    #[case("a.b[2].c")]
    fn display_round_trips(#[case] raw: &str) -> Result<()> {
        let path = TreePath::parse(raw)?;
        ensure!(path.to_string() == raw, "rendered {path}");
        Ok(())
    }
}
