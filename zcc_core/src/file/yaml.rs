//! YAML parsing and emission via `serde-saphyr`.
//!
//! Documents are read through `YamlNode` rather than straight into `Value`
//! so that plain `null`, `~` and empty scalars become JSON nulls and repeated
//! `@include` directives at one level are kept in encounter order. Any other
//! repeated key is an error.
//!
//! Scalars are written by `serde-saphyr`. A scalar that it would leave plain
//! but that reads back as a different value (for example the string `8080`)
//! is double-quoted instead.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Number, Value};
use serde_saphyr::{DuplicateKeyPolicy, Options};

use super::include::INCLUDE_KEY;

const INDENT: usize = 2;

/// Parse YAML text into a tree using strict YAML 1.2 booleans.
///
/// Documents without content (blank, comments only, or a bare `---`) parse
/// to an empty object.
pub(crate) fn parse_yaml(contents: &str) -> Result<Value, serde_saphyr::Error> {
    if !has_content(contents) {
        return Ok(Value::Object(Map::new()));
    }
    Ok(match parse_node(contents)? {
        Value::Null => Value::Object(Map::new()),
        other => other,
    })
}

fn parse_node(contents: &str) -> Result<Value, serde_saphyr::Error> {
    let node: YamlNode = serde_saphyr::from_str_with_options(
        contents,
        Options {
            strict_booleans: true,
            duplicate_keys: DuplicateKeyPolicy::LastWins,
            ..Options::default()
        },
    )?;
    Ok(node.0)
}

fn has_content(contents: &str) -> bool {
    contents.lines().any(|line| {
        let trimmed = line.trim();
        !(trimmed.is_empty() || trimmed.starts_with('#') || trimmed == "---" || trimmed == "...")
    })
}

/// A parsed YAML node in tree form.
struct YamlNode(Value);

impl<'de> Deserialize<'de> for YamlNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // The option entry point is the one that reports plain null forms as
        // `None`; `deserialize_any` hands them over as strings.
        deserializer.deserialize_option(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = YamlNode;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a YAML node")
    }

    fn visit_none<E: de::Error>(self) -> Result<YamlNode, E> {
        Ok(YamlNode(Value::Null))
    }

    fn visit_unit<E: de::Error>(self) -> Result<YamlNode, E> {
        Ok(YamlNode(Value::Null))
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<YamlNode, D::Error> {
        deserializer.deserialize_any(Self)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<YamlNode, E> {
        Ok(YamlNode(Value::Bool(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<YamlNode, E> {
        Ok(YamlNode(Value::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<YamlNode, E> {
        Ok(YamlNode(Value::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<YamlNode, E> {
        Ok(YamlNode(Number::from_f64(v).map_or(Value::Null, Value::Number)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<YamlNode, E> {
        Ok(YamlNode(Value::String(v.to_owned())))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<YamlNode, E> {
        Ok(YamlNode(Value::String(v)))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<YamlNode, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(YamlNode(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(YamlNode(Value::Array(items)))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<YamlNode, A::Error> {
        let mut map = Map::new();
        while let Some(key) = access.next_key::<String>()? {
            let YamlNode(value) = access.next_value()?;
            match map.get_mut(&key) {
                None => {
                    map.insert(key, value);
                }
                Some(existing) if key == INCLUDE_KEY => append_directive(existing, value),
                Some(_) => {
                    return Err(de::Error::custom(format!("duplicate mapping key: {key}")));
                }
            }
        }
        Ok(YamlNode(Value::Object(map)))
    }
}

/// Fold a repeated include directive into the list held by `existing`.
fn append_directive(existing: &mut Value, value: Value) {
    let mut references = match existing.take() {
        Value::Array(items) => items,
        single => vec![single],
    };
    match value {
        Value::Array(items) => references.extend(items),
        single => references.push(single),
    }
    *existing = Value::Array(references);
}

/// Render `value` as a block YAML document terminated by a newline.
pub(crate) fn emit_yaml(value: &Value) -> String {
    let mut out = String::new();
    if is_block(value) {
        write_block(value, 0, &mut out);
    } else {
        out.push_str(&inline_value(value));
        out.push('\n');
    }
    out
}

/// Whether `value` renders as an indented block rather than on one line.
pub(crate) fn is_block(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => false,
    }
}

fn write_block(value: &Value, indent: usize, out: &mut String) {
    let pad = " ".repeat(indent);
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                out.push_str(&pad);
                out.push_str(&scalar_string(key));
                out.push(':');
                if is_block(child) {
                    out.push('\n');
                    write_block(child, indent + INDENT, out);
                } else {
                    out.push(' ');
                    out.push_str(&inline_value(child));
                    out.push('\n');
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                out.push_str(&pad);
                out.push_str("- ");
                if is_block(item) {
                    let mut nested = String::new();
                    write_block(item, indent + INDENT, &mut nested);
                    let inner_pad = " ".repeat(indent + INDENT);
                    out.push_str(nested.strip_prefix(inner_pad.as_str()).unwrap_or(&nested));
                } else {
                    out.push_str(&inline_value(item));
                    out.push('\n');
                }
            }
        }
        _ => {
            out.push_str(&pad);
            out.push_str(&inline_value(value));
            out.push('\n');
        }
    }
}

/// Render a value on a single line: scalars as `serde-saphyr` writes them,
/// collections in flow style.
pub(crate) fn inline_value(value: &Value) -> String {
    match value {
        Value::String(text) => scalar_string(text),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(inline_value).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(key, child)| format!("{}: {}", scalar_string(key), inline_value(child)))
                .collect();
            if parts.is_empty() {
                "{}".to_owned()
            } else {
                format!("{{ {} }}", parts.join(", "))
            }
        }
        scalar => serde_saphyr::to_string(scalar)
            .map_or_else(|_| scalar.to_string(), |text| text.trim_end().to_owned()),
    }
}

/// Render a string scalar so that it reads back as the same string.
pub(crate) fn scalar_string(text: &str) -> String {
    serde_saphyr::to_string(&text)
        .ok()
        .map(|rendered| rendered.trim_end_matches('\n').to_owned())
        .filter(|rendered| !rendered.contains('\n') && reads_back_as(rendered, text))
        .unwrap_or_else(|| double_quoted(text))
}

fn reads_back_as(rendered: &str, text: &str) -> bool {
    parse_node(&format!("value: {rendered}\n"))
        .is_ok_and(|node| node.get("value").and_then(Value::as_str) == Some(text))
}

fn double_quoted(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{text}\""))
}
