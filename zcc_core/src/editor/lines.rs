//! Line-level scanning of block YAML.
//!
//! Columns and offsets are byte positions. Indentation is spaces only, which
//! is all block YAML allows.

/// Leading spaces of `line`.
pub(super) fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Whether `line` carries document content (not blank, a comment, or a
/// document marker).
pub(super) fn is_content(line: &str) -> bool {
    let trimmed = line.trim();
    !(trimmed.is_empty() || trimmed.starts_with('#') || trimmed == "---" || trimmed == "...")
}

/// A `key:` found at a given column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct KeyLine {
    pub key: String,
    /// Offset just past the `:` separator.
    pub value_start: usize,
}

/// What follows the dash of a sequence item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ItemStart {
    /// Content begins on the dash line at this column.
    Inline(usize),
    /// Content, if any, is on the following lines.
    Nested,
}

/// Text of `line` from `col`, provided everything before it is indentation
/// or sequence dashes.
fn aligned(line: &str, col: usize) -> Option<&str> {
    let prefix = line.get(..col)?;
    let only_indent = prefix.chars().all(|ch| ch == ' ' || ch == '-');
    if !only_indent || (col > 0 && !prefix.ends_with(' ')) {
        return None;
    }
    line.get(col..)
}

/// Parse a mapping key starting exactly at `col`.
pub(super) fn key_at(line: &str, col: usize) -> Option<KeyLine> {
    let text = aligned(line, col)?;
    if text.starts_with([' ', '#']) || text == "-" || text.starts_with("- ") {
        return None;
    }
    let (end, key) = parse_key(text)?;
    let after = text.get(end..)?.strip_prefix(':')?;
    if !(after.is_empty() || after.starts_with([' ', '\t'])) {
        return None;
    }
    Some(KeyLine {
        key,
        value_start: col + end + 1,
    })
}

/// Recognise a sequence dash exactly at `col`.
pub(super) fn dash_at(line: &str, col: usize) -> Option<ItemStart> {
    let rest = aligned(line, col)?.strip_prefix('-')?;
    if !(rest.is_empty() || rest.starts_with(' ')) {
        return None;
    }
    let content = rest.trim_start_matches(' ');
    if content.is_empty() || content.starts_with('#') {
        return Some(ItemStart::Nested);
    }
    Some(ItemStart::Inline(line.len() - content.len()))
}

/// Split the text after a `key:` or `- ` into its value and trailing comment.
///
/// The value is trimmed; the comment keeps its leading whitespace so it can
/// be re-attached unchanged.
pub(super) fn split_comment(text: &str) -> (&str, &str) {
    let mut quote: Option<char> = None;
    let mut previous: Option<char> = None;
    for (index, ch) in text.char_indices() {
        if let Some(open) = quote {
            if ch == open && !(open == '"' && previous == Some('\\')) {
                quote = None;
            }
        } else if (ch == '"' || ch == '\'') && previous.is_none_or(opens_token) {
            quote = Some(ch);
        } else if ch == '#' && previous.is_none_or(char::is_whitespace) {
            let value = text.get(..index).unwrap_or(text).trim_end();
            return (value.trim_start(), text.get(value.len()..).unwrap_or(""));
        }
        previous = Some(ch);
    }
    (text.trim(), "")
}

fn opens_token(ch: char) -> bool {
    ch.is_whitespace() || "[{,:".contains(ch)
}

/// Key text and the offset of the `:` that follows it.
fn parse_key(text: &str) -> Option<(usize, String)> {
    if let Some(body) = text.strip_prefix('"') {
        let close = closing_double(body)?;
        let raw = text.get(..close + 2)?;
        let key: String = serde_json::from_str(raw).ok()?;
        return Some((close + 2, key));
    }
    if let Some(body) = text.strip_prefix('\'') {
        let close = closing_single(body)?;
        let key = body.get(..close)?.replace("''", "'");
        return Some((close + 2, key));
    }
    let end = plain_key_end(text)?;
    let key = text.get(..end)?.trim_end();
    if key.is_empty() || key.starts_with(['[', '{', '&', '*', '!', '|', '>']) {
        return None;
    }
    Some((end, key.to_owned()))
}

fn plain_key_end(text: &str) -> Option<usize> {
    let mut previous: Option<char> = None;
    for (index, ch) in text.char_indices() {
        if ch == '#' && previous.is_some_and(char::is_whitespace) {
            return None;
        }
        if ch == ':' {
            let next = text.get(index + 1..)?.chars().next();
            if next.is_none_or(|after| after == ' ' || after == '\t') {
                return Some(index);
            }
        }
        previous = Some(ch);
    }
    None
}

fn closing_double(body: &str) -> Option<usize> {
    let mut escaped = false;
    for (index, ch) in body.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(index),
            _ => {}
        }
    }
    None
}

fn closing_single(body: &str) -> Option<usize> {
    let mut chars = body.char_indices().peekable();
    while let Some((index, ch)) = chars.next() {
        if ch != '\'' {
            continue;
        }
        if chars.peek().is_some_and(|(_, next)| *next == '\'') {
            chars.next();
            continue;
        }
        return Some(index);
    }
    None
}
