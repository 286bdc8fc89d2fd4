//! Relative component ports.
//!
//! A component port written as `"+N"` or `"-N"` is an offset from the port of
//! [`REFERENCE_COMPONENT`].

use serde_json::Value;

use crate::diagnostics::Context;

/// Component whose port anchors relative ports.
pub const REFERENCE_COMPONENT: &str = "gateway";

/// Parse a relative port: a string of `+` or `-` followed by ASCII digits.
///
/// ```
/// use serde_json::json;
/// use zcc_core::instance::parse_offset;
///
/// assert_eq!(parse_offset(&json!("-1000")), Some(-1000));
/// assert_eq!(parse_offset(&json!("+2")), Some(2));
/// assert_eq!(parse_offset(&json!("7554")), None);
/// assert_eq!(parse_offset(&json!(10)), None);
/// ```
#[must_use]
pub fn parse_offset(value: &Value) -> Option<i64> {
    let text = value.as_str()?;
    let digits = text.strip_prefix(['+', '-'])?;
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    let magnitude: i64 = digits.parse().ok()?;
    Some(if text.starts_with('-') { -magnitude } else { magnitude })
}

/// An absolute port: an integer, or a string of digits.
pub(crate) fn absolute_port(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) => {
            text.parse().ok()
        }
        _ => None,
    }
}

/// Apply `offset` to `reference`, rejecting results outside the port range.
pub(crate) fn offset_port(reference: i64, offset: i64) -> Option<i64> {
    reference
        .checked_add(offset)
        .filter(|port| (0..=i64::from(u16::MAX)).contains(port))
}

/// Replace relative component ports under `components` with absolute ones.
///
/// The reference is `components.gateway.port` of `tree` itself, so an
/// instance-level gateway override anchors that instance only. Unresolvable
/// offsets are left as written and reported as warnings.
pub fn resolve_port_offsets(tree: &mut Value, ctx: &Context) {
    let reference = tree
        .pointer(&format!("/components/{REFERENCE_COMPONENT}/port"))
        .and_then(absolute_port);
    let Some(Value::Object(components)) = tree.get_mut("components") else {
        return;
    };
    for (id, config) in components.iter_mut() {
        if id == REFERENCE_COMPONENT {
            continue;
        }
        let Some(port) = config.get_mut("port") else {
            continue;
        };
        let Some(offset) = parse_offset(port) else {
            continue;
        };
        if let Some(resolved) = reference.and_then(|base| offset_port(base, offset)) {
            *port = Value::from(resolved);
            continue;
        }
        ctx.warn(format!(
            "Cannot resolve relative port {port} of component {id}: \
             no usable {REFERENCE_COMPONENT} port"
        ));
    }
}
