//! Deep-merge mechanics for configuration trees.

use serde_json::{Map, Value};

/// Overlay `layer` onto `target`, updating `target` in place.
///
/// Behaviour:
/// - Objects merge key by key, recursing into nested values.
/// - Arrays merge by index: element `i` of `layer` merges into element `i`
///   of `target`, and the shorter array is extended. Arrays are never
///   concatenated.
/// - Scalars, including `null`, replace the target.
/// - A container in `layer` replaces a target of a different shape.
///
/// # Examples
///
/// ```rust
/// use zcc_core::tree::deep_merge;
/// use serde_json::json;
///
/// let mut base = json!({"list": [{"a": 1}, {"b": 2}]});
/// deep_merge(&mut base, json!({"list": [{"c": 3}]}));
/// assert_eq!(base, json!({"list": [{"a": 1, "c": 3}, {"b": 2}]}));
/// ```
pub fn deep_merge(target: &mut Value, layer: Value) {
    match layer {
        Value::Object(map) => merge_object(target, map),
        Value::Array(items) => merge_array(target, items),
        _ => *target = layer,
    }
}

fn merge_object(target: &mut Value, map: Map<String, Value>) {
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let Some(target_map) = target.as_object_mut() else {
        return;
    };
    for (key, value) in map {
        match target_map.get_mut(&key) {
            Some(existing) => deep_merge(existing, value),
            None => {
                target_map.insert(key, value);
            }
        }
    }
}

fn merge_array(target: &mut Value, items: Vec<Value>) {
    let Some(existing) = target.as_array_mut() else {
        *target = Value::Array(items);
        return;
    };
    for (index, item) in items.into_iter().enumerate() {
        match existing.get_mut(index) {
            Some(slot) => deep_merge(slot, item),
            None => existing.push(item),
        }
    }
}

/// Fill gaps in `target` from `defaults` without overwriting anything.
///
/// Only object members missing from `target` are taken from `defaults`;
/// nested objects are filled recursively. Any value already present in
/// `target`, arrays and `null` included, is left exactly as it is.
///
/// # Examples
///
/// ```rust
/// use zcc_core::tree::merge_defaults;
/// use serde_json::json;
///
/// let mut user = json!({"port": 8888});
/// merge_defaults(&mut user, &json!({"port": 9999, "enabled": true}));
/// assert_eq!(user, json!({"port": 8888, "enabled": true}));
/// ```
pub fn merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_map), Some(default_map)) = (target.as_object_mut(), defaults.as_object())
    else {
        return;
    };
    for (key, default) in default_map {
        match target_map.get_mut(key) {
            Some(existing) => merge_defaults(existing, default),
            None => {
                target_map.insert(key.clone(), default.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, ensure};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn arrays_merge_by_index() -> Result<()> {
        let mut base = json!([{"a": 1}, {"b": 2}]);
        deep_merge(&mut base, json!([{"c": 3}]));
        ensure!(base == json!([{"a": 1, "c": 3}, {"b": 2}]), "got {base}");
        Ok(())
    }

    #[rstest]
    fn longer_layer_extends_array() -> Result<()> {
        let mut base = json!({"hosts": ["a.com"]});
        deep_merge(&mut base, json!({"hosts": ["b.com", "c.com"]}));
        ensure!(base == json!({"hosts": ["b.com", "c.com"]}), "got {base}");
        Ok(())
    }

    #[rstest]
    #[case(json!({"a": 1}), json!({"a": null}), json!({"a": null}))]
    #[case(json!({"a": {"b": 1}}), json!({"a": 5}), json!({"a": 5}))]
    #[case(json!({"a": 5}), json!({"a": {"b": 1}}), json!({"a": {"b": 1}}))]
    #[case(json!({"a": [1, 2]}), json!({"a": {"x": 1}}), json!({"a": {"x": 1}}))]
    fn layer_shape_wins_on_conflict(
        #[case] base: Value,
        #[case] layer: Value,
        #[case] expected: Value,
    ) -> Result<()> {
        let mut merged = base;
        deep_merge(&mut merged, layer);
        ensure!(merged == expected, "got {merged}");
        Ok(())
    }

    #[rstest]
    fn later_object_keys_append_in_order() -> Result<()> {
        let mut base = json!({"z": 1, "a": 2});
        deep_merge(&mut base, json!({"m": 3, "z": 4}));
        let keys: Vec<_> = base.as_object().map(|m| m.keys().cloned().collect()).unwrap_or_default();
        ensure!(keys == vec!["z", "a", "m"], "got {keys:?}");
        ensure!(base["z"] == json!(4));
        Ok(())
    }

    #[rstest]
    fn defaults_never_override() -> Result<()> {
        let mut tree = json!({"port": 8888, "list": [1], "debug": null});
        merge_defaults(
            &mut tree,
            &json!({"port": 9999, "list": [7, 8], "debug": true, "enabled": false}),
        );
        ensure!(
            tree == json!({"port": 8888, "list": [1], "debug": null, "enabled": false}),
            "got {tree}"
        );
        Ok(())
    }

    #[rstest]
    fn defaults_fill_nested_gaps() -> Result<()> {
        let mut tree = json!({"certificate": {"keystore": {"alias": "mine"}}});
        merge_defaults(
            &mut tree,
            &json!({"certificate": {"keystore": {"alias": "dflt", "type": "PKCS12"}}}),
        );
        ensure!(
            tree == json!({"certificate": {"keystore": {"alias": "mine", "type": "PKCS12"}}}),
            "got {tree}"
        );
        Ok(())
    }
}
