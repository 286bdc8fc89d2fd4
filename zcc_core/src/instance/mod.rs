//! Per-instance resolution of the composed configuration.
//!
//! A deployment document may declare high-availability instances under
//! [`INSTANCES_KEY`]. Resolving an instance merges its overrides onto the
//! base tree, injects its identity under `haInstance`, resolves relative
//! component ports and extracts one effective view per component.

mod discovery;
mod ports;

use serde_json::{Map, Value};

use crate::diagnostics::Context;
use crate::error::precondition;
use crate::tree::deep_merge;
use crate::ZccResult;

pub use discovery::{MAX_DISCOVERY_REPLICAS, discovery_list, enabled_anywhere};
pub use ports::{REFERENCE_COMPONENT, parse_offset, resolve_port_offsets};

static NULL: Value = Value::Null;

/// Instance id used when none is declared or requested.
pub const DEFAULT_INSTANCE_ID: &str = "default";

/// Top-level key holding per-instance overrides.
pub const INSTANCES_KEY: &str = "haInstances";

/// Key receiving the injected identity of the resolved instance.
pub const IDENTITY_KEY: &str = "haInstance";

/// Override keys that describe the instance rather than configure it.
pub const IDENTITY_FIELDS: &[&str] = &["hostname", "ip", "id"];

/// Configuration seen by one component of one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveComponentConfig {
    /// Component identifier.
    pub component_id: String,
    /// Instance the view was resolved for.
    pub instance_id: String,
    /// Full instance tree with the component subtree copied to `configs`.
    pub tree: Value,
}

impl EffectiveComponentConfig {
    /// The component's own subtree.
    #[must_use]
    pub fn configs(&self) -> &Value {
        self.tree.get("configs").unwrap_or(&NULL)
    }
}

/// Result of resolving one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInstance {
    /// Requested instance id.
    pub instance_id: String,
    /// Instance tree: overrides merged, identity injected, ports resolved.
    pub tree: Value,
    /// Discovery endpoints derived from the whole topology.
    pub discovery: Vec<String>,
    /// One view per component object under `components`.
    pub components: Vec<EffectiveComponentConfig>,
}

/// Instance ids declared under [`INSTANCES_KEY`], in document order.
///
/// Returns `["default"]` when none are declared.
#[must_use]
pub fn instance_ids(base: &Value) -> Vec<String> {
    let declared: Vec<String> = base
        .get(INSTANCES_KEY)
        .and_then(Value::as_object)
        .map(|instances| instances.keys().cloned().collect())
        .unwrap_or_default();
    if declared.is_empty() {
        vec![DEFAULT_INSTANCE_ID.to_owned()]
    } else {
        declared
    }
}

/// Resolve `instance_id` against the composed `base` tree.
///
/// # Errors
///
/// Returns [`crate::ZccError::PreconditionMissing`] when `instance_id` is
/// empty.
pub fn resolve_instance(base: &Value, instance_id: &str, ctx: &Context) -> ZccResult<ResolvedInstance> {
    if instance_id.is_empty() {
        return Err(precondition("HA instance id is required"));
    }
    let overrides = base
        .get(INSTANCES_KEY)
        .and_then(|instances| instances.get(instance_id))
        .and_then(Value::as_object);
    if overrides.is_none() && instance_id != DEFAULT_INSTANCE_ID {
        ctx.note(format!(
            "HA instance {instance_id} is not declared; using the base configuration"
        ));
    }

    let mut tree = base.clone();
    if let Some(fields) = overrides {
        let layer: Map<String, Value> = fields
            .iter()
            .filter(|(key, _)| !IDENTITY_FIELDS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        deep_merge(&mut tree, Value::Object(layer));
    }
    let injected = identity(base, &tree, overrides, instance_id);
    if let Value::Object(root) = &mut tree {
        root.shift_remove(INSTANCES_KEY);
        root.insert(IDENTITY_KEY.to_owned(), injected);
    }

    resolve_port_offsets(&mut tree, ctx);
    let components = extract_components(&tree, instance_id);
    Ok(ResolvedInstance {
        instance_id: instance_id.to_owned(),
        discovery: discovery_list(base),
        tree,
        components,
    })
}

fn non_empty(value: Option<&Value>) -> Option<&Value> {
    value.filter(|candidate| !candidate.is_null() && candidate.as_str() != Some(""))
}

fn identity(
    base: &Value,
    tree: &Value,
    overrides: Option<&Map<String, Value>>,
    instance_id: &str,
) -> Value {
    let hostname = non_empty(overrides.and_then(|fields| fields.get("hostname")))
        .or_else(|| non_empty(base.pointer("/zowe/externalDomains/0")))
        .cloned()
        .unwrap_or_else(|| Value::from(""));
    let ip = non_empty(overrides.and_then(|fields| fields.get("ip")))
        .or_else(|| non_empty(tree.pointer("/zowe/environments/ZOWE_IP_ADDRESS")))
        .cloned()
        .unwrap_or_else(|| Value::from(""));
    let mut identity = Map::new();
    identity.insert("id".to_owned(), Value::from(instance_id));
    identity.insert("hostname".to_owned(), hostname);
    identity.insert("ip".to_owned(), ip);
    Value::Object(identity)
}

fn extract_components(tree: &Value, instance_id: &str) -> Vec<EffectiveComponentConfig> {
    let Some(Value::Object(components)) = tree.get("components") else {
        return Vec::new();
    };
    components
        .iter()
        .filter(|(_, subtree)| subtree.is_object())
        .map(|(component_id, subtree)| {
            let mut view = tree.clone();
            if let Value::Object(root) = &mut view {
                root.insert("configs".to_owned(), subtree.clone());
            }
            EffectiveComponentConfig {
                component_id: component_id.clone(),
                instance_id: instance_id.to_owned(),
                tree: view,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests;
