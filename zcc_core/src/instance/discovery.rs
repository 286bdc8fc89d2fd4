//! Discovery endpoint derivation across the whole topology.

use serde_json::Value;

use super::INSTANCES_KEY;
use super::ports::{REFERENCE_COMPONENT, absolute_port, offset_port, parse_offset};
use crate::mapping::flat_value;
use crate::tree::is_enabled;

const DISCOVERY: &str = "discovery";
const DEFAULT_NAMESPACE: &str = "zowe";
const DEFAULT_CLUSTER_DOMAIN: &str = "cluster.local";

/// Upper bound on generated replica endpoints; larger counts are clamped.
pub const MAX_DISCOVERY_REPLICAS: u64 = 256;

/// Discovery endpoints for `original`, lower-cased and de-duplicated.
///
/// With `components.discovery.replicas` set to a positive integer, one
/// endpoint per replica, up to [`MAX_DISCOVERY_REPLICAS`], is generated from
/// the pod namespace and cluster domain. Otherwise every declared instance that enables discovery
/// contributes `https://{hostname}:{port}/eureka/`; without declared
/// instances the global configuration contributes one endpoint when
/// discovery is enabled.
///
/// ```
/// use serde_json::json;
/// use zcc_core::instance::discovery_list;
///
/// let tree = json!({
///     "components": {"discovery": {"enabled": true, "port": 1000}},
///     "haInstances": {"a": {"hostname": "A.com"}, "b": {"hostname": "b.com"}},
/// });
/// assert_eq!(
///     discovery_list(&tree),
///     ["https://a.com:1000/eureka/", "https://b.com:1000/eureka/"]
/// );
/// ```
#[must_use]
pub fn discovery_list(original: &Value) -> Vec<String> {
    let global = original.pointer("/components/discovery");
    if let Some(replicas) = global.and_then(|config| config.get("replicas")).and_then(replica_count) {
        return replica_endpoints(original, replicas);
    }

    let global_enabled = global
        .and_then(|config| config.get("enabled"))
        .is_some_and(is_enabled);
    let default_host = original
        .pointer("/zowe/externalDomains/0")
        .map(flat_value)
        .unwrap_or_default();

    let mut endpoints = Vec::new();
    if let Some(Value::Object(instances)) = original.get(INSTANCES_KEY) {
        for instance in instances.values() {
            let local = instance.pointer("/components/discovery");
            let enabled = local
                .and_then(|config| config.get("enabled"))
                .map_or(global_enabled, is_enabled);
            if !enabled {
                continue;
            }
            let hostname = instance
                .get("hostname")
                .map(flat_value)
                .filter(|host| !host.is_empty())
                .unwrap_or_else(|| default_host.clone());
            let port = local
                .and_then(|config| config.get("port"))
                .or_else(|| global.and_then(|config| config.get("port")));
            let reference = instance
                .pointer(&format!("/components/{REFERENCE_COMPONENT}/port"))
                .or_else(|| original.pointer(&format!("/components/{REFERENCE_COMPONENT}/port")));
            push_unique(&mut endpoints, endpoint(&hostname, &render_port(port, reference)));
        }
    } else if global_enabled {
        let port = global.and_then(|config| config.get("port"));
        let reference = original.pointer(&format!("/components/{REFERENCE_COMPONENT}/port"));
        push_unique(&mut endpoints, endpoint(&default_host, &render_port(port, reference)));
    }
    endpoints
}

/// Id of the last declared instance running `component`.
///
/// A per-instance `components.<component>.enabled` takes precedence over the
/// global flag. Without declared instances, `"_"` stands for the single
/// implicit instance when the component is enabled globally.
#[must_use]
pub fn enabled_anywhere(original: &Value, component: &str) -> Option<String> {
    let global_enabled = original
        .get("components")
        .and_then(|components| components.get(component))
        .and_then(|config| config.get("enabled"))
        .is_some_and(is_enabled);
    match original.get(INSTANCES_KEY) {
        Some(Value::Object(instances)) => instances
            .iter()
            .rev()
            .find(|(_, instance)| {
                instance
                    .get("components")
                    .and_then(|components| components.get(component))
                    .and_then(|config| config.get("enabled"))
                    .map_or(global_enabled, is_enabled)
            })
            .map(|(id, _)| id.clone()),
        _ => global_enabled.then(|| "_".to_owned()),
    }
}

fn replica_count(value: &Value) -> Option<u64> {
    let count = match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }?;
    (count > 0).then_some(count.min(MAX_DISCOVERY_REPLICAS))
}

fn replica_endpoints(original: &Value, replicas: u64) -> Vec<String> {
    let setting = |key: &str, default: &str| {
        original
            .pointer(&format!("/zowe/environments/{key}"))
            .map(flat_value)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| default.to_owned())
    };
    let namespace = setting("ZWE_POD_NAMESPACE", DEFAULT_NAMESPACE);
    let cluster = setting("ZWE_POD_CLUSTERNAME", DEFAULT_CLUSTER_DOMAIN);
    let port = render_port(
        original.pointer(&format!("/components/{DISCOVERY}/port")),
        original.pointer(&format!("/components/{REFERENCE_COMPONENT}/port")),
    );
    (0..replicas)
        .map(|index| {
            let host = format!("{DISCOVERY}-{index}.{DISCOVERY}-service.{namespace}.{cluster}");
            endpoint(&host, &port)
        })
        .collect()
}

/// Render a discovery port, resolving a relative port against `reference`.
fn render_port(port: Option<&Value>, reference: Option<&Value>) -> String {
    let Some(declared) = port else {
        return String::new();
    };
    parse_offset(declared)
        .and_then(|offset| offset_port(reference.and_then(absolute_port)?, offset))
        .map_or_else(|| flat_value(declared), |resolved| resolved.to_string())
}

fn endpoint(host: &str, port: &str) -> String {
    format!("https://{host}:{port}/eureka/").to_lowercase()
}

fn push_unique(endpoints: &mut Vec<String>, candidate: String) {
    if !endpoints.contains(&candidate) {
        endpoints.push(candidate);
    }
}
