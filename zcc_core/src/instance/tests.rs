//! Tests for instance resolution, discovery derivation and port offsets.

use super::*;
use anyhow::{Result, ensure};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn topology() -> Value {
    json!({
        "zowe": {
            "externalDomains": ["zos.example.com"],
            "externalPort": 7554,
            "environments": {"ZOWE_IP_ADDRESS": "10.0.0.1"}
        },
        "components": {
            "gateway": {"enabled": true, "port": 7554},
            "discovery": {"enabled": true, "port": 7553},
            "api-catalog": {"enabled": true, "port": "-2"}
        },
        "haInstances": {
            "lpar1": {"hostname": "lpar1.example.com", "ip": "10.0.0.11"},
            "lpar2": {
                "hostname": "lpar2.example.com",
                "components": {
                    "gateway": {"port": 8888},
                    "discovery": {"enabled": false}
                }
            }
        }
    })
}

#[rstest]
fn identity_comes_from_override(topology: Value) -> Result<()> {
    let resolved = resolve_instance(&topology, "lpar1", &Context::default())?;
    ensure!(
        resolved.tree.get(IDENTITY_KEY)
            == Some(&json!({"id": "lpar1", "hostname": "lpar1.example.com", "ip": "10.0.0.11"})),
        "got {:?}",
        resolved.tree.get(IDENTITY_KEY)
    );
    ensure!(resolved.tree.get(INSTANCES_KEY).is_none());
    Ok(())
}

#[rstest]
fn identity_falls_back_to_domain_and_environment(topology: Value) -> Result<()> {
    let resolved = resolve_instance(&topology, DEFAULT_INSTANCE_ID, &Context::default())?;
    let identity = resolved.tree.get(IDENTITY_KEY);
    ensure!(
        identity == Some(&json!({"id": "default", "hostname": "zos.example.com", "ip": "10.0.0.1"})),
        "got {identity:?}"
    );
    Ok(())
}

#[rstest]
fn identity_fields_are_not_merged(topology: Value) -> Result<()> {
    let resolved = resolve_instance(&topology, "lpar1", &Context::default())?;
    ensure!(resolved.tree.get("hostname").is_none());
    ensure!(resolved.tree.get("ip").is_none());
    Ok(())
}

#[rstest]
fn instance_gateway_port_anchors_offsets(topology: Value) -> Result<()> {
    let lpar1 = resolve_instance(&topology, "lpar1", &Context::default())?;
    let lpar2 = resolve_instance(&topology, "lpar2", &Context::default())?;
    ensure!(lpar1.tree.pointer("/components/api-catalog/port") == Some(&json!(7552)));
    ensure!(lpar2.tree.pointer("/components/api-catalog/port") == Some(&json!(8886)));
    ensure!(lpar2.tree.pointer("/components/discovery/enabled") == Some(&json!(false)));
    Ok(())
}

#[rstest]
#[case::negative(json!("-1000"), json!(7888))]
#[case::positive(json!("+12"), json!(8900))]
#[case::absolute_string(json!("7000"), json!("7000"))]
#[case::not_numeric(json!("-abc"), json!("-abc"))]
#[case::number(json!(1234), json!(1234))]
fn offsets_resolve_against_reference(#[case] declared: Value, #[case] expected: Value) {
    let mut tree = json!({"components": {
        "gateway": {"port": 8888},
        "zss": {"port": declared}
    }});
    resolve_port_offsets(&mut tree, &Context::default());
    assert_eq!(tree.pointer("/components/zss/port"), Some(&expected));
}

#[test]
fn offset_without_reference_warns_and_keeps_value() {
    let ctx = Context::default();
    let mut tree = json!({"components": {"zss": {"port": "+1"}}});
    resolve_port_offsets(&mut tree, &ctx);
    assert_eq!(tree.pointer("/components/zss/port"), Some(&json!("+1")));
    assert_eq!(ctx.warnings().len(), 1);
}

#[rstest]
fn discovery_respects_instance_enable_override(topology: Value) {
    assert_eq!(
        discovery_list(&topology),
        vec!["https://lpar1.example.com:7553/eureka/".to_owned()]
    );
}

#[test]
fn discovery_list_is_deterministic_and_unique() {
    let tree = json!({
        "components": {"discovery": {"enabled": true, "port": 1000}},
        "haInstances": {
            "a": {"hostname": "a.com"},
            "b": {"hostname": "B.com"},
            "c": {"hostname": "a.com"}
        }
    });
    assert_eq!(
        discovery_list(&tree).join(","),
        "https://a.com:1000/eureka/,https://b.com:1000/eureka/"
    );
}

#[test]
fn discovery_without_instances_uses_global() {
    let tree = json!({
        "zowe": {"externalDomains": ["Host.Example"]},
        "components": {"discovery": {"enabled": true, "port": 7553}}
    });
    assert_eq!(discovery_list(&tree), ["https://host.example:7553/eureka/"]);
    let disabled = json!({"components": {"discovery": {"enabled": false, "port": 7553}}});
    assert!(discovery_list(&disabled).is_empty());
}

#[test]
fn replicas_bypass_instance_logic() {
    let tree = json!({
        "zowe": {"environments": {"ZWE_POD_NAMESPACE": "prod"}},
        "components": {"discovery": {"enabled": false, "port": 7553, "replicas": 2}},
        "haInstances": {"a": {"hostname": "a.com"}}
    });
    assert_eq!(
        discovery_list(&tree),
        [
            "https://discovery-0.discovery-service.prod.cluster.local:7553/eureka/",
            "https://discovery-1.discovery-service.prod.cluster.local:7553/eureka/",
        ]
    );
}

#[rstest]
#[case(json!(u64::MAX))]
#[case(json!("100000"))]
fn replica_count_is_clamped(#[case] replicas: Value) -> Result<()> {
    let tree = json!({"components": {"discovery": {"port": 7553, "replicas": replicas}}});
    let endpoints = discovery_list(&tree);
    ensure!(
        u64::try_from(endpoints.len())? == MAX_DISCOVERY_REPLICAS,
        "got {} endpoints",
        endpoints.len()
    );
    ensure!(
        endpoints.last().map(String::as_str)
            == Some("https://discovery-255.discovery-service.zowe.cluster.local:7553/eureka/")
    );
    Ok(())
}

#[test]
fn relative_discovery_port_follows_instance_gateway() {
    let tree = json!({
        "components": {
            "gateway": {"port": 7554},
            "discovery": {"enabled": true, "port": "-1"}
        },
        "haInstances": {
            "a": {"hostname": "a.com"},
            "b": {"hostname": "b.com", "components": {"gateway": {"port": 9000}}}
        }
    });
    assert_eq!(
        discovery_list(&tree),
        ["https://a.com:7553/eureka/", "https://b.com:8999/eureka/"]
    );
}

#[rstest]
fn enabled_anywhere_reports_last_instance(topology: Value) {
    assert_eq!(enabled_anywhere(&topology, "discovery"), Some("lpar1".to_owned()));
    assert_eq!(enabled_anywhere(&topology, "gateway"), Some("lpar2".to_owned()));
    assert_eq!(enabled_anywhere(&topology, "zss"), None);
    let single = json!({"components": {"gateway": {"enabled": true}}});
    assert_eq!(enabled_anywhere(&single, "gateway"), Some("_".to_owned()));
}

#[rstest]
fn components_carry_their_subtree_as_configs(topology: Value) -> Result<()> {
    let resolved = resolve_instance(&topology, "lpar2", &Context::default())?;
    let ids: Vec<&str> = resolved
        .components
        .iter()
        .map(|view| view.component_id.as_str())
        .collect();
    ensure!(ids == ["gateway", "discovery", "api-catalog"], "got {ids:?}");
    let gateway = resolved
        .components
        .first()
        .ok_or_else(|| anyhow::anyhow!("missing gateway view"))?;
    ensure!(gateway.configs() == &json!({"enabled": true, "port": 8888}));
    ensure!(gateway.instance_id == "lpar2");
    ensure!(gateway.tree.get(IDENTITY_KEY).is_some());
    Ok(())
}

#[rstest]
fn instance_ids_default_when_undeclared(topology: Value) {
    assert_eq!(instance_ids(&topology), ["lpar1", "lpar2"]);
    assert_eq!(instance_ids(&json!({})), [DEFAULT_INSTANCE_ID]);
}

#[test]
fn empty_instance_id_is_rejected() {
    let err = resolve_instance(&json!({}), "", &Context::default()).err();
    assert!(matches!(
        err.as_deref(),
        Some(crate::ZccError::PreconditionMissing { .. })
    ));
}

#[test]
fn undeclared_instance_uses_base_and_notes_it() -> Result<()> {
    let ctx = Context::new(true);
    let base = json!({"components": {"zss": {"port": 8542}}});
    let resolved = resolve_instance(&base, "ghost", &ctx)?;
    ensure!(resolved.tree.pointer("/components/zss/port") == Some(&json!(8542)));
    ensure!(ctx.events().len() == 1);
    Ok(())
}
