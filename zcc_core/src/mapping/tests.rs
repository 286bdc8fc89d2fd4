//! Tests for the flat/tree mapping tables.

use super::*;
use crate::diagnostics::Severity;
use anyhow::{Result, anyhow, ensure};
use rstest::rstest;
use serde_json::json;

fn flat(pairs: &[(&str, &str)]) -> FlatNamespace {
    pairs.iter().map(|(k, v)| (*k, *v)).collect()
}

fn render(tree: &Value, component_id: Option<&str>, ctx: &Context) -> Result<Vec<FlatLine>> {
    let input = RenderInput {
        tree,
        instance_id: "default",
        component_id,
        original: tree,
    };
    to_flat(&input, ctx).map_err(|err| anyhow!(err.to_string()))
}

fn value_of<'a>(lines: &'a [FlatLine], key: &str) -> Option<&'a str> {
    lines.iter().find_map(|line| match line {
        FlatLine::Pair { key: k, value } if k == key => Some(value.as_str()),
        _ => None,
    })
}

#[test]
fn unknown_keys_land_in_environments_with_notice() -> Result<()> {
    let ctx = Context::new(true);
    let tree = to_tree(&flat(&[("MY_CUSTOM", "x y"), ("ROOT_DIR", "/opt/zowe")]), &ctx)?;
    ensure!(
        tree == json!({
            "zowe": {"environments": {"MY_CUSTOM": "x y"}, "runtimeDirectory": "/opt/zowe"}
        }),
        "got {tree}"
    );
    let events = ctx.events();
    ensure!(events.len() == 1);
    ensure!(
        events.first().map(|e| e.message.as_str()) == Some("Unknown key MY_CUSTOM with value \"x y\"")
    );
    Ok(())
}

#[test]
fn ignored_keys_are_dropped_and_noted_when_verbose() -> Result<()> {
    let quiet = Context::new(false);
    let tree = to_tree(&flat(&[("SKIP_NODE", "1")]), &quiet)?;
    ensure!(tree == json!({}));
    ensure!(quiet.events().is_empty());

    let verbose = Context::new(true);
    to_tree(&flat(&[("SKIP_NODE", "1")]), &verbose)?;
    let messages: Vec<_> = verbose.events().into_iter().map(|e| e.message).collect();
    ensure!(messages == ["Ignore key SKIP_NODE with value \"1\""], "got {messages:?}");
    Ok(())
}

#[test]
fn multi_path_keys_write_every_target() -> Result<()> {
    let tree = to_tree(&flat(&[("GATEWAY_PORT", "7554")]), &Context::default())?;
    ensure!(tree.pointer("/zowe/externalPort") == Some(&json!("7554")));
    ensure!(tree.pointer("/components/gateway/port") == Some(&json!("7554")));
    Ok(())
}

#[rstest]
#[case::gateway("GATEWAY", &["gateway", "discovery", "api-catalog", "jobs-api", "files-api",
    "explorer-jes", "explorer-mvs", "explorer-uss"])]
#[case::desktop("DESKTOP", &["app-server", "zss"])]
#[case::both("GATEWAY,DESKTOP", crate::components::CORE_COMPONENTS)]
fn launch_groups_expand(#[case] groups: &str, #[case] expected: &[&str]) -> Result<()> {
    let tree = to_tree(&flat(&[("LAUNCH_COMPONENT_GROUPS", groups)]), &Context::default())?;
    let enabled: Vec<&str> = tree
        .get("components")
        .and_then(Value::as_object)
        .map(|components| components.keys().map(String::as_str).collect())
        .unwrap_or_default();
    let mut sorted_enabled = enabled.clone();
    sorted_enabled.sort_unstable();
    let mut sorted_expected = expected.to_vec();
    sorted_expected.sort_unstable();
    ensure!(sorted_enabled == sorted_expected, "got {enabled:?}");
    Ok(())
}

#[test]
fn explicit_launch_components_win_over_groups() -> Result<()> {
    let ctx = Context::new(true);
    let tree = to_tree(
        &flat(&[
            ("LAUNCH_COMPONENT_GROUPS", "GATEWAY"),
            ("ZWE_LAUNCH_COMPONENTS", "zss, ./custom/path ,explorer-jes"),
        ]),
        &ctx,
    )?;
    ensure!(
        tree == json!({"components": {
            "zss": {"enabled": true},
            "explorer-jes": {"enabled": true}
        }}),
        "got {tree}"
    );
    let notes: Vec<_> = ctx.events().into_iter().map(|e| e.message).collect();
    ensure!(notes == ["Unsupported component value \"./custom/path\""], "got {notes:?}");
    Ok(())
}

#[test]
fn host_lists_accumulate_without_duplicates() -> Result<()> {
    let tree = to_tree(
        &flat(&[
            ("ZOWE_EXPLORER_HOST", "a.com"),
            ("ZWE_EXTERNAL_HOSTS", "a.com, b.com,,c.com"),
            ("ZWE_REFERRER_HOSTS", "r.com"),
        ]),
        &Context::default(),
    )?;
    ensure!(tree.pointer("/zowe/externalDomains") == Some(&json!(["a.com", "b.com", "c.com"])));
    ensure!(tree.pointer("/zowe/referrerHosts") == Some(&json!(["r.com"])));
    Ok(())
}

#[rstest]
#[case("TRUE", true)]
#[case("true", true)]
#[case("false", false)]
#[case("yes", false)]
fn boolean_rules_coerce(#[case] raw: &str, #[case] expected: bool) -> Result<()> {
    let tree = to_tree(&flat(&[("APIML_DEBUG_MODE_ENABLED", raw)]), &Context::default())?;
    for component in ["gateway", "discovery", "api-catalog", "caching-service"] {
        let path = format!("/components/{component}/debug");
        ensure!(tree.pointer(&path) == Some(&json!(expected)), "{path} in {tree}");
    }
    Ok(())
}

#[test]
fn export_starts_with_global_section() -> Result<()> {
    let tree = json!({"zowe": {"runtimeDirectory": "/opt/zowe"}});
    let lines = render(&tree, None, &Context::default())?;
    ensure!(
        lines.iter().take(3).cloned().collect::<Vec<_>>()
            == vec![
                FlatLine::Separator,
                FlatLine::Comment("# global config".to_owned()),
                FlatLine::Pair {
                    key: "ROOT_DIR".to_owned(),
                    value: "/opt/zowe".to_owned()
                },
            ]
    );
    ensure!(value_of(&lines, "ZOWE_PREFIX").is_none(), "absent values emit no line");
    Ok(())
}

#[test]
fn null_renders_as_empty_string() -> Result<()> {
    let tree = json!({"java": {"home": null}});
    let lines = render(&tree, None, &Context::default())?;
    ensure!(value_of(&lines, "JAVA_HOME") == Some(""));
    Ok(())
}

#[rstest]
#[case("zowe:\n  jobPrefix: null\n  runtimeDirectory:\njava:\n  home: ~\n")]
#[case("zowe: {jobPrefix: ~, runtimeDirectory: null}\njava: {home: null}\n")]
fn yaml_nulls_render_as_empty_strings(#[case] text: &str) -> Result<()> {
    let tree = crate::file::parse_yaml(text)?;
    let lines = render(&tree, None, &Context::default())?;
    for key in ["ZOWE_PREFIX", "ROOT_DIR", "JAVA_HOME"] {
        ensure!(value_of(&lines, key) == Some(""), "{key}: {:?}", value_of(&lines, key));
    }
    Ok(())
}

#[test]
fn disagreeing_paths_warn_and_last_wins() -> Result<()> {
    let ctx = Context::default();
    let tree = json!({
        "zowe": {"externalPort": 7554},
        "components": {"gateway": {"port": 7000}}
    });
    let lines = render(&tree, None, &ctx)?;
    ensure!(value_of(&lines, "GATEWAY_PORT") == Some("7000"));
    let warnings = ctx.warnings();
    ensure!(
        warnings
            == [
                "Values for GATEWAY_PORT differ (zowe.externalPort=7554, \
                 components.gateway.port=7000); using components.gateway.port"
            ],
        "got {warnings:?}"
    );
    ensure!(ctx.events().iter().all(|e| e.severity == Severity::Warning));
    Ok(())
}

#[test]
fn launch_lists_follow_enabled_flags() -> Result<()> {
    let tree = json!({"components": {
        "zss": {"enabled": true},
        "gateway": {"enabled": "false"},
        "app-server": {"enabled": true},
        "caching-service": {"enabled": true},
        "my-ext": {"enabled": true}
    }});
    let lines = render(&tree, None, &Context::default())?;
    ensure!(value_of(&lines, "LAUNCH_COMPONENT_GROUPS") == Some("DESKTOP,ZSS"));
    ensure!(value_of(&lines, "ZWE_LAUNCH_COMPONENTS") == Some("zss,app-server"));
    ensure!(value_of(&lines, "EXTERNAL_COMPONENTS") == Some("my-ext"));
    Ok(())
}

#[test]
fn component_scoped_values_use_the_component_view() -> Result<()> {
    let tree = json!({"components": {
        "discovery": {"debug": true, "apiml": {"service": {"preferIpAddress": true}}}
    }});
    let component = render(&tree, Some("discovery"), &Context::default())?;
    ensure!(value_of(&component, "APIML_DEBUG_MODE_ENABLED") == Some("true"));
    ensure!(value_of(&component, "APIML_PREFER_IP_ADDRESS") == Some("true"));
    ensure!(value_of(&component, "ZOWE_APIM_VERIFY_CERTIFICATES") == Some("true"));

    let instance = render(&tree, None, &Context::default())?;
    ensure!(value_of(&instance, "APIML_DEBUG_MODE_ENABLED") == Some("false"));
    ensure!(value_of(&instance, "APIML_PREFER_IP_ADDRESS") == Some("false"));
    Ok(())
}

#[test]
fn certificate_layers_merge_with_component_last() -> Result<()> {
    let tree = json!({
        "zowe": {
            "externalCertificate": {"keystore": {"type": "PKCS12", "file": "/ext.p12"}},
            "internalCertificate": {"keystore": {"file": "/int.p12", "password": "pw"}}
        },
        "configs": {
            "certificate": {"keystore": {"alias": "local"}},
            "internalCertificate": {"trustStore": {"file": "/trust.p12"}}
        }
    });
    let lines = render(&tree, Some("gateway"), &Context::default())?;
    ensure!(value_of(&lines, "KEYSTORE_TYPE") == Some("PKCS12"));
    ensure!(value_of(&lines, "KEYSTORE") == Some("/int.p12"));
    ensure!(value_of(&lines, "KEY_ALIAS") == Some("local"));
    ensure!(value_of(&lines, "SERVER_INTERNAL_SSL_TRUSTSTORE") == Some("/trust.p12"));
    ensure!(value_of(&lines, "SERVER_INTERNAL_SSL_TRUSTSTORETYPE") == Some("PKCS12"));
    ensure!(value_of(&lines, "SERVER_INTERNAL_SSL_TRUSTSTOREPASSWORD") == Some("pw"));

    let other = render(&tree, Some("discovery"), &Context::default())?;
    ensure!(value_of(&other, "SERVER_INTERNAL_SSL_KEYSTORE").is_none());
    Ok(())
}

#[test]
fn certificate_authority_lists_concatenate_across_layers() -> Result<()> {
    let tree = json!({
        "zowe": {
            "externalCertificate": {"trustStore": {"certificateAuthorities": ["/ca/ext.cer"]}},
            "internalCertificate": {"trustStore": {"certificateAuthorities": ["/ca/int.cer"]}}
        }
    });
    let lines = render(&tree, None, &Context::default())?;
    ensure!(
        value_of(&lines, "EXTERNAL_CERTIFICATE_AUTHORITIES") == Some("/ca/ext.cer,/ca/int.cer"),
        "got {:?}",
        value_of(&lines, "EXTERNAL_CERTIFICATE_AUTHORITIES")
    );
    Ok(())
}

#[test]
fn extra_environments_are_appended_once() -> Result<()> {
    let tree = json!({"zowe": {
        "externalDomains": ["zos.com"],
        "environments": {"ZWE_INTERNAL_HOST": "internal.zos.com", "MY_FLAG": "on"}
    }});
    let lines = render(&tree, None, &Context::default())?;
    ensure!(value_of(&lines, "ZWE_INTERNAL_HOST") == Some("internal.zos.com"));
    ensure!(value_of(&lines, "ZOWE_EXPLORER_HOST") == Some("zos.com"));
    let internal_count = lines
        .iter()
        .filter(|line| matches!(line, FlatLine::Pair { key, .. } if key == "ZWE_INTERNAL_HOST"))
        .count();
    ensure!(internal_count == 1);
    let tail: Vec<_> = lines.iter().rev().take(2).cloned().collect();
    ensure!(
        tail == vec![
            FlatLine::Pair {
                key: "MY_FLAG".to_owned(),
                value: "on".to_owned()
            },
            FlatLine::Comment("# extra environments".to_owned()),
        ],
        "got {tail:?}"
    );
    Ok(())
}

#[test]
fn path_mapped_values_round_trip() -> Result<()> {
    let source = flat(&[
        ("ROOT_DIR", "/opt/zowe"),
        ("ZOWE_PREFIX", "ZWE1"),
        ("JAVA_HOME", "/usr/lpp/java"),
        ("ZOSMF_PORT", "443"),
        ("CATALOG_PORT", "7552"),
        ("KEYSTORE", "/keys/ks.p12"),
        ("CUSTOM_SETTING", "kept"),
    ]);
    let ctx = Context::default();
    let tree = to_tree(&source, &ctx)?;
    let exported = pairs(&render(&tree, None, &ctx)?);
    for (key, value) in source.iter() {
        ensure!(exported.get(key) == Some(value), "{key} did not round-trip");
    }
    Ok(())
}

#[rstest]
#[case("plain/value:8080", "plain/value:8080")]
#[case("", "")]
#[case("two words", "\"two words\"")]
#[case("$HOME", "\"\\$HOME\"")]
#[case("say \"hi\"", "\"say \\\"hi\\\"\"")]
fn env_values_are_quoted_for_the_shell(#[case] raw: &str, #[case] rendered: &str) {
    let text = render_env(&[FlatLine::Pair {
        key: "K".to_owned(),
        value: raw.to_owned(),
    }]);
    assert_eq!(text, format!("K={rendered}\n"));
}

#[test]
fn render_env_keeps_layout() {
    let text = render_env(&[
        FlatLine::Separator,
        FlatLine::Comment("# section".to_owned()),
        FlatLine::Pair {
            key: "A".to_owned(),
            value: "1".to_owned(),
        },
    ]);
    assert_eq!(text, "\n# section\nA=1\n");
}
