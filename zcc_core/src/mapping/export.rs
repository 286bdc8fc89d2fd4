//! Tree-to-flat rules, in rendering order.

use serde_json::{Map, Value};

use super::{ExportFn, ExportLine, MappingEntry, RenderInput};
use crate::components::{CORE_CANDIDATES, CORE_COMPONENTS};
use crate::instance::{discovery_list, enabled_anywhere};
use crate::tree::{self, Segment, TreePath};
use crate::ZccResult;

/// Export rules and section markers, in the order they are rendered.
pub static EXPORT_TABLE: &[ExportLine] = &[
    ExportLine::Separator,
    ExportLine::Comment("# global config"),
    path("ROOT_DIR", "zowe.runtimeDirectory"),
    path("ZOWE_PREFIX", "zowe.jobPrefix"),
    path("ZOWE_INSTANCE", "zowe.identifier"),
    ExportLine::Separator,
    ExportLine::Comment("# Comma separated list of components should start from [GATEWAY,DESKTOP]"),
    computed("LAUNCH_COMPONENT_GROUPS", launch_component_groups),
    computed("ZWE_LAUNCH_COMPONENTS", launch_components),
    ExportLine::Separator,
    ExportLine::Comment("# language configs"),
    path("JAVA_HOME", "java.home"),
    path("JAVA_OPTIONS", "java.options"),
    path("NODE_HOME", "node.home"),
    path("NODE_OPTIONS", "node.options"),
    ExportLine::Separator,
    ExportLine::Comment(
        "# Set to 1 to skip using nodejs. This can only be done if the zowe components used have no nodejs dependency",
    ),
    ignore("SKIP_NODE"),
    ExportLine::Separator,
    ExportLine::Comment("# z/OS MF config"),
    path("ZOSMF_HOST", "zOSMF.host"),
    path("ZOSMF_PORT", "zOSMF.port"),
    computed("ZOWE_EXPLORER_HOST", explorer_host),
    computed("ZWE_INTERNAL_HOST", internal_host),
    computed("ZOWE_IP_ADDRESS", ip_address),
    ExportLine::Separator,
    ExportLine::Comment("# APIML variables"),
    path("CATALOG_PORT", "components.api-catalog.port"),
    path("DISCOVERY_PORT", "components.discovery.port"),
    paths("GATEWAY_PORT", &["zowe.externalPort", "components.gateway.port"]),
    path("APIML_GATEWAY_INTERNAL_HOST", "zowe.gatewayInternalHost"),
    path("APIML_GATEWAY_INTERNAL_PORT", "zowe.gatewayInternalPort"),
    path(
        "APIML_ALLOW_ENCODED_SLASHES",
        "components.gateway.apiml.service.allowEncodedSlashes",
    ),
    path("APIML_CORS_ENABLED", "components.gateway.apiml.service.corsEnabled"),
    computed("APIML_PREFER_IP_ADDRESS", prefer_ip_address),
    path("APIML_GATEWAY_TIMEOUT_MILLIS", "components.gateway.apiml.gateway.timeoutMillis"),
    path(
        "APIML_SECURITY_X509_ENABLED",
        "components.gateway.apiml.security.x509.enabled",
    ),
    paths(
        "APIML_SECURITY_ZOSMF_APPLID",
        &["zOSMF.applId", "components.gateway.apiml.security.zosmf.applid"],
    ),
    path("APIML_SECURITY_AUTH_PROVIDER", "components.gateway.apiml.security.auth.provider"),
    path(
        "APIML_GATEWAY_EXTERNAL_MAPPER",
        "components.gateway.apiml.security.x509.externalMapperUrl",
    ),
    path(
        "APIML_SECURITY_AUTHORIZATION_ENDPOINT_URL",
        "components.gateway.apiml.security.authorization.endpoint.url",
    ),
    computed("ZWE_DISCOVERY_SERVICES_LIST", discovery_services),
    ExportLine::Comment("# Enable debug logging for Api Mediation Layer services"),
    computed("APIML_DEBUG_MODE_ENABLED", debug_mode),
    path(
        "APIML_MAX_CONNECTIONS_PER_ROUTE",
        "components.gateway.server.maxConnectionsPerRoute",
    ),
    path("APIML_MAX_TOTAL_CONNECTIONS", "components.gateway.server.maxTotalConnections"),
    ExportLine::Comment("# caching service"),
    path("ZWE_CACHING_SERVICE_PORT", "components.caching-service.port"),
    path("ZWE_CACHING_STORAGE_SIZE", "components.caching-service.storage.size"),
    path(
        "ZWE_CACHING_EVICTION_STRATEGY",
        "components.caching-service.storage.evictionStrategy",
    ),
    path("ZWE_CACHING_SERVICE_PERSISTENT", "components.caching-service.storage.mode"),
    path(
        "ZWE_CACHING_SERVICE_VSAM_DATASET",
        "components.caching-service.storage.vsam.name",
    ),
    ExportLine::Separator,
    ExportLine::Comment("# explorer variables"),
    path("JOBS_API_PORT", "components.jobs-api.port"),
    path("FILES_API_PORT", "components.files-api.port"),
    path("JES_EXPLORER_UI_PORT", "components.explorer-jes.port"),
    path("MVS_EXPLORER_UI_PORT", "components.explorer-mvs.port"),
    path("USS_EXPLORER_UI_PORT", "components.explorer-uss.port"),
    paths(
        "ZOWE_EXPLORER_FRAME_ANCESTORS",
        &[
            "components.explorer-jes.frameAncestors",
            "components.explorer-mvs.frameAncestors",
            "components.explorer-uss.frameAncestors",
        ],
    ),
    ExportLine::Separator,
    ExportLine::Comment("# Zowe Desktop/app framework variables"),
    path("ZOWE_ZLUX_SERVER_HTTPS_PORT", "components.app-server.port"),
    path("ZOWE_ZSS_SERVER_PORT", "components.zss.port"),
    path("ZOWE_ZSS_XMEM_SERVER_NAME", "components.zss.crossMemoryServerName"),
    path("ZOWE_ZSS_SERVER_TLS", "components.zss.tls"),
    computed("ZWED_node_mediationLayer_enabled", mediation_layer_enabled),
    computed(
        "ZWED_node_mediationLayer_server_gatewayHostname",
        mediation_layer_gateway_hostname,
    ),
    computed("ZWED_node_mediationLayer_server_gatewayPort", mediation_layer_gateway_port),
    ExportLine::Comment("# only the first discovery in the list is used here"),
    computed("ZWED_node_mediationLayer_server_hostname", mediation_layer_hostname),
    computed("ZWED_node_mediationLayer_server_port", mediation_layer_port),
    computed(
        "ZWED_node_mediationLayer_cachingService_enabled",
        mediation_layer_caching_enabled,
    ),
    ExportLine::Separator,
    ExportLine::Comment("# Extender variables"),
    path(
        "ZWEAD_EXTERNAL_STATIC_DEF_DIRECTORIES",
        "components.discovery.alternativeStaticApiDefinitionsDirectories",
    ),
    computed("EXTERNAL_COMPONENTS", external_components),
    ExportLine::Separator,
    ExportLine::Comment("# other variables"),
    path("ZWE_LOG_LEVEL_ZWELS", "zowe.launchScript.logLevel"),
    path("STATIC_DEF_CONFIG_DIR", "components.discovery.staticApiDefinitionsDirectories"),
    computed("ZOWE_APIM_VERIFY_CERTIFICATES", verify_certificates),
    computed("ZOWE_APIM_NONSTRICT_VERIFY_CERTIFICATES", nonstrict_verify_certificates),
    computed("ZWE_EXTERNAL_HOSTS", external_hosts),
    computed("ZWE_REFERRER_HOSTS", referrer_hosts),
    path("ZOWE_LOOPBACK_ADDRESS", "zowe.loopbackIp"),
    ignore("APIML_ENABLE_SSO"),
    ignore("ZWE_ENVIRONMENT_PREPARED"),
    ExportLine::Separator,
    ExportLine::Comment("# ========== certificate ============="),
    ExportLine::Comment("# keystore config"),
    path("ZWE_EXTENSION_DIR", "zowe.extensionDirectory"),
    ExportLine::Comment("# keystore"),
    computed("KEYSTORE_TYPE", |input| certificate(input, "keystore.type")),
    computed("KEYSTORE", |input| certificate(input, "keystore.file")),
    computed("KEYSTORE_PASSWORD", |input| certificate(input, "keystore.password")),
    computed("KEY_ALIAS", |input| certificate(input, "keystore.alias")),
    ExportLine::Comment("# truststore"),
    computed("TRUSTSTORE", |input| certificate(input, "trustStore.file")),
    computed("EXTERNAL_CERTIFICATE_AUTHORITIES", |input| {
        certificate(input, "trustStore.certificateAuthorities")
    }),
    ExportLine::Comment("# pem format"),
    computed("KEYSTORE_KEY", |input| certificate(input, "pem.key")),
    computed("KEYSTORE_CERTIFICATE", |input| certificate(input, "pem.certificate")),
    computed("KEYSTORE_CERTIFICATE_AUTHORITY", |input| {
        certificate(input, "pem.certificateAuthority")
    }),
    ExportLine::Comment("# token"),
    path("PKCS11_TOKEN_LABEL", "zowe.sso.token.label"),
    path("PKCS11_TOKEN_NAME", "zowe.sso.token.name"),
    ExportLine::Comment("# gateway internal certificate"),
    computed("SERVER_INTERNAL_SSL_KEYALIAS", |input| {
        gateway_internal(input, &["keystore.alias"])
    }),
    computed("SERVER_INTERNAL_SSL_KEYPASSWORD", |input| {
        gateway_internal(input, &["keystore.password"])
    }),
    computed("SERVER_INTERNAL_SSL_KEYSTOREPASSWORD", |input| {
        gateway_internal(input, &["keystore.password"])
    }),
    computed("SERVER_INTERNAL_SSL_KEYSTORETYPE", |input| {
        gateway_internal(input, &["keystore.type"])
    }),
    computed("SERVER_INTERNAL_SSL_KEYSTORE", |input| {
        gateway_internal(input, &["keystore.file"])
    }),
    computed("SERVER_INTERNAL_SSL_TRUSTSTORETYPE", |input| {
        gateway_internal(input, &["trustStore.type", "keystore.type"])
    }),
    computed("SERVER_INTERNAL_SSL_TRUSTSTORE", |input| {
        gateway_internal(input, &["trustStore.file"])
    }),
    computed("SERVER_INTERNAL_SSL_TRUSTSTOREPASSWORD", |input| {
        gateway_internal(input, &["trustStore.password", "keystore.password"])
    }),
];

const fn ignore(key: &'static str) -> ExportLine {
    ExportLine::Entry {
        key,
        rule: MappingEntry::Ignore,
    }
}

const fn path(key: &'static str, source: &'static str) -> ExportLine {
    ExportLine::Entry {
        key,
        rule: MappingEntry::Path(source),
    }
}

const fn paths(key: &'static str, sources: &'static [&'static str]) -> ExportLine {
    ExportLine::Entry {
        key,
        rule: MappingEntry::Paths(sources),
    }
}

const fn computed(key: &'static str, rule: ExportFn) -> ExportLine {
    ExportLine::Entry {
        key,
        rule: MappingEntry::Computed(rule),
    }
}

fn lookup<'a>(tree: &'a Value, path: &str) -> ZccResult<Option<&'a Value>> {
    tree::get(tree, path)
}

/// Value at `path`, treating `null` and `""` as absent.
fn truthy<'a>(tree: &'a Value, path: &str) -> ZccResult<Option<&'a Value>> {
    Ok(lookup(tree, path)?.filter(|value| tree::is_truthy(value)))
}

/// `zowe.environments.<key>` when set to a truthy value.
fn customized(input: &RenderInput<'_>, key: &str) -> Option<Value> {
    TreePath::from_segments(vec![
        Segment::Key("zowe".to_owned()),
        Segment::Key("environments".to_owned()),
        Segment::Key(key.to_owned()),
    ])
    .get(input.tree)
    .filter(|value| tree::is_truthy(value))
    .cloned()
}

/// Value under `components.<current component>.<rest>`.
fn component_value<'a>(input: &RenderInput<'a>, rest: &str) -> ZccResult<Option<&'a Value>> {
    let Some(component) = input.component_id else {
        return Ok(None);
    };
    let mut segments = vec![
        Segment::Key("components".to_owned()),
        Segment::Key(component.to_owned()),
    ];
    segments.extend(TreePath::parse(rest)?.segments().iter().cloned());
    Ok(TreePath::from_segments(segments).get(input.tree))
}

fn enabled_components(input: &RenderInput<'_>, keep: impl Fn(&str) -> bool) -> Value {
    let Some(Value::Object(components)) = input.tree.get("components") else {
        return Value::from("");
    };
    let names: Vec<&str> = components
        .iter()
        .filter(|(name, _)| keep(name))
        .filter(|(_, config)| config.get("enabled").is_some_and(tree::is_enabled))
        .map(|(name, _)| name.as_str())
        .collect();
    Value::from(names.join(","))
}

fn is_enabled_at(tree: &Value, path: &str) -> ZccResult<bool> {
    Ok(lookup(tree, path)?.is_some_and(tree::is_enabled))
}

fn launch_component_groups(input: &RenderInput<'_>) -> ZccResult<Option<Value>> {
    let mut groups = Vec::new();
    for (group, component) in [("GATEWAY", "gateway"), ("DESKTOP", "app-server"), ("ZSS", "zss")] {
        if is_enabled_at(input.tree, &format!("components.{component}.enabled"))? {
            groups.push(group);
        }
    }
    Ok(Some(Value::from(groups.join(","))))
}

fn launch_components(input: &RenderInput<'_>) -> ZccResult<Option<Value>> {
    Ok(Some(enabled_components(input, |name| {
        CORE_COMPONENTS.contains(&name)
    })))
}

fn external_components(input: &RenderInput<'_>) -> ZccResult<Option<Value>> {
    Ok(Some(enabled_components(input, |name| {
        !CORE_COMPONENTS.contains(&name) && !CORE_CANDIDATES.contains(&name)
    })))
}

fn explorer_hostname(input: &RenderInput<'_>) -> ZccResult<Value> {
    Ok(truthy(input.tree, "haInstance.hostname")?
        .or(truthy(input.tree, "zowe.externalDomains[0]")?)
        .cloned()
        .unwrap_or_else(|| Value::from("")))
}

fn explorer_host(input: &RenderInput<'_>) -> ZccResult<Option<Value>> {
    explorer_hostname(input).map(Some)
}

fn internal_host(input: &RenderInput<'_>) -> ZccResult<Option<Value>> {
    if let Some(value) = customized(input, "ZWE_INTERNAL_HOST") {
        return Ok(Some(value));
    }
    explorer_hostname(input).map(Some)
}

fn ip_address(input: &RenderInput<'_>) -> ZccResult<Option<Value>> {
    let ip = truthy(input.tree, "haInstance.ip")?
        .cloned()
        .or_else(|| customized(input, "ZOWE_IP_ADDRESS"))
        .unwrap_or_else(|| Value::from(""));
    Ok(Some(ip))
}

fn prefer_ip_address(input: &RenderInput<'_>) -> ZccResult<Option<Value>> {
    let value = component_value(input, "environment.preferIpAddress")?
        .or(component_value(input, "apiml.service.preferIpAddress")?)
        .cloned()
        .unwrap_or(Value::Bool(false));
    Ok(Some(value))
}

fn debug_mode(input: &RenderInput<'_>) -> ZccResult<Option<Value>> {
    Ok(Some(
        component_value(input, "debug")?
            .cloned()
            .unwrap_or(Value::Bool(false)),
    ))
}

fn verify_certificates(input: &RenderInput<'_>) -> ZccResult<Option<Value>> {
    Ok(Some(
        component_value(input, "apiml.security.ssl.verifySslCertificatesOfServices")?
            .cloned()
            .unwrap_or(Value::Bool(true)),
    ))
}

fn nonstrict_verify_certificates(input: &RenderInput<'_>) -> ZccResult<Option<Value>> {
    Ok(Some(
        component_value(
            input,
            "apiml.security.ssl.nonStrictVerifySslCertificatesOfServices",
        )?
        .cloned()
        .unwrap_or(Value::Bool(true)),
    ))
}

fn external_hosts(input: &RenderInput<'_>) -> ZccResult<Option<Value>> {
    Ok(Some(
        lookup(input.tree, "zowe.externalDomains")?
            .cloned()
            .unwrap_or_else(|| Value::from("")),
    ))
}

fn referrer_hosts(input: &RenderInput<'_>) -> ZccResult<Option<Value>> {
    Ok(Some(
        truthy(input.tree, "zowe.referrerHosts")?
            .or(truthy(input.tree, "zowe.externalDomains")?)
            .cloned()
            .unwrap_or_else(|| Value::from("")),
    ))
}

fn discovery_services(input: &RenderInput<'_>) -> ZccResult<Option<Value>> {
    Ok(Some(Value::from(discovery_list(input.original).join(","))))
}

fn mediation_layer_enabled(input: &RenderInput<'_>) -> ZccResult<Option<Value>> {
    if let Some(value) = customized(input, "ZWED_node_mediationLayer_enabled") {
        return Ok(Some(value));
    }
    let available = enabled_anywhere(input.original, "gateway").is_some()
        || enabled_anywhere(input.original, "discovery").is_some();
    Ok(Some(Value::Bool(available)))
}

fn mediation_layer_gateway_hostname(input: &RenderInput<'_>) -> ZccResult<Option<Value>> {
    if let Some(value) = customized(input, "ZWED_node_mediationLayer_server_gatewayHostname") {
        return Ok(Some(value));
    }
    if enabled_anywhere(input.original, "gateway").is_none() {
        return Ok(None);
    }
    Ok(truthy(input.tree, "zowe.externalDomains[0]")?.cloned())
}

fn mediation_layer_gateway_port(input: &RenderInput<'_>) -> ZccResult<Option<Value>> {
    if let Some(value) = customized(input, "ZWED_node_mediationLayer_server_gatewayPort") {
        return Ok(Some(value));
    }
    if enabled_anywhere(input.original, "gateway").is_none() {
        return Ok(None);
    }
    Ok(lookup(input.tree, "zowe.externalPort")?.cloned())
}

/// Host and port of the first derived discovery endpoint.
fn first_discovery(input: &RenderInput<'_>) -> Option<(String, String)> {
    let first = discovery_list(input.original).into_iter().next()?;
    let rest = first
        .strip_prefix("https://")
        .or_else(|| first.strip_prefix("http://"))?;
    let authority = rest.strip_suffix("/eureka/")?;
    let (host, port) = authority.rsplit_once(':')?;
    let valid = !host.is_empty() && !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit());
    valid.then(|| (host.to_owned(), port.to_owned()))
}

fn mediation_layer_hostname(input: &RenderInput<'_>) -> ZccResult<Option<Value>> {
    if let Some(value) = customized(input, "ZWED_node_mediationLayer_server_hostname") {
        return Ok(Some(value));
    }
    Ok(first_discovery(input).map(|(host, _)| Value::from(host)))
}

fn mediation_layer_port(input: &RenderInput<'_>) -> ZccResult<Option<Value>> {
    if let Some(value) = customized(input, "ZWED_node_mediationLayer_server_port") {
        return Ok(Some(value));
    }
    Ok(first_discovery(input).map(|(_, port)| Value::from(port)))
}

fn mediation_layer_caching_enabled(input: &RenderInput<'_>) -> ZccResult<Option<Value>> {
    if let Some(value) = customized(input, "ZWED_node_mediationLayer_cachingService_enabled") {
        return Ok(Some(value));
    }
    Ok(Some(Value::Bool(
        enabled_anywhere(input.original, "caching-service").is_some(),
    )))
}

/// Merge certificate subtrees in order; later layers win per key and
/// sequences are concatenated.
fn merged_certificate(tree: &Value, layers: &[&str]) -> ZccResult<Value> {
    let mut merged = Value::Object(Map::new());
    for layer in layers {
        if let Some(subtree @ Value::Object(_)) = lookup(tree, layer)? {
            merge_concatenating(&mut merged, subtree.clone());
        }
    }
    Ok(merged)
}

fn merge_concatenating(target: &mut Value, layer: Value) {
    match (target, layer) {
        (Value::Object(existing), Value::Object(map)) => {
            for (key, value) in map {
                match existing.get_mut(&key) {
                    Some(slot) => merge_concatenating(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(existing), Value::Array(items)) => existing.extend(items),
        (slot, value) => *slot = value,
    }
}

fn certificate(input: &RenderInput<'_>, field: &str) -> ZccResult<Option<Value>> {
    let merged = merged_certificate(
        input.tree,
        &[
            "zowe.externalCertificate",
            "zowe.internalCertificate",
            "configs.certificate",
        ],
    )?;
    Ok(lookup(&merged, field)?.cloned())
}

/// Gateway-only internal connector certificate; `fields` are tried in order.
fn gateway_internal(input: &RenderInput<'_>, fields: &[&str]) -> ZccResult<Option<Value>> {
    if input.component_id != Some("gateway") {
        return Ok(None);
    }
    let merged = merged_certificate(
        input.tree,
        &[
            "zowe.externalCertificate",
            "zowe.internalCertificate",
            "configs.internalCertificate",
        ],
    )?;
    for field in fields {
        if let Some(value) = truthy(&merged, field)? {
            return Ok(Some(value.clone()));
        }
    }
    Ok(None)
}
