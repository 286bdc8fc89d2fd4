//! Flat-to-tree rules.

use serde_json::Value;

use super::{ImportFn, ImportRule, MappingEntry};
use crate::ZccResult;
use crate::components::{CORE_COMPONENTS, DESKTOP_GROUP, GATEWAY_GROUP};
use crate::diagnostics::Context;
use crate::flat::FlatNamespace;
use crate::tree::{self, Segment, TreePath};

/// Import rules keyed by flat variable name.
pub static IMPORT_TABLE: &[ImportRule] = &[
    computed("APIML_ALLOW_ENCODED_SLASHES", allow_encoded_slashes),
    computed("APIML_CORS_ENABLED", cors_enabled),
    computed("APIML_DEBUG_MODE_ENABLED", debug_mode_enabled),
    ignore("APIML_ENABLE_SSO"),
    path("APIML_GATEWAY_INTERNAL_HOST", "zowe.gatewayInternalHost"),
    path("APIML_GATEWAY_INTERNAL_PORT", "zowe.gatewayInternalPort"),
    path("APIML_GATEWAY_TIMEOUT_MILLIS", "components.gateway.apiml.gateway.timeoutMillis"),
    path(
        "APIML_GATEWAY_EXTERNAL_MAPPER",
        "components.gateway.apiml.security.x509.externalMapperUrl",
    ),
    path(
        "APIML_MAX_CONNECTIONS_PER_ROUTE",
        "components.gateway.server.maxConnectionsPerRoute",
    ),
    path("APIML_MAX_TOTAL_CONNECTIONS", "components.gateway.server.maxTotalConnections"),
    computed("APIML_PREFER_IP_ADDRESS", prefer_ip_address),
    path("APIML_SECURITY_AUTH_PROVIDER", "components.gateway.apiml.security.auth.provider"),
    path(
        "APIML_SECURITY_AUTHORIZATION_ENDPOINT_URL",
        "components.gateway.apiml.security.authorization.endpoint.url",
    ),
    computed("APIML_SECURITY_X509_ENABLED", x509_enabled),
    paths(
        "APIML_SECURITY_ZOSMF_APPLID",
        &["zOSMF.applId", "components.gateway.apiml.security.zosmf.applid"],
    ),
    path("CATALOG_PORT", "components.api-catalog.port"),
    path("DISCOVERY_PORT", "components.discovery.port"),
    computed("EXTERNAL_COMPONENTS", external_components),
    path("FILES_API_PORT", "components.files-api.port"),
    paths("GATEWAY_PORT", &["zowe.externalPort", "components.gateway.port"]),
    path("JAVA_HOME", "java.home"),
    path("JAVA_OPTIONS", "java.options"),
    path("JES_EXPLORER_UI_PORT", "components.explorer-jes.port"),
    path("JOBS_API_PORT", "components.jobs-api.port"),
    computed("LAUNCH_COMPONENT_GROUPS", launch_component_groups),
    path("MVS_EXPLORER_UI_PORT", "components.explorer-mvs.port"),
    path("NODE_HOME", "node.home"),
    path("NODE_OPTIONS", "node.options"),
    path("PKCS11_TOKEN_LABEL", "zowe.sso.token.label"),
    path("PKCS11_TOKEN_NAME", "zowe.sso.token.name"),
    path("ROOT_DIR", "zowe.runtimeDirectory"),
    ignore("SKIP_NODE"),
    path("STATIC_DEF_CONFIG_DIR", "components.discovery.staticApiDefinitionsDirectories"),
    path("USS_EXPLORER_UI_PORT", "components.explorer-uss.port"),
    path("ZOSMF_HOST", "zOSMF.host"),
    path("ZOSMF_PORT", "zOSMF.port"),
    computed("ZOWE_APIM_VERIFY_CERTIFICATES", verify_certificates),
    ignore("ZWE_DISCOVERY_SERVICES_LIST"),
    paths(
        "ZOWE_EXPLORER_FRAME_ANCESTORS",
        &[
            "components.explorer-jes.frameAncestors",
            "components.explorer-mvs.frameAncestors",
            "components.explorer-uss.frameAncestors",
        ],
    ),
    computed("ZOWE_EXPLORER_HOST", external_hosts),
    path("ZWE_EXTENSION_DIR", "zowe.extensionDirectory"),
    path("ZOWE_INSTANCE", "zowe.identifier"),
    path("ZOWE_LOOPBACK_ADDRESS", "zowe.loopbackIp"),
    path("ZOWE_PREFIX", "zowe.jobPrefix"),
    path("ZOWE_ZLUX_SERVER_HTTPS_PORT", "components.app-server.port"),
    path("ZOWE_ZSS_SERVER_PORT", "components.zss.port"),
    path("ZOWE_ZSS_XMEM_SERVER_NAME", "components.zss.crossMemoryServerName"),
    path(
        "ZWE_CACHING_EVICTION_STRATEGY",
        "components.caching-service.storage.evictionStrategy",
    ),
    path("ZWE_CACHING_SERVICE_PERSISTENT", "components.caching-service.storage.mode"),
    path("ZWE_CACHING_SERVICE_PORT", "components.caching-service.port"),
    path(
        "ZWE_CACHING_SERVICE_VSAM_DATASET",
        "components.caching-service.storage.vsam.name",
    ),
    path("ZWE_CACHING_STORAGE_SIZE", "components.caching-service.storage.size"),
    computed("ZWE_LAUNCH_COMPONENTS", launch_components),
    ignore("ZWE_ENVIRONMENT_PREPARED"),
    computed("ZWE_EXTERNAL_HOSTS", external_hosts),
    computed("ZWE_REFERRER_HOSTS", referrer_hosts),
    path("ZWE_LOG_LEVEL_ZWELS", "zowe.launchScript.logLevel"),
    path(
        "ZWEAD_EXTERNAL_STATIC_DEF_DIRECTORIES",
        "components.discovery.alternativeStaticApiDefinitionsDirectories",
    ),
    paths(
        "EXTERNAL_CERTIFICATE_AUTHORITIES",
        &[
            "zowe.externalCertificate.trustStore.certificateAuthorities",
            "zowe.internalCertificate.trustStore.certificateAuthorities",
        ],
    ),
    paths(
        "KEY_ALIAS",
        &[
            "zowe.externalCertificate.keystore.alias",
            "zowe.internalCertificate.keystore.alias",
        ],
    ),
    paths(
        "KEYSTORE_CERTIFICATE_AUTHORITY",
        &[
            "zowe.externalCertificate.pem.certificateAuthority",
            "zowe.internalCertificate.pem.certificateAuthority",
        ],
    ),
    paths(
        "KEYSTORE_CERTIFICATE",
        &[
            "zowe.externalCertificate.pem.certificate",
            "zowe.internalCertificate.pem.certificate",
        ],
    ),
    paths(
        "KEYSTORE_KEY",
        &["zowe.externalCertificate.pem.key", "zowe.internalCertificate.pem.key"],
    ),
    paths(
        "KEYSTORE_PASSWORD",
        &[
            "zowe.externalCertificate.keystore.password",
            "zowe.internalCertificate.keystore.password",
        ],
    ),
    paths(
        "KEYSTORE_TYPE",
        &[
            "zowe.externalCertificate.keystore.type",
            "zowe.internalCertificate.keystore.type",
        ],
    ),
    paths(
        "KEYSTORE",
        &[
            "zowe.externalCertificate.keystore.file",
            "zowe.internalCertificate.keystore.file",
        ],
    ),
    paths(
        "TRUSTSTORE",
        &[
            "zowe.externalCertificate.trustStore.file",
            "zowe.internalCertificate.trustStore.file",
        ],
    ),
];

/// Find the rule for `key`.
pub(super) fn lookup(key: &str) -> Option<MappingEntry<ImportFn>> {
    IMPORT_TABLE
        .iter()
        .find(|rule| rule.key == key)
        .map(|rule| rule.entry)
}

const fn ignore(key: &'static str) -> ImportRule {
    ImportRule {
        key,
        entry: MappingEntry::Ignore,
    }
}

const fn path(key: &'static str, target: &'static str) -> ImportRule {
    ImportRule {
        key,
        entry: MappingEntry::Path(target),
    }
}

const fn paths(key: &'static str, targets: &'static [&'static str]) -> ImportRule {
    ImportRule {
        key,
        entry: MappingEntry::Paths(targets),
    }
}

const fn computed(key: &'static str, rule: ImportFn) -> ImportRule {
    ImportRule {
        key,
        entry: MappingEntry::Computed(rule),
    }
}

fn string_to_bool(value: &str) -> Value {
    Value::Bool(value.eq_ignore_ascii_case("true"))
}

fn set_flag(tree: &mut Value, targets: &[&str], value: &str) -> ZccResult<()> {
    for target in targets {
        tree::set(tree, target, string_to_bool(value))?;
    }
    Ok(())
}

fn allow_encoded_slashes(
    value: &str,
    _flat: &FlatNamespace,
    tree: &mut Value,
    _ctx: &Context,
) -> ZccResult<()> {
    set_flag(tree, &["components.gateway.apiml.service.allowEncodedSlashes"], value)
}

fn cors_enabled(value: &str, _flat: &FlatNamespace, tree: &mut Value, _ctx: &Context) -> ZccResult<()> {
    set_flag(tree, &["components.gateway.apiml.service.corsEnabled"], value)
}

fn debug_mode_enabled(
    value: &str,
    _flat: &FlatNamespace,
    tree: &mut Value,
    _ctx: &Context,
) -> ZccResult<()> {
    set_flag(
        tree,
        &[
            "components.gateway.debug",
            "components.discovery.debug",
            "components.api-catalog.debug",
            "components.caching-service.debug",
        ],
        value,
    )
}

fn prefer_ip_address(
    value: &str,
    _flat: &FlatNamespace,
    tree: &mut Value,
    _ctx: &Context,
) -> ZccResult<()> {
    set_flag(
        tree,
        &[
            "components.gateway.apiml.service.preferIpAddress",
            "components.discovery.apiml.service.preferIpAddress",
            "components.api-catalog.environment.preferIpAddress",
            "components.caching-service.environment.preferIpAddress",
        ],
        value,
    )
}

fn x509_enabled(value: &str, _flat: &FlatNamespace, tree: &mut Value, _ctx: &Context) -> ZccResult<()> {
    set_flag(tree, &["components.gateway.apiml.security.x509.enabled"], value)
}

fn verify_certificates(
    value: &str,
    _flat: &FlatNamespace,
    tree: &mut Value,
    _ctx: &Context,
) -> ZccResult<()> {
    set_flag(
        tree,
        &[
            "components.gateway.apiml.security.ssl.verifySslCertificatesOfServices",
            "components.discovery.apiml.security.ssl.verifySslCertificatesOfServices",
            "components.caching-service.apiml.security.ssl.verifySslCertificatesOfServices",
        ],
        value,
    )
}

fn external_components(
    value: &str,
    _flat: &FlatNamespace,
    tree: &mut Value,
    ctx: &Context,
) -> ZccResult<()> {
    enable_components(value.split(','), tree, ctx);
    Ok(())
}

fn launch_components(
    value: &str,
    _flat: &FlatNamespace,
    tree: &mut Value,
    ctx: &Context,
) -> ZccResult<()> {
    enable_components(value.split(','), tree, ctx);
    Ok(())
}

/// Expand component groups unless an explicit component list is present.
fn launch_component_groups(
    value: &str,
    flat: &FlatNamespace,
    tree: &mut Value,
    ctx: &Context,
) -> ZccResult<()> {
    if flat.is_set("ZWE_LAUNCH_COMPONENTS") {
        return Ok(());
    }
    let gateway = value.contains("GATEWAY");
    let desktop = value.contains("DESKTOP");
    let components: &[&str] = match (gateway, desktop) {
        (true, true) => CORE_COMPONENTS,
        (true, false) => GATEWAY_GROUP,
        (false, true) => DESKTOP_GROUP,
        (false, false) => &[],
    };
    enable_components(components.iter().copied(), tree, ctx);
    Ok(())
}

fn enable_components<'a>(names: impl Iterator<Item = &'a str>, tree: &mut Value, ctx: &Context) {
    for name in names.map(str::trim).filter(|name| !name.is_empty()) {
        if name.contains(['/', '\\']) {
            ctx.note(format!("Unsupported component value \"{name}\""));
            continue;
        }
        TreePath::from_segments(vec![
            Segment::Key("components".to_owned()),
            Segment::Key(name.to_owned()),
            Segment::Key("enabled".to_owned()),
        ])
        .set(tree, Value::Bool(true));
    }
}

fn external_hosts(value: &str, _flat: &FlatNamespace, tree: &mut Value, _ctx: &Context) -> ZccResult<()> {
    append_unique(tree, "zowe.externalDomains", value)
}

fn referrer_hosts(value: &str, _flat: &FlatNamespace, tree: &mut Value, _ctx: &Context) -> ZccResult<()> {
    append_unique(tree, "zowe.referrerHosts", value)
}

/// Append comma-separated `value` items to the sequence at `target`,
/// skipping blanks and items already present.
fn append_unique(tree: &mut Value, target: &str, value: &str) -> ZccResult<()> {
    let path = TreePath::parse(target)?;
    let mut items = match path.get(tree) {
        Some(Value::Array(existing)) => existing.clone(),
        _ => Vec::new(),
    };
    for item in value.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        let candidate = Value::from(item);
        if !items.contains(&candidate) {
            items.push(candidate);
        }
    }
    path.set(tree, Value::Array(items));
    Ok(())
}
