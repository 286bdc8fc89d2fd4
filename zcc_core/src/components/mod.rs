//! Component manifest discovery and default layering.
//!
//! Components live in subdirectories of a small set of roots (runtime
//! components, extensions, the workspace). Each may carry a manifest whose
//! `configs` subtree supplies defaults for `components.<id>`.

mod discover;

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Map, Value};

use crate::diagnostics::Context;
use crate::tree::{self, merge_defaults};

pub use discover::{MANIFEST_CANDIDATES, discover_components};

/// Components shipped with the platform runtime.
pub const CORE_COMPONENTS: &[&str] = &[
    "gateway",
    "discovery",
    "api-catalog",
    "app-server",
    "zss",
    "jobs-api",
    "files-api",
    "explorer-jes",
    "explorer-mvs",
    "explorer-uss",
];

/// Components shipped with the runtime but not yet part of the core set.
pub const CORE_CANDIDATES: &[&str] = &["caching-service"];

/// Members of the `DESKTOP` launch group.
pub const DESKTOP_GROUP: &[&str] = &["app-server", "zss"];

/// Members of the `GATEWAY` launch group.
pub const GATEWAY_GROUP: &[&str] = &[
    "gateway",
    "discovery",
    "api-catalog",
    "jobs-api",
    "files-api",
    "explorer-jes",
    "explorer-mvs",
    "explorer-uss",
];

/// A component found on disk together with its parsed manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredComponent {
    /// Component identifier (the directory name).
    pub id: String,
    /// Manifest file the component was discovered through.
    pub manifest_path: Utf8PathBuf,
    /// Parsed manifest document.
    pub manifest: Value,
}

impl DiscoveredComponent {
    /// The manifest's `configs` defaults, when declared as a mapping.
    #[must_use]
    pub fn defaults(&self) -> Option<&Map<String, Value>> {
        self.manifest.get("configs").and_then(Value::as_object)
    }
}

/// Roots scanned for components, in precedence order.
///
/// `<zowe.runtimeDirectory>/components` comes first, then
/// `zowe.extensionDirectory`, then `workspace`. Unset directories are skipped.
#[must_use]
pub fn component_roots(tree: &Value, workspace: &Utf8Path) -> Vec<Utf8PathBuf> {
    let configured = |pointer: &str| {
        tree.pointer(pointer)
            .and_then(Value::as_str)
            .filter(|dir| !dir.is_empty())
            .map(Utf8PathBuf::from)
    };
    let mut roots = Vec::new();
    if let Some(runtime) = configured("/zowe/runtimeDirectory") {
        roots.push(runtime.join("components"));
    }
    roots.extend(configured("/zowe/extensionDirectory"));
    roots.push(workspace.to_path_buf());
    roots
}

/// Layer manifest defaults beneath `components.<id>` for every component.
///
/// User values are never overwritten. A component missing from the tree
/// receives its defaults verbatim.
pub fn apply_defaults(tree: &mut Value, components: &[DiscoveredComponent], ctx: &Context) {
    for component in components {
        let Some(defaults) = component.defaults() else {
            continue;
        };
        ctx.note(format!(
            "Applying defaults of component {} from {}",
            component.id, component.manifest_path
        ));
        let path = tree::TreePath::from_segments(vec![
            tree::Segment::Key("components".to_owned()),
            tree::Segment::Key(component.id.clone()),
        ]);
        let layer = Value::Object(defaults.clone());
        match path.get_mut(tree) {
            Some(existing) if !existing.is_null() => merge_defaults(existing, &layer),
            _ => path.set(tree, layer),
        }
    }
}
