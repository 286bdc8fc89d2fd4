//! Materializing a composed document into a workspace directory.
//!
//! [`convert`] writes, for each selected instance:
//!
//! - `.zowe.yaml` and `.zowe.json`: the composed document with component
//!   defaults applied;
//! - `.zowe-<instance>.yaml`: the resolved instance tree;
//! - `.instance-<instance>.env`: the instance rendered as a legacy file;
//! - `<component>/.configs-<instance>.json`: the component subtree;
//! - `<component>/.instance-<instance>.env`: the component view rendered as a
//!   legacy file.
//!
//! Writes are not transactional; a failure part way leaves earlier files in
//! place.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;

use crate::components::{apply_defaults, component_roots, discover_components};
use crate::diagnostics::Context;
use crate::error::precondition;
use crate::file::{self, Format};
use crate::instance::{DEFAULT_INSTANCE_ID, instance_ids, resolve_instance};
use crate::mapping::{RenderInput, render_env, to_flat};
use crate::ZccResult;

/// Environment variable naming the workspace directory.
pub const WORKSPACE_ENV: &str = "WORKSPACE_DIR";

/// Which instances a conversion materializes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceSelection {
    /// `default` followed by every declared instance.
    All,
    /// A single instance.
    Only(String),
}

impl InstanceSelection {
    /// Concrete instance ids for `base`.
    #[must_use]
    pub fn ids(&self, base: &Value) -> Vec<String> {
        match self {
            Self::Only(id) => vec![id.clone()],
            Self::All => {
                let mut ids = vec![DEFAULT_INSTANCE_ID.to_owned()];
                for id in instance_ids(base) {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                ids
            }
        }
    }
}

/// Files written by a conversion, in write order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertReport {
    /// Instances that were materialized.
    pub instances: Vec<String>,
    /// Every file written.
    pub written: Vec<Utf8PathBuf>,
}

/// Compose `root` and layer defaults from the components visible from
/// `workspace`.
///
/// # Errors
///
/// Propagates composition and manifest discovery failures.
pub fn prepare_base(root: &Utf8Path, workspace: &Utf8Path, ctx: &Context) -> ZccResult<Value> {
    ctx.note(format!("Reading {root} ..."));
    let mut base = file::resolve(root)?;
    let roots = component_roots(&base, workspace);
    let components = discover_components(&roots)?;
    apply_defaults(&mut base, &components, ctx);
    Ok(base)
}

/// Render one instance, or one component of it, as legacy file text.
///
/// # Errors
///
/// Propagates instance resolution and mapping failures.
pub fn render_instance_env(
    base: &Value,
    instance_id: &str,
    component_id: Option<&str>,
    ctx: &Context,
) -> ZccResult<String> {
    let resolved = resolve_instance(base, instance_id, ctx)?;
    let tree = component_id
        .and_then(|id| resolved.components.iter().find(|view| view.component_id == id))
        .map_or(&resolved.tree, |view| &view.tree);
    let input = RenderInput {
        tree,
        instance_id,
        component_id,
        original: base,
    };
    Ok(render_env(&to_flat(&input, ctx)?))
}

/// Write `.instance-<id>.env` next to `document` for every selected instance.
///
/// # Errors
///
/// Propagates composition, resolution, mapping and write failures.
pub fn write_instance_envs(
    document: &Utf8Path,
    selection: &InstanceSelection,
    ctx: &Context,
) -> ZccResult<Vec<Utf8PathBuf>> {
    let base = file::resolve(document)?;
    let dir = file::parent_or_dot(document);
    let mut written = Vec::new();
    for id in selection.ids(&base) {
        let text = render_instance_env(&base, &id, None, ctx)?;
        let path = dir.join(format!(".instance-{id}.env"));
        write(&path, &text, ctx, &mut written)?;
    }
    Ok(written)
}

/// Convert `root` into the workspace layout.
///
/// Preconditions are checked before anything is written.
///
/// # Errors
///
/// Returns [`crate::ZccError::PreconditionMissing`] without a workspace or
/// with an empty instance id; otherwise propagates composition, resolution,
/// mapping and write failures.
pub fn convert(
    root: &Utf8Path,
    workspace_dir: Option<&Utf8Path>,
    selection: &InstanceSelection,
    ctx: &Context,
) -> ZccResult<ConvertReport> {
    let Some(workspace) = workspace_dir.filter(|dir| !dir.as_str().is_empty()) else {
        return Err(precondition(format!("Environment {WORKSPACE_ENV} is required")));
    };
    if matches!(selection, InstanceSelection::Only(id) if id.is_empty()) {
        return Err(precondition("HA instance id is required"));
    }

    let base = prepare_base(root, workspace, ctx)?;
    ctx.note(format!("Converting {root} ..."));
    let mut report = ConvertReport::default();
    write(
        &workspace.join(".zowe.yaml"),
        &file::render(&base, Format::Yaml)?,
        ctx,
        &mut report.written,
    )?;
    write(
        &workspace.join(".zowe.json"),
        &file::render(&base, Format::Json)?,
        ctx,
        &mut report.written,
    )?;

    for id in selection.ids(&base) {
        let resolved = resolve_instance(&base, &id, ctx)?;
        write(
            &workspace.join(format!(".zowe-{id}.yaml")),
            &file::render(&resolved.tree, Format::Yaml)?,
            ctx,
            &mut report.written,
        )?;
        let instance_input = RenderInput {
            tree: &resolved.tree,
            instance_id: &id,
            component_id: None,
            original: &base,
        };
        write(
            &workspace.join(format!(".instance-{id}.env")),
            &render_env(&to_flat(&instance_input, ctx)?),
            ctx,
            &mut report.written,
        )?;

        for view in &resolved.components {
            let component_dir = workspace.join(&view.component_id);
            write(
                &component_dir.join(format!(".configs-{id}.json")),
                &file::render(view.configs(), Format::Json)?,
                ctx,
                &mut report.written,
            )?;
            let component_input = RenderInput {
                tree: &view.tree,
                instance_id: &id,
                component_id: Some(view.component_id.as_str()),
                original: &base,
            };
            write(
                &component_dir.join(format!(".instance-{id}.env")),
                &render_env(&to_flat(&component_input, ctx)?),
                ctx,
                &mut report.written,
            )?;
        }
        report.instances.push(id);
    }
    Ok(report)
}

fn write(
    path: &Utf8Path,
    contents: &str,
    ctx: &Context,
    written: &mut Vec<Utf8PathBuf>,
) -> ZccResult<()> {
    ctx.note(format!("Writing {path}"));
    file::write_text(path, contents)?;
    written.push(path.to_path_buf());
    Ok(())
}
