//! `zcc yaml` handlers.

use std::io::Write;

use camino::Utf8Path;
use serde_json::Value;
use zcc_core::env_file::read_with_certificates;
use zcc_core::instance::DEFAULT_INSTANCE_ID;
use zcc_core::workspace::{self, InstanceSelection};
use zcc_core::{Context, ZccResultExt, editor, file};

use crate::cli::{ConvertArgs, ToEnvArgs};
use crate::error::Result;
use crate::settings::WorkspaceSettings;

/// Print the composed document as indented JSON.
///
/// # Errors
///
/// Propagates composition and output failures.
pub fn read<W: Write>(file: &Utf8Path, out: &mut W) -> Result<()> {
    let tree = file::resolve(file)?;
    let rendered = serde_json::to_string_pretty(&tree).into_zcc()?;
    writeln!(out, "{rendered}")?;
    Ok(())
}

/// Convert `args.file` into the workspace.
///
/// # Errors
///
/// Propagates settings and conversion failures, including the missing
/// workspace or instance id preconditions.
pub fn convert(args: &ConvertArgs, ctx: &Context) -> Result<()> {
    let settings = WorkspaceSettings::load(&WorkspaceSettings {
        workspace_dir: args.workspace_dir.clone(),
        ha_instance_id: args.ha_instance_id.clone(),
    })?;
    let selection = if args.all_instances {
        InstanceSelection::All
    } else {
        InstanceSelection::Only(settings.instance_id_or_hostname())
    };
    let report = workspace::convert(
        &args.file,
        settings.workspace_dir.as_deref(),
        &selection,
        ctx,
    )?;
    ctx.note(format!(
        "Converted {} into {} files",
        report.instances.join(", "),
        report.written.len()
    ));
    Ok(())
}

/// Render `.instance-<id>.env` files for the document, or a single instance
/// into `args.output`.
///
/// # Errors
///
/// Propagates settings, rendering and write failures.
pub fn to_env(args: &ToEnvArgs, ctx: &Context) -> Result<()> {
    let settings = WorkspaceSettings::load(&WorkspaceSettings {
        workspace_dir: None,
        ha_instance_id: args.ha_instance_id.clone(),
    })?;
    ctx.note(format!("Converting {} ...", args.file));
    let Some(output) = args.output.as_deref() else {
        let selection = settings
            .instance_id()
            .map_or(InstanceSelection::All, |id| InstanceSelection::Only(id.to_owned()));
        workspace::write_instance_envs(&args.file, &selection, ctx)?;
        return Ok(());
    };
    let id = settings.instance_id().unwrap_or(DEFAULT_INSTANCE_ID);
    let base = file::resolve(&args.file)?;
    let text = workspace::render_instance_env(&base, id, None, ctx)?;
    file::write_text(output, &text)?;
    ctx.note(format!("Wrote {output}"));
    Ok(())
}

/// Set `path` in `file` to `value`, keeping the rest of the file as written.
///
/// # Errors
///
/// Propagates read, edit and write failures.
pub fn update(file: &Utf8Path, path: &str, value: &str, ctx: &Context) -> Result<()> {
    ctx.note(format!("Updating {file} value of \"{path}\" to \"{value}\""));
    editor::update_file(file, path, Value::String(value.to_owned()))?;
    Ok(())
}

/// Remove `path` from `file`.
///
/// # Errors
///
/// Propagates read, edit and write failures.
pub fn delete(file: &Utf8Path, path: &str, ctx: &Context) -> Result<()> {
    ctx.note(format!("Deleting \"{path}\" from {file}"));
    if !editor::delete_file(file, path)? {
        ctx.note(format!("\"{path}\" is not set in {file}"));
    }
    Ok(())
}

/// Apply every setting of `env_file` to `yaml_file`.
///
/// # Errors
///
/// Propagates read, mapping, edit and write failures.
pub fn update_all(env_file: &Utf8Path, yaml_file: &Utf8Path, ctx: &Context) -> Result<()> {
    let flat = read_with_certificates(env_file)?;
    let edits = editor::update_file_from_flat(&flat, yaml_file, ctx)?;
    ctx.note(format!("Applied {edits} updates to {yaml_file}"));
    Ok(())
}
