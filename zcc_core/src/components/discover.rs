//! Non-recursive scan of component roots for manifests.

use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;

use super::DiscoveredComponent;
use crate::ZccResult;
use crate::error::file_error;
use crate::file::read_tree;

/// Manifest file names tried inside a component directory, in order.
///
/// `.manifest.json` is the cached copy the platform leaves in workspace
/// component directories.
pub const MANIFEST_CANDIDATES: &[&str] = &[
    "manifest.yaml",
    "manifest.yml",
    "manifest.json",
    ".manifest.json",
];

/// Discover components under `roots`, in root order.
///
/// Subdirectories within a root are visited in name order. Missing roots are
/// skipped, directories without a manifest are ignored and the first
/// discovery of a component id wins.
///
/// # Errors
///
/// Returns an error when a root cannot be listed or a manifest fails to
/// parse.
pub fn discover_components(roots: &[Utf8PathBuf]) -> ZccResult<Vec<DiscoveredComponent>> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for root in roots {
        if !root.is_dir() {
            continue;
        }
        for (id, manifest_path) in scan_root(root)? {
            if !seen.insert(id.clone()) {
                continue;
            }
            let manifest = read_tree(&manifest_path)?;
            found.push(DiscoveredComponent {
                id,
                manifest_path,
                manifest,
            });
        }
    }
    Ok(found)
}

fn scan_root(root: &Utf8Path) -> ZccResult<Vec<(String, Utf8PathBuf)>> {
    let dir = Dir::open_ambient_dir(root, ambient_authority()).map_err(|err| file_error(root, err))?;
    let mut names = Vec::new();
    for listed in dir.entries().map_err(|err| file_error(root, err))? {
        let entry = listed.map_err(|err| file_error(root, err))?;
        if entry.file_type().map_err(|err| file_error(root, err))?.is_dir() {
            names.push(entry.file_name().map_err(|err| file_error(root, err))?);
        }
    }
    names.sort();
    Ok(names
        .into_iter()
        .filter_map(|name| {
            let manifest = MANIFEST_CANDIDATES
                .iter()
                .find(|candidate| dir.is_file(format!("{name}/{candidate}")))?;
            let path = root.join(&name).join(manifest);
            Some((name, path))
        })
        .collect())
}
