//! Temporary directory fixture for configuration documents.
//!
//! # Examples
//!
//! ```
//! use zcc_test_helpers::workspace::TempWorkspace;
//!
//! # fn main() -> anyhow::Result<()> {
//! let ws = TempWorkspace::new()?;
//! let path = ws.write("zowe.yaml", "zowe:\n  jobPrefix: ZWE\n")?;
//! assert_eq!(ws.read("zowe.yaml")?, "zowe:\n  jobPrefix: ZWE\n");
//! assert!(path.starts_with(ws.root()));
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

/// A temporary directory removed on drop, addressed with UTF-8 paths.
#[derive(Debug)]
pub struct TempWorkspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl TempWorkspace {
    /// Create an empty workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or its path is not
    /// valid UTF-8.
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temporary workspace")?;
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|path| anyhow!("non UTF-8 temporary path: {}", path.display()))?;
        Ok(Self { _dir: dir, root })
    }

    /// Root directory of the workspace.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Absolute path of `relative` inside the workspace.
    #[must_use]
    pub fn path(&self, relative: &str) -> Utf8PathBuf {
        self.root.join(relative)
    }

    /// Write `contents` to `relative`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or its parents cannot be written.
    pub fn write(&self, relative: &str, contents: &str) -> Result<Utf8PathBuf> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
        }
        std::fs::write(&path, contents).with_context(|| format!("write {path}"))?;
        Ok(path)
    }

    /// Create the directory `relative` (and its parents).
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn mkdir(&self, relative: &str) -> Result<Utf8PathBuf> {
        let path = self.path(relative);
        std::fs::create_dir_all(&path).with_context(|| format!("create {path}"))?;
        Ok(path)
    }

    /// Read `relative` as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn read(&self, relative: &str) -> Result<String> {
        let path = self.path(relative);
        std::fs::read_to_string(&path).with_context(|| format!("read {path}"))
    }

    /// Whether `relative` exists inside the workspace.
    #[must_use]
    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }
}
