//! Shared filesystem helpers built on `cap-std`.

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::{Dir, OpenOptions};
use std::io::Write;

/// Mode applied to files created by the engine.
pub const NEW_FILE_MODE: u32 = 0o640;

/// Return the parent directory of `path`, falling back to `"."` when the path
/// has no parent or the parent is empty.
pub(crate) fn parent_or_dot(path: &Utf8Path) -> &Utf8Path {
    path.parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."))
}

fn file_name(path: &Utf8Path) -> std::io::Result<&str> {
    path.file_name()
        .ok_or_else(|| std::io::Error::other("cannot determine file name for configuration path"))
}

/// Read `path` through a capability handle on its parent directory.
pub(super) fn read_to_string(path: &Utf8Path) -> std::io::Result<String> {
    let dir = Dir::open_ambient_dir(parent_or_dot(path), ambient_authority())?;
    dir.read_to_string(file_name(path)?)
}

/// Create or truncate `path` and write `contents`, creating parent
/// directories on the way. Newly created files receive [`NEW_FILE_MODE`].
pub(super) fn write_string(path: &Utf8Path, contents: &str) -> std::io::Result<()> {
    let parent = parent_or_dot(path);
    Dir::create_ambient_dir_all(parent, ambient_authority())?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use cap_std::fs_utf8::OpenOptionsExt;
        options.mode(NEW_FILE_MODE);
    }
    let mut file = dir.open_with(file_name(path)?, &options)?;
    file.write_all(contents.as_bytes())?;
    file.flush()
}
