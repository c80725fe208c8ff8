use std::path::Path;
use tracing::{debug, info};
use crate::error::{HvmError, Result};
use crate::paths::Layout;
use crate::tool::Tool;
use crate::version::ensure_safe_version;

/// Makes `<bin-dir>/<tool>` a symbolic link to `<home>/<tool>/<version>/<tool>`.
///
/// The version must already be installed; callers check this first. An
/// existing link is replaced (remove, then create). Anything at the link path
/// that is not a symbolic link was not created by hvm and is left alone with
/// a [`HvmError::SymlinkConflict`]. A version that is not a plain directory
/// name is refused with [`HvmError::InvalidVersion`].
///
/// # Examples
///
/// ```no_run
/// use hvm::{activate, Layout, Tool};
///
/// let layout = Layout::with_root("/home/alice");
/// activate(&layout, Tool::Consul, "1.4.2").unwrap();
/// ```
pub fn activate(layout: &Layout, tool: Tool, version: &str) -> Result<()> {
    ensure_safe_version(tool, version)?;
    let target = layout.executable(tool, version);
    let link = layout.active_link(tool);

    std::fs::create_dir_all(&layout.bin_dir).map_err(|e| HvmError::DirectoryCreate {
        path: layout.bin_dir.clone(),
        source: e,
    })?;

    // symlink_metadata so a dangling link still counts as ours
    match std::fs::symlink_metadata(&link) {
        Ok(metadata) if metadata.file_type().is_symlink() => {
            debug!(link = %link.display(), "removing previous link");
            std::fs::remove_file(&link).map_err(|e| HvmError::io(&link, e))?;
        }
        Ok(_) => return Err(HvmError::SymlinkConflict(link)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(HvmError::io(&link, e)),
    }

    create_link(&target, &link)?;
    info!(tool = %tool, version, link = %link.display(), "activated");
    Ok(())
}

#[cfg(unix)]
fn create_link(target: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, link).map_err(|e| HvmError::io(link, e))
}

#[cfg(windows)]
fn create_link(target: &Path, link: &Path) -> Result<()> {
    std::os::windows::fs::symlink_file(target, link).map_err(|e| HvmError::io(link, e))
}

/// The version the tool's link currently points at, if it points into the install tree.
pub fn active_version(layout: &Layout, tool: Tool) -> Option<String> {
    let link = layout.active_link(tool);
    let metadata = std::fs::symlink_metadata(&link).ok()?;
    if !metadata.file_type().is_symlink() {
        return None;
    }
    let target = std::fs::read_link(&link).ok()?;
    let version_dir = target.parent()?;
    if version_dir.parent()? != layout.tool_dir(tool).as_path() {
        return None;
    }
    version_dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
}
