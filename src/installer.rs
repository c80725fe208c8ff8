use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use crate::download::fetch_verified;
use crate::error::{HvmError, Result};
use crate::lock::InstallLock;
use crate::manifest::ChecksumManifest;
use crate::paths::{Layout, EXEC_EXT};
use crate::releases::ReleaseSource;
use crate::tool::{archive_name, Platform, Tool};
use crate::version::{ensure_safe_version, is_safe_version, sort_versions};

/// A version whose executable is present in the install tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledVersion {
    pub tool: Tool,
    pub version: String,
    pub path: PathBuf,
}

/// Checks whether `<home>/<tool>/<version>/<tool>` exists.
///
/// The file itself is the only record of an install, so an interrupted
/// install that never placed the executable reads as not installed.
pub fn is_installed(layout: &Layout, tool: Tool, version: &str) -> bool {
    is_safe_version(version) && layout.executable(tool, version).is_file()
}

/// Installed versions of `tool`, oldest first.
pub fn installed_versions(layout: &Layout, tool: Tool) -> Result<Vec<String>> {
    let tool_dir = layout.tool_dir(tool);
    if !tool_dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(&tool_dir).map_err(|e| HvmError::io(&tool_dir, e))?;
    let mut versions = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| HvmError::io(&tool_dir, e))?;
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.starts_with('.') && is_installed(layout, tool, &name) {
            versions.push(name);
        }
    }
    sort_versions(&mut versions);
    Ok(versions)
}

/// Downloads, verifies and installs `version` of `tool` for `platform`.
///
/// Runs under the tool's advisory lock. The executable is moved into
/// `<home>/<tool>/<version>/<tool>` only after the archive checksum has been
/// verified and extracted, so every failure leaves the version uninstalled.
/// A version directory created by this call is removed again on failure.
pub fn install(
    source: &ReleaseSource,
    layout: &Layout,
    tool: Tool,
    version: &str,
    platform: &Platform,
) -> Result<InstalledVersion> {
    tool.ensure_supported()?;
    ensure_safe_version(tool, version)?;

    let _lock = InstallLock::acquire(layout.lock_file(tool))?;
    if is_installed(layout, tool, version) {
        return Err(HvmError::AlreadyInstalled {
            tool: tool.to_string(),
            version: version.to_string(),
        });
    }

    let version_dir = layout.version_dir(tool, version);
    let created = !version_dir.exists();
    std::fs::create_dir_all(&version_dir).map_err(|e| HvmError::DirectoryCreate {
        path: version_dir.clone(),
        source: e,
    })?;

    info!(tool = %tool, version, platform = %platform, "installing");
    match fetch_and_place(source, layout, tool, version, platform) {
        Ok(installed) => {
            info!(tool = %tool, version, path = %installed.path.display(), "installed");
            Ok(installed)
        }
        Err(e) => {
            warn!(tool = %tool, version, error = %e, "install failed");
            if created {
                let _ = std::fs::remove_dir_all(&version_dir);
            }
            Err(e)
        }
    }
}

fn fetch_and_place(
    source: &ReleaseSource,
    layout: &Layout,
    tool: Tool,
    version: &str,
    platform: &Platform,
) -> Result<InstalledVersion> {
    let manifest_text = source.fetch_text(&source.manifest_url(tool, version))?;
    let manifest = ChecksumManifest::parse(tool, version, &manifest_text)?;

    let filename = archive_name(tool, version, platform);
    let digest = manifest
        .digest_for(&filename)
        .ok_or_else(|| HvmError::ChecksumNotFound {
            tool: tool.to_string(),
            version: version.to_string(),
            filename: filename.clone(),
        })?;

    let url = source.archive_url(tool, version, platform, digest);
    let archive = fetch_verified(source.client(), &url)?;

    let version_dir = layout.version_dir(tool, version);
    let staging = tempfile::Builder::new()
        .prefix(".staging-")
        .tempdir_in(&version_dir)
        .map_err(|e| HvmError::io(&version_dir, e))?;
    extract_zip(&archive, staging.path())?;

    let extracted = find_executable(staging.path(), tool)?;
    set_executable(&extracted)?;
    let target = layout.executable(tool, version);
    std::fs::rename(&extracted, &target).map_err(|e| HvmError::io(&target, e))?;

    Ok(InstalledVersion {
        tool,
        version: version.to_string(),
        path: target,
    })
}

/// Extracts a zip held in memory into `dest_dir`, refusing entries that escape it.
pub fn extract_zip(bytes: &[u8], dest_dir: &Path) -> Result<()> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| HvmError::Archive(format!("failed to read zip archive: {e}")))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| HvmError::Archive(format!("failed to read archive entry {i}: {e}")))?;
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| HvmError::Archive(format!("unsafe path in archive: {}", entry.name())))?;
        let output_path = dest_dir.join(&relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&output_path).map_err(|e| HvmError::io(&output_path, e))?;
            continue;
        }
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| HvmError::io(parent, e))?;
        }
        let mut outfile =
            std::fs::File::create(&output_path).map_err(|e| HvmError::io(&output_path, e))?;
        std::io::copy(&mut entry, &mut outfile).map_err(|e| HvmError::io(&output_path, e))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&output_path, std::fs::Permissions::from_mode(mode & 0o777))
                .map_err(|e| HvmError::io(&output_path, e))?;
        }
    }
    debug!(entries = archive.len(), dest = %dest_dir.display(), "extracted archive");
    Ok(())
}

/// Finds the file named after the tool anywhere in the extracted tree.
fn find_executable(root: &Path, tool: Tool) -> Result<PathBuf> {
    let wanted = Path::new(tool.name()).with_extension(EXEC_EXT);
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.file_name() == wanted.file_name())
        .min_by_key(|path| path.components().count())
        .ok_or_else(|| HvmError::Archive(format!("archive does not contain an executable named {}", wanted.display())))
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let metadata = std::fs::metadata(path).map_err(|e| HvmError::io(path, e))?;
    let mut permissions = metadata.permissions();
    permissions.set_mode(permissions.mode() | 0o755);
    std::fs::set_permissions(path, permissions).map_err(|e| HvmError::io(path, e))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}
