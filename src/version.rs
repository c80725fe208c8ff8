use semver::Version;
use tracing::debug;
use crate::error::{HvmError, Result};
use crate::releases::ReleaseSource;
use crate::tool::Tool;

/// Parses a release version leniently for comparison purposes.
///
/// Accepts a leading `v` and pads missing minor/patch components, so `1.4`
/// compares as `1.4.0`. Pre-release suffixes such as `-beta1` are kept.
pub fn parse_version(version: &str) -> Option<Version> {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    if let Ok(parsed) = Version::parse(version) {
        return Some(parsed);
    }
    let split_at = version.find(['-', '+']).unwrap_or(version.len());
    let (core, suffix) = version.split_at(split_at);
    let parts = core.split('.').count();
    let padded = match parts {
        1 => format!("{core}.0.0{suffix}"),
        2 => format!("{core}.0{suffix}"),
        _ => return None,
    };
    Version::parse(&padded).ok()
}

/// `true` when `version` parses and is at or above `floor`.
pub fn is_at_least(version: &str, floor: &str) -> bool {
    match (parse_version(version), parse_version(floor)) {
        (Some(version), Some(floor)) => version >= floor,
        _ => false,
    }
}

/// Sorts version strings ascending; unparsable entries go first in lexical order.
pub fn sort_versions(versions: &mut [String]) {
    versions.sort_by(|a, b| match (parse_version(a), parse_version(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (None, Some(_)) => std::cmp::Ordering::Less,
        (Some(_), None) => std::cmp::Ordering::Greater,
        (None, None) => a.cmp(b),
    });
}

/// `true` when `version` names a single directory under `<home>/<tool>/`.
///
/// Rejects the empty string, path separators, NUL, and anything starting
/// with `.` (which covers `.`, `..` and hvm's own dot files).
pub fn is_safe_version(version: &str) -> bool {
    !version.is_empty()
        && !version.starts_with('.')
        && !version.contains(['/', '\\', '\0'])
}

/// Fails with [`HvmError::InvalidVersion`] unless [`is_safe_version`] holds.
pub fn ensure_safe_version(tool: Tool, version: &str) -> Result<()> {
    match is_safe_version(version) {
        true => Ok(()),
        false => Err(HvmError::InvalidVersion {
            tool: tool.to_string(),
            version: version.to_string(),
        }),
    }
}

/// Checks whether `version` is a real, installable release of `tool`.
///
/// This is an exact string membership test against the releases listing;
/// there is no range or prefix matching. An empty version is never passed
/// here: callers resolve the latest release instead.
pub fn is_valid_version(source: &ReleaseSource, tool: Tool, version: &str) -> Result<bool> {
    let versions = source.all_versions(tool)?;
    let valid = versions.iter().any(|v| v == version);
    debug!(tool = %tool, version, known = versions.len(), valid, "validated requested version");
    Ok(valid)
}
