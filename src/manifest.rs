use std::collections::HashMap;
use tracing::debug;
use crate::error::{HvmError, Result};
use crate::tool::Tool;
use crate::version::is_at_least;

/// First nomad release whose SHA256SUMS lists files as `./<name>`.
pub const NOMAD_PREFIXED_MANIFEST_SINCE: &str = "0.7.0-beta1";

/// Parsed `<tool>_<version>_SHA256SUMS`: archive filename to hex digest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumManifest {
    entries: HashMap<String, String>,
}

impl ChecksumManifest {
    /// Parses `<digest>  <filename>` lines.
    ///
    /// Blank lines are ignored. For nomad at or above
    /// [`NOMAD_PREFIXED_MANIFEST_SINCE`] a leading `./` is removed from
    /// filenames; older nomad manifests and every other tool are keyed as-is.
    pub fn parse(tool: Tool, version: &str, text: &str) -> Result<Self> {
        let strip_prefix = tool == Tool::Nomad && is_at_least(version, NOMAD_PREFIXED_MANIFEST_SINCE);
        let malformed = |reason: String| HvmError::ManifestParse {
            tool: tool.to_string(),
            version: version.to_string(),
            reason,
        };

        let mut entries = HashMap::new();
        for (number, line) in text.lines().enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [] => continue,
                [digest, filename] => {
                    if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                        return Err(malformed(format!("line {}: {digest:?} is not a sha256 digest", number + 1)));
                    }
                    let filename = match strip_prefix {
                        true => filename.strip_prefix("./").unwrap_or(filename),
                        false => filename,
                    };
                    entries.insert(filename.to_string(), digest.to_ascii_lowercase());
                }
                _ => return Err(malformed(format!("line {}: expected `<digest> <filename>`", number + 1))),
            }
        }
        debug!(tool = %tool, version, entries = entries.len(), strip_prefix, "parsed SHA256SUMS");
        Ok(Self { entries })
    }

    pub fn digest_for(&self, filename: &str) -> Option<&str> {
        self.entries.get(filename).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const B: &str = "BBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB";

    #[test]
    fn test_parse_plain_manifest() {
        let text = format!("{A}  consul_1.4.2_linux_amd64.zip\n{B}  consul_1.4.2_darwin_amd64.zip\n\n");
        let manifest = ChecksumManifest::parse(Tool::Consul, "1.4.2", &text).unwrap();
        assert_eq!(manifest.digest_for("consul_1.4.2_linux_amd64.zip"), Some(A));
        assert_eq!(manifest.digest_for("consul_1.4.2_darwin_amd64.zip"), Some(B.to_ascii_lowercase().as_str()));
        assert_eq!(manifest.digest_for("consul_1.4.2_windows_amd64.zip"), None);
    }

    #[test]
    fn test_new_nomad_manifest_strips_dot_slash() {
        let text = format!("{A}  ./nomad_0.8.5_linux_amd64.zip\n");
        let manifest = ChecksumManifest::parse(Tool::Nomad, "0.8.5", &text).unwrap();
        assert_eq!(manifest.digest_for("nomad_0.8.5_linux_amd64.zip"), Some(A));
    }

    #[test]
    fn test_boundary_release_strips_dot_slash() {
        let text = format!("{A}  ./nomad_0.7.0-beta1_linux_amd64.zip\n");
        let manifest = ChecksumManifest::parse(Tool::Nomad, "0.7.0-beta1", &text).unwrap();
        assert_eq!(manifest.digest_for("nomad_0.7.0-beta1_linux_amd64.zip"), Some(A));
    }

    #[test]
    fn test_old_nomad_manifest_used_unmodified() {
        let text = format!("{A}  nomad_0.6.0_linux_amd64.zip\n{B}  ./nomad_0.6.0_darwin_amd64.zip\n");
        let manifest = ChecksumManifest::parse(Tool::Nomad, "0.6.0", &text).unwrap();
        assert_eq!(manifest.digest_for("nomad_0.6.0_linux_amd64.zip"), Some(A));
        assert!(manifest.digest_for("nomad_0.6.0_darwin_amd64.zip").is_none());
        assert!(manifest.digest_for("./nomad_0.6.0_darwin_amd64.zip").is_some());
    }

    #[test]
    fn test_other_tools_keep_prefix() {
        let text = format!("{A}  ./vault_1.0.3_linux_amd64.zip\n");
        let manifest = ChecksumManifest::parse(Tool::Vault, "1.0.3", &text).unwrap();
        assert!(manifest.digest_for("vault_1.0.3_linux_amd64.zip").is_none());
    }

    #[test]
    fn test_malformed_lines_are_rejected() {
        let wrong_fields = format!("{A}  consul.zip extra\n");
        assert!(matches!(
            ChecksumManifest::parse(Tool::Consul, "1.4.2", &wrong_fields),
            Err(HvmError::ManifestParse { .. })
        ));
        assert!(matches!(
            ChecksumManifest::parse(Tool::Consul, "1.4.2", "<html>not found</html>"),
            Err(HvmError::ManifestParse { .. })
        ));
        assert!(matches!(
            ChecksumManifest::parse(Tool::Consul, "1.4.2", "deadbeef  consul.zip"),
            Err(HvmError::ManifestParse { .. })
        ));
    }
}
