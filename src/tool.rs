use std::fmt;
use std::str::FromStr;
use crate::error::HvmError;

/// How the newest release of a tool is discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// The checkpoint versions API returns a JSON record with `current_version`.
    Checkpoint,
    /// The releases site directory index is scraped, newest entry first.
    HtmlListing,
}

/// The closed set of binaries hvm knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Consul,
    ConsulTemplate,
    EnvConsul,
    Nomad,
    Packer,
    Sentinel,
    Terraform,
    Vagrant,
    Vault,
}

impl Tool {
    pub const ALL: [Tool; 9] = [
        Tool::Consul,
        Tool::ConsulTemplate,
        Tool::EnvConsul,
        Tool::Nomad,
        Tool::Packer,
        Tool::Sentinel,
        Tool::Terraform,
        Tool::Vagrant,
        Tool::Vault,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tool::Consul => "consul",
            Tool::ConsulTemplate => "consul-template",
            Tool::EnvConsul => "envconsul",
            Tool::Nomad => "nomad",
            Tool::Packer => "packer",
            Tool::Sentinel => "sentinel",
            Tool::Terraform => "terraform",
            Tool::Vagrant => "vagrant",
            Tool::Vault => "vault",
        }
    }

    /// Returns `None` for tools that are known but not installable yet.
    pub fn source(self) -> Option<SourceKind> {
        match self {
            Tool::Consul | Tool::Nomad | Tool::Packer | Tool::Terraform | Tool::Vagrant => {
                Some(SourceKind::Checkpoint)
            }
            Tool::Vault => Some(SourceKind::HtmlListing),
            Tool::ConsulTemplate | Tool::EnvConsul | Tool::Sentinel => None,
        }
    }

    pub fn is_supported(self) -> bool {
        self.source().is_some()
    }

    /// Fails with [`HvmError::UnsupportedTool`] unless the tool can be resolved and installed.
    pub fn ensure_supported(self) -> Result<SourceKind, HvmError> {
        self.source()
            .ok_or_else(|| HvmError::UnsupportedTool(self.name().to_string()))
    }

    pub fn supported() -> impl Iterator<Item = Tool> {
        Self::ALL.into_iter().filter(|t| t.is_supported())
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tool {
    type Err = HvmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| HvmError::UnsupportedTool(s.to_string()))
    }
}

/// Operating system and architecture in the release site's naming scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: &str, arch: &str) -> Self {
        Self {
            os: os.to_string(),
            arch: arch.to_string(),
        }
    }

    /// The host platform, translated from Rust's names (`macos`, `x86_64`)
    /// to the release site's (`darwin`, `amd64`).
    pub fn current() -> Self {
        let os = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        let arch = match std::env::consts::ARCH {
            "x86_64" => "amd64",
            "x86" => "386",
            "aarch64" => "arm64",
            other => other,
        };
        Self::new(os, arch)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

/// `<tool>_<version>_<os>_<arch>.zip`
pub fn archive_name(tool: Tool, version: &str, platform: &Platform) -> String {
    format!("{}_{}_{}_{}.zip", tool.name(), version, platform.os, platform.arch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_tools() {
        assert_eq!("consul".parse::<Tool>().unwrap(), Tool::Consul);
        assert_eq!("consul-template".parse::<Tool>().unwrap(), Tool::ConsulTemplate);
        assert_eq!("vault".parse::<Tool>().unwrap(), Tool::Vault);
    }

    #[test]
    fn test_parse_unknown_tool() {
        let err = "boundary".parse::<Tool>().unwrap_err();
        assert!(matches!(err, HvmError::UnsupportedTool(name) if name == "boundary"));
    }

    #[test]
    fn test_source_kinds() {
        assert_eq!(Tool::Consul.source(), Some(SourceKind::Checkpoint));
        assert_eq!(Tool::Vagrant.source(), Some(SourceKind::Checkpoint));
        assert_eq!(Tool::Vault.source(), Some(SourceKind::HtmlListing));
        assert_eq!(Tool::Sentinel.source(), None);
        assert!(Tool::EnvConsul.ensure_supported().is_err());
    }

    #[test]
    fn test_supported_set_has_six_tools() {
        let names: Vec<_> = Tool::supported().map(Tool::name).collect();
        assert_eq!(names, vec!["consul", "nomad", "packer", "terraform", "vagrant", "vault"]);
    }

    #[test]
    fn test_archive_name() {
        let platform = Platform::new("linux", "amd64");
        assert_eq!(
            archive_name(Tool::Consul, "1.4.2", &platform),
            "consul_1.4.2_linux_amd64.zip"
        );
    }

    #[test]
    fn test_current_platform_uses_release_names() {
        let platform = Platform::current();
        assert_ne!(platform.os, "macos");
        assert_ne!(platform.arch, "x86_64");
        assert_ne!(platform.arch, "aarch64");
    }
}
