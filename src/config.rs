use std::path::{Path, PathBuf};
use serde::Deserialize;
use crate::error::{HvmError, Result};

pub const DEFAULT_RELEASES_URL: &str = "https://releases.hashicorp.com";
pub const DEFAULT_CHECKPOINT_URL: &str = "https://checkpoint-api.hashicorp.com";

/// Represents the contents of an `hvm.toml` file.
///
/// Every key is optional; a missing file is the same as an empty one.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HvmConfig {
    /// Base URL of the releases site (directory listings, manifests, archives).
    pub releases_url: String,
    /// Base URL of the checkpoint versions API.
    pub checkpoint_url: String,
    /// Timeout for the checkpoint lookup, in seconds.
    pub checkpoint_timeout_secs: u64,
    /// Timeout for every other request (listings, manifests, archives), in seconds.
    pub http_timeout_secs: u64,
    /// Default log filter when `HVM_LOG` is unset.
    pub log_level: String,
    /// Directory holding the active-version links. Defaults to `~/bin`.
    pub bin_dir: Option<PathBuf>,
}

impl Default for HvmConfig {
    fn default() -> Self {
        Self {
            releases_url: DEFAULT_RELEASES_URL.to_string(),
            checkpoint_url: DEFAULT_CHECKPOINT_URL.to_string(),
            checkpoint_timeout_secs: 2,
            http_timeout_secs: 120,
            log_level: "info".to_string(),
            bin_dir: None,
        }
    }
}

impl HvmConfig {
    /// Loads an `HvmConfig` from a file path.
    ///
    /// # Errors
    /// Returns an error if the file can't be read or deserialized.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<HvmConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| HvmError::io(path, e))?;
        toml::from_str(&content)
            .map_err(|e| HvmError::Config(format!("{}: {e}", path.display())))
    }

    /// Loads the file if it exists, otherwise returns the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<HvmConfig> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(HvmConfig::default())
        }
    }
}
