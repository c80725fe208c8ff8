use std::path::{Path, PathBuf};
use directories::BaseDirs;
use crate::config::HvmConfig;
use crate::error::{HvmError, Result};
use crate::tool::Tool;

#[cfg(windows)]
pub const EXEC_EXT: &str = "exe";
#[cfg(not(windows))]
pub const EXEC_EXT: &str = "";

/// On-disk layout: the install tree under `~/.hvm` and the link directory `~/bin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub hvm_home: PathBuf,
    pub bin_dir: PathBuf,
}

/// Returns the current user's home directory.
pub fn user_home() -> Result<PathBuf> {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .ok_or(HvmError::HomeDirUnavailable)
}

/// Default location of the configuration file, `~/.hvm/hvm.toml`.
pub fn default_config_file() -> Result<PathBuf> {
    Ok(user_home()?.join(".hvm").join("hvm.toml"))
}

impl Layout {
    /// `<root>/.hvm` and `<root>/bin`.
    pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self {
            hvm_home: root.join(".hvm"),
            bin_dir: root.join("bin"),
        }
    }

    /// Layout rooted at the user's home directory, honouring a configured `bin_dir`.
    pub fn discover(config: &HvmConfig) -> Result<Self> {
        let mut layout = Self::with_root(user_home()?);
        if let Some(bin_dir) = &config.bin_dir {
            layout.bin_dir = bin_dir.clone();
        }
        Ok(layout)
    }

    pub fn tool_dir(&self, tool: Tool) -> PathBuf {
        self.hvm_home.join(tool.name())
    }

    /// `<home>/<tool>/<version>`
    pub fn version_dir(&self, tool: Tool, version: &str) -> PathBuf {
        self.tool_dir(tool).join(version)
    }

    /// `<home>/<tool>/<version>/<tool>`
    pub fn executable(&self, tool: Tool, version: &str) -> PathBuf {
        self.version_dir(tool, version)
            .join(tool.name())
            .with_extension(EXEC_EXT)
    }

    /// `<bin-dir>/<tool>`
    pub fn active_link(&self, tool: Tool) -> PathBuf {
        self.bin_dir.join(tool.name()).with_extension(EXEC_EXT)
    }

    pub fn lock_file(&self, tool: Tool) -> PathBuf {
        self.tool_dir(tool).join(".lock")
    }

    pub fn log_file(&self) -> PathBuf {
        self.hvm_home.join("hvm.log")
    }

    /// Creates `~/.hvm` if needed. Run once per process before anything else.
    pub fn ensure_home(&self) -> Result<()> {
        std::fs::create_dir_all(&self.hvm_home).map_err(|e| HvmError::DirectoryCreate {
            path: self.hvm_home.clone(),
            source: e,
        })
    }
}
