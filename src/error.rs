//! Error type shared by every stage of the release pipeline.
//!
//! Each install phase has its own variant so the command line can say exactly
//! which step failed. Nothing here is retried; callers surface the message and
//! exit.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, HvmError>;

#[derive(Debug, Error)]
pub enum HvmError {
    #[error("unable to determine user home directory")]
    HomeDirUnavailable,

    #[error("failed to fetch {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to fetch {url}: server responded with {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("could not determine latest version of {tool}: {reason}")]
    UnparsableMetadata { tool: String, reason: String },

    #[error("binary {0} is currently unsupported")]
    UnsupportedTool(String),

    #[error("{version} is not a version of {tool} that can be installed")]
    InvalidVersion { tool: String, version: String },

    #[error("{tool} version {version} appears to be already installed")]
    AlreadyInstalled { tool: String, version: String },

    #[error("{tool} version {version} is not installed; run `hvm install {tool} --version {version}` first")]
    NotInstalled { tool: String, version: String },

    #[error("no checksum for {filename} in the {tool} {version} SHA256SUMS manifest")]
    ChecksumNotFound {
        tool: String,
        version: String,
        filename: String,
    },

    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("directory creation error for {path}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed SHA256SUMS manifest for {tool} {version}: {reason}")]
    ManifestParse {
        tool: String,
        version: String,
        reason: String,
    },

    #[error("archive error: {0}")]
    Archive(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to lock {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} exists and is not a symbolic link managed by hvm; refusing to replace it")]
    SymlinkConflict(PathBuf),

    #[error("configuration error: {0}")]
    Config(String),
}

impl HvmError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn network(url: &str, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.to_string(),
            source,
        }
    }

    pub(crate) fn unparsable(tool: impl ToString, reason: impl Into<String>) -> Self {
        Self::UnparsableMetadata {
            tool: tool.to_string(),
            reason: reason.into(),
        }
    }
}
