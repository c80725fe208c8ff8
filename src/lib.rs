//! # hvm Core Library
//!
//! This crate contains the release pipeline behind the `hvm` tool: it finds out
//! which versions of a HashiCorp binary exist, downloads and checksum-verifies
//! the archive for one of them, installs it side by side with other versions
//! under `~/.hvm/<tool>/<version>/`, and points `~/bin/<tool>` at the one to use.
//!
//! The pipeline is strictly sequential: resolve, validate, check installed,
//! fetch and verify, and later, separately, switch.
//!
//! ## Modules Overview
//! - [`tool`] – The closed set of supported tools and platform naming
//! - [`releases`] – Resolving latest and known versions (checkpoint API or listing scrape)
//! - [`listing`] – Parsing the releases site's directory indexes
//! - [`version`] – Version comparison and validation of requested versions
//! - [`manifest`] – `SHA256SUMS` parsing
//! - [`download`] – Checksum-verified downloads
//! - [`installer`] – Installing versions and answering "is it installed"
//! - [`link`] – Switching the active version via `~/bin/<tool>`
//! - [`lock`] – Advisory lock around installs
//! - [`paths`], [`config`], [`logging`], [`error`] – Layout, `hvm.toml`, log file, errors


pub mod error;
pub mod tool;
pub mod config;
pub mod paths;
pub mod logging;
pub mod listing;
pub mod releases;
pub mod version;
pub mod manifest;
pub mod download;
pub mod lock;
pub mod installer;
pub mod link;

pub use error::{HvmError, Result};
pub use tool::*;
pub use config::HvmConfig;
pub use paths::Layout;
pub use releases::ReleaseSource;
pub use version::is_valid_version;
pub use manifest::ChecksumManifest;
pub use installer::{install, is_installed, InstalledVersion};
pub use link::{activate, active_version};
