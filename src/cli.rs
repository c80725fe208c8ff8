use std::path::PathBuf;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser, Clone)]
#[clap(author, version, about = "Locally curate HashiCorp binaries for command line use", long_about = None)]
pub struct CLI {
    /// Config file (default is `$HOME/.hvm/hvm.toml`)
    #[clap(long, global = true)]
    pub(crate) config: Option<PathBuf>,
    #[command(subcommand)]
    pub(crate) command: HvmCommand,
}

#[derive(Debug, Subcommand, Clone, PartialEq)]
pub enum HvmCommand {
    /// Install a supported binary at the latest available or specified version
    Install {
        /// consul, nomad, packer, terraform, vagrant or vault
        tool: String,
        /// Version to install; defaults to the latest release
        #[clap(value_name = "VERSION")]
        positional_version: Option<String>,
        /// Version to install; defaults to the latest release
        #[clap(long, conflicts_with = "positional_version")]
        version: Option<String>,
    },
    /// Make an installed version the one found on the PATH via `~/bin/<tool>`
    Use {
        tool: String,
        #[clap(long)]
        version: String,
    },
    /// Host information and installed versions
    Info,
}
