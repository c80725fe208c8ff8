use std::path::Path;
use anyhow::{bail, Result};
use colored::Colorize;
use hvm::config::HvmConfig;
use hvm::error::HvmError;
use hvm::installer::{install, installed_versions, is_installed};
use hvm::link::{activate, active_version};
use hvm::logging::init_logging;
use hvm::paths::{default_config_file, Layout};
use hvm::releases::ReleaseSource;
use hvm::tool::{Platform, Tool};
use hvm::version::is_valid_version;
use tracing::info;
use crate::cli::{HvmCommand, CLI};

pub fn execute(cli: CLI) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let layout = Layout::discover(&config)?;
    layout.ensure_home()?;
    init_logging(&layout, &config.log_level)?;

    match cli.command {
        HvmCommand::Install { tool, positional_version, version } => {
            execute_install(&config, &layout, &tool, version.or(positional_version))
        }
        HvmCommand::Use { tool, version } => {
            execute_use(&layout, &tool, &version)
        }
        HvmCommand::Info => {
            execute_info(&layout)
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<HvmConfig> {
    let config = match explicit {
        Some(path) => HvmConfig::load(path)?,
        None => HvmConfig::load_or_default(default_config_file()?)?,
    };
    Ok(config)
}

fn supported_tool(name: &str) -> Result<Tool> {
    let tool: Tool = name.parse()?;
    tool.ensure_supported()?;
    Ok(tool)
}

pub fn execute_install(
    config: &HvmConfig,
    layout: &Layout,
    name: &str,
    requested: Option<String>,
) -> Result<()> {
    let tool = supported_tool(name)?;
    let source = ReleaseSource::new(config)?;

    let version = match requested.filter(|v| !v.is_empty()) {
        Some(version) => {
            if !is_valid_version(&source, tool, &version)? {
                return Err(HvmError::InvalidVersion { tool: tool.to_string(), version }.into());
            }
            version
        }
        None => {
            let latest = source.latest_version(tool)?;
            info!(tool = %tool, latest = %latest, "resolved latest version");
            latest
        }
    };

    if is_installed(layout, tool, &version) {
        return Err(HvmError::AlreadyInstalled { tool: tool.to_string(), version }.into());
    }

    let platform = Platform::current();
    let installed = install(&source, layout, tool, &version, &platform)?;
    println!(
        "{} {} ({}) version {}",
        "Installed".green().bold(),
        tool,
        platform,
        installed.version
    );
    Ok(())
}

pub fn execute_use(layout: &Layout, name: &str, version: &str) -> Result<()> {
    let tool = supported_tool(name)?;
    if version.is_empty() {
        bail!("use: unknown binary version; please use --version <version>");
    }
    if !is_installed(layout, tool, version) {
        return Err(HvmError::NotInstalled {
            tool: tool.to_string(),
            version: version.to_string(),
        }.into());
    }
    activate(layout, tool, version)?;
    println!(
        "{} {} version {} via {}",
        "Using".green().bold(),
        tool,
        version,
        layout.active_link(tool).display()
    );
    Ok(())
}

pub fn execute_info(layout: &Layout) -> Result<()> {
    let platform = Platform::current();
    println!("Basic system factoids:");
    println!("  OS:           {}", platform.os);
    println!("  Architecture: {}", platform.arch);
    println!("  hvm home:     {}", layout.hvm_home.display());
    println!("  bin dir:      {}", layout.bin_dir.display());
    println!();

    for tool in Tool::supported() {
        let versions = installed_versions(layout, tool)?;
        if versions.is_empty() {
            continue;
        }
        let active = active_version(layout, tool);
        println!("{}", tool.name().bold());
        for version in versions {
            match active.as_deref() == Some(version.as_str()) {
                true => println!("  {} {}", "*".green(), version.green()),
                false => println!("    {}", version),
            }
        }
    }
    Ok(())
}
