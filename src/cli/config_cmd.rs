//! Configuration commands

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;

use super::output::Output;
use crate::storage::Config;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration and where it came from
    Show,

    /// Write a default configuration file
    Init {
        /// Destination (defaults to --config, then the global config path)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(cmd: ConfigCommands, config_path: Option<&Path>, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(config_path, output),
        ConfigCommands::Init { path, force } => {
            let target = match path.or_else(|| config_path.map(Path::to_path_buf)) {
                Some(p) => p,
                None => Config::global_config_path()
                    .context("Could not determine a config directory; pass a path")?,
            };
            init(&target, force, output)
        }
    }
}

fn show(config_path: Option<&Path>, output: &Output) -> Result<()> {
    let (config, source) = Config::load(config_path)?;
    let source = source.map(|p| p.display().to_string());

    if output.is_json() {
        output.data(&serde_json::json!({
            "path": source,
            "config": config,
        }));
        return Ok(());
    }

    match &source {
        Some(path) => output.line(&format!("# {}", path)),
        None => output.line("# built-in defaults"),
    }
    output.line(config.to_toml()?.trim_end());

    Ok(())
}

fn init(path: &Path, force: bool, output: &Output) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }

    output.verbose_ctx("config", &format!("Writing defaults to {}", path.display()));
    Config::default().save(path)?;
    output.success(&format!("Wrote default config to {}", path.display()));

    Ok(())
}
