//! Main CLI application structure

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use super::output::{Output, OutputFormat};
use super::{books, build_cmd, config_cmd, plan_cmd};
use crate::domain::Corpus;
use crate::storage::Config;

#[derive(Parser)]
#[command(name = "bsb-plan")]
#[command(author, version, about = "Bible reading plans with daily audio and text bundles")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Config file (defaults to the global config, if present)
    #[arg(long, global = true, env = "BSB_PLAN_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Corpus index JSON (`[{name, startFile, chapters}]`) to use instead of the built-in table
    #[arg(long, global = true, value_name = "PATH")]
    pub corpus: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the books of the corpus
    Books,

    /// List book presets
    Presets,

    /// Preview a reading plan
    Plan(plan_cmd::PlanArgs),

    /// Fetch chapters and write one file per day
    Build(build_cmd::BuildArgs),

    /// Show or create the configuration file
    #[command(subcommand)]
    Config(config_cmd::ConfigCommands),
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let output = Output::new(cli.format, cli.verbose);

    output.verbose("bsb-plan starting");

    match cli.command {
        Commands::Books => books::list(&output, &load_corpus(cli.corpus.as_deref(), &output)?)?,
        Commands::Presets => books::presets(&output)?,

        Commands::Plan(args) => {
            let config = load_config(cli.config.as_deref(), &output)?;
            let corpus = load_corpus(cli.corpus.as_deref(), &output)?;
            plan_cmd::run(args, &config.schedule, &corpus, &output)?
        }

        Commands::Build(args) => {
            let config = load_config(cli.config.as_deref(), &output)?;
            let corpus = load_corpus(cli.corpus.as_deref(), &output)?;
            build_cmd::run(args, &config, &corpus, &output)?
        }

        Commands::Config(cmd) => config_cmd::run(cmd, cli.config.as_deref(), &output)?,
    }

    output.verbose("Command completed successfully");
    Ok(())
}

/// Diagnostics go to stderr; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&Path>, output: &Output) -> Result<Config> {
    let (config, source) = Config::load(path)?;
    match source {
        Some(p) => output.verbose_ctx("config", &format!("Loaded {}", p.display())),
        None => output.verbose_ctx("config", "Using built-in defaults"),
    }
    Ok(config)
}

fn load_corpus(path: Option<&Path>, output: &Output) -> Result<Corpus> {
    match path {
        Some(p) => {
            let corpus = Corpus::load(p)
                .with_context(|| format!("Failed to load corpus index: {}", p.display()))?;
            output.verbose_ctx(
                "corpus",
                &format!("{} books from {}", corpus.books().len(), p.display()),
            );
            Ok(corpus)
        }
        None => Ok(Corpus::canonical()),
    }
}
