//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `books` | List the corpus (built-in or `--corpus` JSON) |
//! | `presets` | List preset book groups |
//! | `plan` | Build a schedule and preview its days |
//! | `build` | Fetch chapters and write one artifact per day |
//! | `config show`, `config init` | Inspect or create the TOML config |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug output and progress lines:
//! ```bash
//! bsb-plan --verbose build --out ./plan --preset gospels
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod books;
mod build_cmd;
mod config_cmd;
mod output;
mod plan_cmd;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};
