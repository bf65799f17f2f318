//! # Storage Layer
//!
//! Everything that touches the filesystem or the network.
//!
//! ## Layout
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Config | TOML | `~/.config/bsb-plan/config.toml` or `--config` |
//! | Chapter payloads | raw bytes | `{base}/{global_id}.{ext}` (HTTP or local dir) |
//! | Day artifacts | audio or HTML | `{out}/Day_{n}_{summary}.{ext}` |
//! | Manifest | JSON | `{out}/manifest.json` |
//!
//! ## Concurrency Safety
//!
//! - [`DirectoryWriter`] holds an `fs2` lock on `{out}/.bsb-plan.lock`
//! - Day files, the manifest and credits are written atomically (temp file + rename)

mod config;
mod fragment;
mod source;
mod writer;

pub use config::{Config, ConfigError, PipelineSection, ScheduleSection, SourceSection};
pub use fragment::FragmentCleaner;
pub use source::{DirSource, HttpSource};
pub use writer::{ArtifactKind, DirectoryWriter, Manifest, ManifestEntry};
