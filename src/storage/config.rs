//! Configuration handling for bsb-plan
//!
//! Configuration is stored as TOML. It is read from an explicit `--config`
//! path (or `$BSB_PLAN_CONFIG`), falling back to
//! `~/.config/bsb-plan/config.toml`, then to built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    Calendar, PlanOrder, Preset, Rates, ScheduleConfig, Selection, WeekdaySet,
};
use crate::pipeline::{DEFAULT_LOOKAHEAD, DEFAULT_WORKERS, MAX_LOOKAHEAD};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Reading selection and pacing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSection {
    /// Old Testament chapters per day
    pub old_per_day: u32,

    /// New Testament chapters per day
    pub new_per_day: u32,

    /// Psalms per day (only when `split_psalms` is set)
    pub psalms_per_day: u32,

    /// Proverbs per day (only when `split_proverbs` is set)
    pub proverbs_per_day: u32,

    /// Read Psalms as its own track
    pub split_psalms: bool,

    /// Read Proverbs as its own track
    pub split_proverbs: bool,

    pub order: PlanOrder,

    /// Restart exhausted tracks instead of letting them go quiet
    pub pad_with_repeats: bool,

    /// Attach calendar dates and skip non-reading weekdays
    pub use_dates: bool,

    /// First date of the plan (defaults to today)
    pub start_date: Option<NaiveDate>,

    /// Reading weekdays, 0 = Sunday through 6 = Saturday
    pub reading_days: Vec<u8>,

    /// Explicit books; empty with no presets means the whole corpus
    pub books: Vec<String>,

    pub presets: Vec<Preset>,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            old_per_day: 3,
            new_per_day: 1,
            psalms_per_day: 1,
            proverbs_per_day: 1,
            split_psalms: false,
            split_proverbs: false,
            order: PlanOrder::Mixed,
            pad_with_repeats: false,
            use_dates: true,
            start_date: None,
            reading_days: vec![0, 1, 2, 3, 4, 5, 6],
            books: vec![],
            presets: vec![],
        }
    }
}

impl ScheduleSection {
    /// Scheduler input, using `today` when no start date is set
    pub fn to_schedule(&self, today: NaiveDate) -> ScheduleConfig {
        let calendar = self.use_dates.then(|| Calendar {
            start: self.start_date.unwrap_or(today),
            weekdays: WeekdaySet::from_numbers(self.reading_days.iter().copied()),
        });

        ScheduleConfig {
            rates: Rates {
                old: self.old_per_day,
                new: self.new_per_day,
                psalms: self.psalms_per_day,
                proverbs: self.proverbs_per_day,
            },
            order: self.order,
            pad_with_repeats: self.pad_with_repeats,
            calendar,
        }
    }

    pub fn selection(&self) -> Selection {
        Selection::from_parts(&self.books, &self.presets)
    }
}

/// Where chapter payloads come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    /// Base URL for per-chapter audio (`{base}/{id}.{ext}`)
    pub audio_base_url: String,

    /// Base URL for per-chapter text fragments
    pub text_base_url: String,

    pub audio_extension: String,

    pub text_extension: String,

    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            audio_base_url: "https://benkaiser.github.io/bsb-plan-generator/audio_processed"
                .to_string(),
            text_base_url:
                "https://benkaiser.github.io/bsb-plan-generator/bsb_unzipped/bsb - final - 7-18-21/OEBPS/Text"
                    .to_string(),
            audio_extension: "mp3".to_string(),
            text_extension: "htm".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Concurrency limits for assembly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    /// Parallel chapter fetches
    pub workers: usize,

    /// Days fetches may run ahead of the writer
    pub lookahead: usize,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            lookahead: DEFAULT_LOOKAHEAD,
        }
    }
}

/// Full configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schedule: ScheduleSection,
    pub source: SourceSection,
    pub pipeline: PipelineSection,
}

impl Config {
    /// Loads configuration from `path`, or the global location when `None`.
    ///
    /// Returns the config and the file it came from, if any.
    pub fn load(path: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let path = match path {
            Some(p) => {
                if !p.exists() {
                    anyhow::bail!("Config file not found: {}", p.display());
                }
                p.to_path_buf()
            }
            None => match Self::global_config_path() {
                Some(p) if p.exists() => p,
                _ => return Ok((Self::default(), None)),
            },
        };

        let config = Self::load_file(&path)?;
        Ok((config, Some(path)))
    }

    /// Loads and validates a specific file
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Failed to load config: {}", path.display()))?;
        Ok(config)
    }

    /// Parses and validates TOML content
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "bsb-plan", "bsb-plan").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns the global config file path
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Checks values that TOML types alone cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(day) = self.schedule.reading_days.iter().find(|d| **d > 6) {
            return Err(ConfigError::Invalid(format!(
                "reading_days entries must be 0-6 (0 = Sunday), got {}",
                day
            )));
        }

        if self.pipeline.workers == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.workers must be at least 1".to_string(),
            ));
        }

        if self.pipeline.lookahead > MAX_LOOKAHEAD {
            return Err(ConfigError::Invalid(format!(
                "pipeline.lookahead must be at most {}, got {}",
                MAX_LOOKAHEAD, self.pipeline.lookahead
            )));
        }

        for (name, ext) in [
            ("audio_extension", &self.source.audio_extension),
            ("text_extension", &self.source.text_extension),
        ] {
            if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(ConfigError::Invalid(format!(
                    "source.{} must be alphanumeric, got '{}'",
                    name, ext
                )));
            }
        }

        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Writes the configuration, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        fs::write(path, self.to_toml()?)
            .with_context(|| format!("Failed to write config: {}", path.display()))
    }
}
