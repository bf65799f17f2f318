//! # Assembly Pipeline
//!
//! Fetches chapter payloads with many requests in flight and writes one
//! artifact per day, strictly in day order.
//!
//! ## Model
//!
//! | Role | Count | Does |
//! |------|-------|------|
//! | Worker | `workers` tokio tasks | Pulls the next undispatched chapter, fetches it, stores the payload |
//! | Writer | 1 (the calling task) | Waits for each day to complete, hands it to the [`DayWriter`] |
//!
//! All shared state (per-day completion counts, payload slots, dispatch and
//! write cursors, first error) lives in one mutex-guarded [`PipelineState`].
//! The lock is never held across a fetch or a write.
//!
//! ## Guarantees
//!
//! - Writes happen in ascending day order, each day exactly once.
//! - A worker never dispatches a chapter more than `lookahead` days ahead of
//!   the writer, so at most `lookahead + 1` days of payloads are buffered.
//! - The first fetch or write error aborts the run. Later errors are dropped,
//!   and no day at or after the failing day is written.
//! - Cancellation stops dispatch, interrupts in-flight fetches and releases
//!   buffered payloads.

mod assembler;
mod state;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ChapterRef, Day};

pub use assembler::{Assembler, AssemblySummary, DEFAULT_LOOKAHEAD, DEFAULT_WORKERS, MAX_LOOKAHEAD};
pub use state::{flatten, FetchTask, Phase, PipelineState, Progress};

/// Failure to fetch a single chapter payload
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Failure to store a finished day
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WriteError {
    #[error("Failed to write {path}: {message}")]
    Io { path: String, message: String },

    #[error("Output directory is locked by another run: {0}")]
    Locked(String),

    #[error("Failed to prepare text cleanup: {0}")]
    Cleanup(String),
}

/// Run-wide failure; the first recorded error wins
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Failed to fetch {chapter} for day {}: {source}", .day + 1)]
    Fetch {
        day: usize,
        chapter: String,
        source: FetchError,
    },

    #[error("Failed to write day {}: {source}", .day + 1)]
    Write { day: usize, source: WriteError },

    #[error("Failed to finish output: {0}")]
    Finish(#[source] WriteError),

    #[error("Assembly cancelled")]
    Cancelled,

    #[error("Fetch worker failed: {0}")]
    Worker(String),
}

/// Content store: returns the raw payload for a chapter
#[async_trait]
pub trait ChapterSource: Send + Sync {
    async fn fetch(&self, chapter: &ChapterRef) -> Result<Vec<u8>, FetchError>;
}

/// Artifact sink: receives each finished day in order
#[async_trait]
pub trait DayWriter: Send {
    /// Stores one day; `payloads` are in the day's chapter order
    async fn write_day(&mut self, day: &Day, payloads: Vec<Vec<u8>>) -> Result<(), WriteError>;

    /// Called once after the last day has been written
    async fn finish(&mut self) -> Result<(), WriteError> {
        Ok(())
    }
}
