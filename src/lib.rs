//! bsb-plan - Bible reading plans and daily audio/text bundles
//!
//! Turns the canonical book and chapter table into a day-by-day reading
//! schedule, then assembles one artifact per day by fetching chapter
//! payloads concurrently and writing days strictly in order.

pub mod cli;
pub mod domain;
pub mod pipeline;
pub mod storage;

pub use domain::{build_plan, Corpus, Day, Plan, ScheduleConfig, TrackSet};
pub use pipeline::{Assembler, ChapterSource, DayWriter, PipelineError};
