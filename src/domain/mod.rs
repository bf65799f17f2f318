//! Domain models for bsb-plan
//!
//! Corpus, tracks, and the scheduler. Pure logic without I/O, apart from
//! loading a corpus index file.

mod corpus;
mod naming;
mod schedule;
mod track;

pub use corpus::{
    Book, ChapterRef, Corpus, CorpusError, Preset, Selection, OLD_NEW_BOUNDARY, PROVERBS, PSALMS,
};
pub use naming::{artifact_name, MAX_NAME_LEN};
pub use schedule::{
    build_plan, days_needed, Calendar, Day, Plan, PlanOrder, PlanStats, Rates, ScheduleConfig,
    WeekdaySet, MAX_PLAN_DAYS,
};
pub use track::{TrackKind, TrackSet};
