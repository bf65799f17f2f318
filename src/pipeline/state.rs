//! Shared pipeline state
//!
//! Owned by the assembler behind a single mutex. Workers call
//! [`PipelineState::next_task`], [`PipelineState::complete`] and
//! [`PipelineState::fail`]; the writer calls [`PipelineState::take_day`] and
//! [`PipelineState::advance`]. Nothing here awaits.

use std::collections::HashMap;

use serde::Serialize;

use super::PipelineError;
use crate::domain::{ChapterRef, Plan};

/// One chapter fetch, positioned within the plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTask {
    pub day_index: usize,
    pub chapter_index: usize,
    pub chapter: ChapterRef,
}

impl FetchTask {
    pub fn global_id(&self) -> u32 {
        self.chapter.global_id
    }
}

/// Linearizes a plan: day order, then chapter order within the day
pub fn flatten(plan: &Plan) -> Vec<FetchTask> {
    plan.days()
        .iter()
        .flat_map(|day| {
            day.chapters
                .iter()
                .enumerate()
                .map(move |(chapter_index, chapter)| FetchTask {
                    day_index: day.index,
                    chapter_index,
                    chapter: chapter.clone(),
                })
        })
        .collect()
}

/// Result of asking for the next task
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Dispatch {
    Task(FetchTask),
    /// The next task is too far ahead of the writer
    Wait,
    /// Nothing left to dispatch, or the run has failed
    Done,
}

/// Current stage of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Starting,
    Assembling,
    Finished,
    Failed,
    Cancelled,
}

/// Snapshot published to progress subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Progress {
    pub phase: Phase,
    pub fetched_chapters: usize,
    pub total_chapters: usize,
    pub written_days: usize,
    pub total_days: usize,
    pub buffered_days: usize,
}

/// Mutable state shared between workers and the writer
#[derive(Debug)]
pub struct PipelineState {
    tasks: Vec<FetchTask>,
    day_sizes: Vec<usize>,
    completed: Vec<usize>,
    /// Payload slots per day, indexed by chapter position
    slots: Vec<Vec<Option<Vec<u8>>>>,
    next_dispatch: usize,
    write_cursor: usize,
    lookahead: usize,
    first_error: Option<PipelineError>,
    fetched: usize,
    /// Day taken by the writer but not yet advanced past
    writing: bool,
    peak_buffered: usize,
    /// Positions waiting on a fetch already dispatched for the same chapter
    inflight: HashMap<u32, Vec<(usize, usize)>>,
    /// Last slot filled for each chapter id; stale once its day is taken
    stored: HashMap<u32, (usize, usize)>,
    reused: usize,
}

impl PipelineState {
    pub fn new(plan: &Plan, lookahead: usize) -> Self {
        let day_sizes: Vec<usize> = plan.days().iter().map(|d| d.chapters.len()).collect();
        let slots = day_sizes.iter().map(|n| vec![None; *n]).collect();

        Self {
            tasks: flatten(plan),
            completed: vec![0; day_sizes.len()],
            day_sizes,
            slots,
            next_dispatch: 0,
            write_cursor: 0,
            lookahead,
            first_error: None,
            fetched: 0,
            writing: false,
            peak_buffered: 0,
            inflight: HashMap::new(),
            stored: HashMap::new(),
            reused: 0,
        }
    }

    /// Hands out the next task if it is within the lookahead window.
    ///
    /// A chapter already being fetched, or still buffered for a later day,
    /// is not fetched again: its position is filled from the same payload.
    pub(crate) fn next_task(&mut self) -> Dispatch {
        loop {
            if self.first_error.is_some() {
                return Dispatch::Done;
            }

            let Some(task) = self.tasks.get(self.next_dispatch) else {
                return Dispatch::Done;
            };

            if task.day_index.saturating_sub(self.write_cursor) > self.lookahead {
                return Dispatch::Wait;
            }

            let task = task.clone();
            let id = task.global_id();
            self.next_dispatch += 1;

            if let Some(waiting) = self.inflight.get_mut(&id) {
                waiting.push((task.day_index, task.chapter_index));
                continue;
            }

            if let Some(payload) = self.buffered_payload(id) {
                self.store(id, task.day_index, task.chapter_index, payload);
                self.reused += 1;
                continue;
            }

            self.inflight.insert(id, Vec::new());
            return Dispatch::Task(task);
        }
    }

    /// Stores a fetched payload, along with every position waiting on the
    /// same chapter. Payloads arriving after a failure are dropped.
    pub fn complete(&mut self, task: &FetchTask, payload: Vec<u8>) {
        if self.first_error.is_some() {
            return;
        }

        let id = task.global_id();
        for (day, chapter) in self.inflight.remove(&id).unwrap_or_default() {
            self.store(id, day, chapter, payload.clone());
            self.reused += 1;
        }
        self.store(id, task.day_index, task.chapter_index, payload);

        self.peak_buffered = self.peak_buffered.max(self.buffered_days());
    }

    fn store(&mut self, id: u32, day: usize, chapter: usize, payload: Vec<u8>) {
        let slot = &mut self.slots[day][chapter];
        if slot.is_none() {
            *slot = Some(payload);
            self.completed[day] += 1;
            self.fetched += 1;
            self.stored.insert(id, (day, chapter));
        }
    }

    fn buffered_payload(&self, id: u32) -> Option<Vec<u8>> {
        let (day, chapter) = *self.stored.get(&id)?;
        self.slots[day][chapter].clone()
    }

    /// Records an error unless one is already recorded, releasing buffered
    /// payloads. Returns the error that won.
    pub fn fail(&mut self, error: PipelineError) -> PipelineError {
        if self.first_error.is_none() {
            self.first_error = Some(error);
            self.release();
        }

        self.first_error.clone().unwrap_or(PipelineError::Cancelled)
    }

    pub fn error(&self) -> Option<&PipelineError> {
        self.first_error.as_ref()
    }

    /// Returns true once every chapter of `day` has been stored
    pub fn is_day_complete(&self, day: usize) -> bool {
        self.completed.get(day) == self.day_sizes.get(day)
    }

    /// Takes the day's payloads out of shared state for writing.
    ///
    /// Returns `None` while the day is incomplete.
    pub fn take_day(&mut self, day: usize) -> Option<Vec<Vec<u8>>> {
        if self.first_error.is_some() || day != self.write_cursor || !self.is_day_complete(day) {
            return None;
        }

        let payloads: Option<Vec<Vec<u8>>> = self.slots[day].iter_mut().map(Option::take).collect();
        if payloads.is_some() {
            self.writing = true;
            self.peak_buffered = self.peak_buffered.max(self.buffered_days());
        }
        payloads
    }

    /// Moves the write cursor past the day just written
    pub fn advance(&mut self) {
        self.writing = false;
        self.write_cursor += 1;
    }

    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    /// Days holding at least one payload, including a day being written
    pub fn buffered_days(&self) -> usize {
        let end = self
            .write_cursor
            .saturating_add(self.lookahead)
            .saturating_add(1)
            .min(self.slots.len());
        let start = self.write_cursor.min(end);
        let stored = self.slots[start..end]
            .iter()
            .filter(|day| day.iter().any(Option::is_some))
            .count();

        stored + usize::from(self.writing)
    }

    pub fn peak_buffered_days(&self) -> usize {
        self.peak_buffered
    }

    /// Chapter positions filled so far, fetched or reused
    pub fn fetched(&self) -> usize {
        self.fetched
    }

    /// Positions filled from a payload fetched for another position
    pub fn reused(&self) -> usize {
        self.reused
    }

    pub fn progress(&self, phase: Phase) -> Progress {
        Progress {
            phase,
            fetched_chapters: self.fetched,
            total_chapters: self.tasks.len(),
            written_days: self.write_cursor,
            total_days: self.day_sizes.len(),
            buffered_days: self.buffered_days(),
        }
    }

    fn release(&mut self) {
        for day in &mut self.slots {
            day.iter_mut().for_each(|slot| *slot = None);
        }
        self.inflight.clear();
        self.stored.clear();
        self.writing = false;
    }
}
