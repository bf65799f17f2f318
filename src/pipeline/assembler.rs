//! Worker pool and ordered writer

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{watch, Notify};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::state::{Dispatch, Phase, PipelineState, Progress};
use super::{ChapterSource, DayWriter, PipelineError};
use crate::domain::{Plan, MAX_PLAN_DAYS};

/// Parallel fetches when not configured
pub const DEFAULT_WORKERS: usize = 20;

/// Days a worker may run ahead of the writer when not configured
pub const DEFAULT_LOOKAHEAD: usize = 20;

/// Largest accepted lookahead; no plan is longer than this
pub const MAX_LOOKAHEAD: usize = MAX_PLAN_DAYS;

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssemblySummary {
    pub days_written: usize,
    /// Chapters downloaded from the source
    pub chapters_fetched: usize,
    /// Repeated chapters filled from an earlier download
    pub chapters_reused: usize,
    pub peak_buffered_days: usize,
    #[serde(serialize_with = "as_millis")]
    pub elapsed: Duration,
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u128(d.as_millis())
}

struct Shared {
    state: Mutex<PipelineState>,
    /// Signalled when a fetch completes or an error is recorded
    fetched: Notify,
    /// Signalled when the write cursor moves or the run fails
    advanced: Notify,
    progress: Arc<watch::Sender<Progress>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, phase: Phase) {
        let snapshot = self.lock().progress(phase);
        self.progress.send_replace(snapshot);
    }

    /// Records an error and wakes everyone waiting on the run
    fn fail(&self, error: PipelineError) -> PipelineError {
        let winner = self.lock().fail(error);
        self.fetched.notify_one();
        self.advanced.notify_waiters();
        winner
    }
}

/// Bounded-concurrency fetch-and-write pipeline
pub struct Assembler {
    workers: usize,
    lookahead: usize,
    progress: Arc<watch::Sender<Progress>>,
}

impl Assembler {
    /// Creates an assembler with `workers` fetch tasks (at least one)
    pub fn new(workers: usize, lookahead: usize) -> Self {
        let (progress, _) = watch::channel(Progress::default());

        Self {
            workers: workers.max(1),
            lookahead,
            progress: Arc::new(progress),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn lookahead(&self) -> usize {
        self.lookahead
    }

    /// Subscribes to live progress snapshots
    pub fn progress(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    /// Fetches every chapter of `plan` from `source` and writes each day, in
    /// order, to `writer`.
    ///
    /// Returns the first error recorded by any worker or by the writer.
    pub async fn run<S, W>(
        &self,
        plan: &Plan,
        source: Arc<S>,
        writer: &mut W,
        cancel: &CancellationToken,
    ) -> Result<AssemblySummary, PipelineError>
    where
        S: ChapterSource + ?Sized + 'static,
        W: DayWriter + ?Sized,
    {
        let started = Instant::now();
        let shared = Arc::new(Shared {
            state: Mutex::new(PipelineState::new(plan, self.lookahead)),
            fetched: Notify::new(),
            advanced: Notify::new(),
            progress: self.progress.clone(),
        });

        tracing::info!(
            days = plan.len(),
            chapters = plan.chapter_count(),
            workers = self.workers,
            lookahead = self.lookahead,
            "Starting assembly"
        );
        shared.publish(Phase::Assembling);

        // Child token lets the writer stop workers without cancelling the caller
        let worker_cancel = cancel.child_token();
        let mut workers = JoinSet::new();
        for id in 0..self.workers {
            workers.spawn(fetch_worker(
                id,
                shared.clone(),
                source.clone(),
                worker_cancel.clone(),
            ));
        }

        // Workers are joined while the writer runs so a panicked worker
        // fails the run instead of leaving the writer waiting on its chapter.
        let writing = write_days(plan, &shared, writer, cancel);
        tokio::pin!(writing);
        let mut worker_failure = None;
        let result = loop {
            tokio::select! {
                result = &mut writing => break result,
                Some(joined) = workers.join_next(), if !workers.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!(error = %e, "Fetch worker panicked");
                        let error = shared.fail(PipelineError::Worker(e.to_string()));
                        worker_failure.get_or_insert(error);
                    }
                }
            }
        };

        if matches!(result, Err(PipelineError::Cancelled)) {
            worker_cancel.cancel();
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Fetch worker panicked");
                worker_failure.get_or_insert_with(|| PipelineError::Worker(e.to_string()));
            }
        }

        let result = match (result, worker_failure) {
            (Ok(()), Some(failure)) => Err(failure),
            (result, _) => result,
        };

        match result {
            Ok(()) => {
                let (chapters_fetched, chapters_reused, peak_buffered_days) = {
                    let state = shared.lock();
                    (
                        state.fetched() - state.reused(),
                        state.reused(),
                        state.peak_buffered_days(),
                    )
                };
                shared.publish(Phase::Finished);

                let summary = AssemblySummary {
                    days_written: plan.len(),
                    chapters_fetched,
                    chapters_reused,
                    peak_buffered_days,
                    elapsed: started.elapsed(),
                };
                tracing::info!(
                    days = summary.days_written,
                    chapters = summary.chapters_fetched,
                    reused = summary.chapters_reused,
                    elapsed_ms = summary.elapsed.as_millis() as u64,
                    "Assembly finished"
                );
                Ok(summary)
            }
            Err(error) => {
                let phase = if error == PipelineError::Cancelled {
                    Phase::Cancelled
                } else {
                    Phase::Failed
                };
                shared.publish(phase);
                tracing::warn!(error = %error, "Assembly aborted");
                Err(error)
            }
        }
    }
}

/// Pulls tasks until none remain, the run fails, or it is cancelled
async fn fetch_worker<S>(
    id: usize,
    shared: Arc<Shared>,
    source: Arc<S>,
    cancel: CancellationToken,
) where
    S: ChapterSource + ?Sized + 'static,
{
    loop {
        if cancel.is_cancelled() {
            break;
        }

        // Register for the wakeup before inspecting state so a cursor move
        // between the check and the wait is not missed.
        let advanced = shared.advanced.notified();
        tokio::pin!(advanced);
        advanced.as_mut().enable();

        let (next, reused) = {
            let mut state = shared.lock();
            let before = state.reused();
            (state.next_task(), state.reused() != before)
        };
        if reused {
            shared.fetched.notify_one();
        }

        let task = match next {
            Dispatch::Task(task) => task,
            Dispatch::Done => break,
            Dispatch::Wait => {
                let cancelled = tokio::select! {
                    _ = &mut advanced => false,
                    _ = cancel.cancelled() => true,
                };
                if cancelled {
                    break;
                }
                continue;
            }
        };

        tracing::debug!(
            worker = id,
            day = task.day_index,
            chapter = %task.chapter,
            global_id = task.global_id(),
            "Fetching chapter"
        );

        let result = tokio::select! {
            result = source.fetch(&task.chapter) => Some(result),
            _ = cancel.cancelled() => None,
        };
        let Some(result) = result else {
            break;
        };

        match result {
            Ok(payload) => {
                let snapshot = {
                    let mut state = shared.lock();
                    state.complete(&task, payload);
                    state.progress(Phase::Assembling)
                };
                shared.progress.send_replace(snapshot);
                shared.fetched.notify_one();
            }
            Err(source) => {
                tracing::warn!(
                    worker = id,
                    chapter = %task.chapter,
                    error = %source,
                    "Chapter fetch failed"
                );
                shared.fail(PipelineError::Fetch {
                    day: task.day_index,
                    chapter: task.chapter.to_string(),
                    source,
                });
                break;
            }
        }
    }

    tracing::debug!(worker = id, "Fetch worker finished");
}

/// Writes days in order, waiting for each to be fully fetched
async fn write_days<W>(
    plan: &Plan,
    shared: &Shared,
    writer: &mut W,
    cancel: &CancellationToken,
) -> Result<(), PipelineError>
where
    W: DayWriter + ?Sized,
{
    for day in plan.days() {
        let payloads = loop {
            if cancel.is_cancelled() {
                return Err(shared.fail(PipelineError::Cancelled));
            }

            let ready = {
                let mut state = shared.lock();
                if let Some(error) = state.error() {
                    return Err(error.clone());
                }
                state.take_day(day.index)
            };

            match ready {
                Some(payloads) => break payloads,
                None => {
                    tokio::select! {
                        _ = shared.fetched.notified() => {}
                        _ = cancel.cancelled() => {}
                    }
                }
            }
        };

        tracing::debug!(day = day.index, chapters = payloads.len(), "Writing day");

        if let Err(source) = writer.write_day(day, payloads).await {
            return Err(shared.fail(PipelineError::Write {
                day: day.index,
                source,
            }));
        }

        shared.lock().advance();
        shared.advanced.notify_waiters();
        shared.publish(Phase::Assembling);
    }

    writer
        .finish()
        .await
        .map_err(|e| shared.fail(PipelineError::Finish(e)))
}
