//! Worker pool: each worker is an explicit state machine
//! `Waiting → Fetching → Extracting → Writing → Waiting`, ending in `Done`.

use anyhow::{Context, Result};
use log::{debug, error, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::context::{FatalSlot, PipelineStats, StopFlag};
use super::queue::{Dequeue, TaskReceiver};
use crate::engine::extract::Extractor;
use crate::engine::fetch::Fetch;
use crate::engine::progress::{ProgressBar, update_progress_bar};
use crate::engine::retry::RetryPolicy;
use crate::engine::sink::{OutputSink, is_frame_safe};
use crate::{ExtractedRecord, FetchOutcome, FetchStatus, SkipReason, Task};

/// Where a worker is in its loop. Per-task state travels with the variant.
#[derive(Debug)]
pub enum WorkerState {
    Waiting,
    Fetching(Task),
    Extracting(FetchOutcome),
    Writing(Task, ExtractedRecord),
    Done,
}

impl WorkerState {
    pub fn is_done(&self) -> bool {
        matches!(self, WorkerState::Done)
    }
}

/// Everything a worker needs, passed explicitly. Cloned once per worker.
#[derive(Clone)]
pub struct WorkerContext {
    pub queue: TaskReceiver,
    pub fetcher: Arc<dyn Fetch>,
    pub extractor: Arc<Extractor>,
    pub sink: Arc<OutputSink>,
    pub retry: RetryPolicy,
    pub stop: StopFlag,
    pub stats: Arc<PipelineStats>,
    pub fatal: FatalSlot,
    pub progress: Option<ProgressBar>,
}

pub struct Worker {
    ctx: WorkerContext,
}

impl Worker {
    pub fn new(ctx: WorkerContext) -> Self {
        Self { ctx }
    }

    /// Run one transition. Per-task failures lead back to `Waiting`; only a closed queue,
    /// a stop request or a sink failure lead to `Done`.
    pub fn step(&self, state: WorkerState) -> WorkerState {
        match state {
            WorkerState::Waiting => self.wait(),
            WorkerState::Fetching(task) => self.fetch(task),
            WorkerState::Extracting(outcome) => self.extract(outcome),
            WorkerState::Writing(task, record) => self.write(task, record),
            WorkerState::Done => WorkerState::Done,
        }
    }

    /// Loop until `Done`.
    pub fn run(self) {
        let mut state = WorkerState::Waiting;
        while !state.is_done() {
            state = self.step(state);
        }
        debug!("worker done");
    }

    fn wait(&self) -> WorkerState {
        match self.ctx.queue.dequeue() {
            Dequeue::Task(task) => {
                self.ctx.stats.record_attempt();
                WorkerState::Fetching(task)
            }
            Dequeue::Closed | Dequeue::Stopped => WorkerState::Done,
        }
    }

    fn fetch(&self, task: Task) -> WorkerState {
        if self.ctx.stop.is_requested() {
            debug!("Stop requested, dropping {}", task.title);
            self.ctx.stats.record_skip(SkipReason::Cancelled);
            return WorkerState::Done;
        }
        let outcome = self
            .ctx
            .retry
            .fetch_with_retry(self.ctx.fetcher.as_ref(), &task, &self.ctx.stop);
        WorkerState::Extracting(outcome)
    }

    fn extract(&self, outcome: FetchOutcome) -> WorkerState {
        match &outcome.status {
            FetchStatus::HttpError(code) => {
                warn!(
                    "Return status {} for {} ({})",
                    code, outcome.task.title, outcome.task.target_url
                );
            }
            FetchStatus::TransportError(cause) => {
                warn!(
                    "Request failed for {} ({}): {}",
                    outcome.task.title, outcome.task.target_url, cause
                );
            }
            FetchStatus::Ok(_) => {}
        }
        if let Some(reason) = outcome.status.skip_reason() {
            self.ctx.stats.record_skip(reason);
            return WorkerState::Waiting;
        }
        match self.ctx.extractor.extract(&outcome) {
            Some(record) if !is_frame_safe(&record) => {
                warn!(
                    "Content of {} contains frame markers, not written",
                    outcome.task.title
                );
                self.ctx.stats.record_skip(SkipReason::UnframeableContent);
                WorkerState::Waiting
            }
            Some(record) => WorkerState::Writing(outcome.task, record),
            None => {
                debug!("Not enough content in {}", outcome.task.title);
                self.ctx.stats.record_skip(SkipReason::InsufficientContent);
                WorkerState::Waiting
            }
        }
    }

    fn write(&self, task: Task, record: ExtractedRecord) -> WorkerState {
        match self.ctx.sink.write_record(&record) {
            Ok(()) => {
                self.ctx.stats.record_written();
                debug!("Written to corpus: {}", task.title);
                if let Some(bar) = &self.ctx.progress {
                    update_progress_bar(bar, self.ctx.stats.written());
                }
                WorkerState::Waiting
            }
            Err(e) => {
                error!("Writing {} failed: {:#}", task.title, e);
                self.ctx.fatal.record(format!("{:#}", e));
                self.ctx.stop.request();
                WorkerState::Done
            }
        }
    }
}

/// Spawn `num_workers` named worker threads. If a spawn fails, stop is requested, the workers
/// already running are joined, and the error is returned.
pub fn spawn_workers(ctx: &WorkerContext, num_workers: usize) -> Result<Vec<JoinHandle<()>>> {
    let mut handles = Vec::with_capacity(num_workers);
    for i in 0..num_workers {
        let worker = Worker::new(ctx.clone());
        let spawned = thread::Builder::new()
            .name(format!("worker-{i}"))
            .spawn(move || worker.run())
            .with_context(|| format!("spawn worker {i}"));
        match spawned {
            Ok(h) => handles.push(h),
            Err(e) => {
                ctx.stop.request();
                join_workers(handles);
                return Err(e);
            }
        }
    }
    Ok(handles)
}

/// Join every worker. Returns how many panicked. Only unwinding builds get here with a panic;
/// the release profile aborts the process on the first one.
pub fn join_workers(handles: Vec<JoinHandle<()>>) -> usize {
    handles
        .into_iter()
        .map(JoinHandle::join)
        .filter(|r| r.is_err())
        .count()
}
