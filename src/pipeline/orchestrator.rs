//! Pipeline coordinator: `Init → Running → Draining → Closed`.
//!
//! Title source → task generator (this thread) → bounded queue → N workers → output sink.
//! The sink is closed only after every worker has been joined.

use anyhow::{Context, Result, anyhow};
use log::debug;
use std::sync::Arc;

use super::context::{FatalSlot, PipelineContext, PipelineStats, PipelineTuning, StopFlag};
use super::error_handler::{check_fatal, log_skipped_paths};
use super::generator::run_task_generator;
use super::queue::work_queue;
use super::titles::TitleSource;
use super::worker::{WorkerContext, join_workers, spawn_workers};
use crate::engine::extract::Extractor;
use crate::engine::fetch::Fetch;
use crate::engine::normalize::Normalize;
use crate::engine::progress::setup_progress;
use crate::engine::sink::OutputSink;
use crate::{Opts, RunReport};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordinatorState {
    Init,
    Running,
    Draining,
    Closed,
}

/// One run of the scrape. Collaborators are injected so tests can stub the network.
pub struct Pipeline {
    opts: Opts,
    fetcher: Arc<dyn Fetch>,
    normalizer: Arc<dyn Normalize>,
    stop: StopFlag,
    state: CoordinatorState,
}

impl Pipeline {
    pub fn new(opts: &Opts, fetcher: Arc<dyn Fetch>, normalizer: Arc<dyn Normalize>) -> Self {
        Self {
            opts: opts.clone(),
            fetcher,
            normalizer,
            stop: StopFlag::new(),
            state: CoordinatorState::Init,
        }
    }

    /// Share an externally owned stop flag (e.g. one set by a Ctrl+C handler).
    pub fn with_stop_flag(mut self, stop: StopFlag) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    fn transition(&mut self, next: CoordinatorState) {
        debug!("coordinator: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run to completion. Setup errors (unreadable input root, unwritable output) are returned
    /// before any worker is spawned. Generator and write-path errors are returned only after
    /// the workers have drained and the sink is closed.
    pub fn run(&mut self) -> Result<RunReport> {
        if self.state != CoordinatorState::Init {
            return Err(anyhow!("pipeline already ran (state {:?})", self.state));
        }
        let tuning = PipelineTuning::from(&self.opts);
        let source = TitleSource::open(&self.opts.input_dir, &self.opts.file_prefix)?;
        let sink = Arc::new(OutputSink::create(&self.opts.output_file)?);
        let extractor = Arc::new(Extractor::new(Arc::clone(&self.normalizer))?);
        debug!(
            "Reading {} with {} workers, queue capacity {}",
            source.root().display(),
            tuning.num_workers,
            tuning.queue_capacity
        );

        let stats = Arc::new(PipelineStats::default());
        let fatal = FatalSlot::default();
        let (queue_tx, queue_rx) = work_queue(tuning.queue_capacity, self.stop.clone());
        let ctx = PipelineContext::new(&self.opts, self.stop.clone(), Arc::clone(&stats));
        let worker_ctx = WorkerContext {
            queue: queue_rx,
            fetcher: Arc::clone(&self.fetcher),
            extractor,
            sink: Arc::clone(&sink),
            retry: self.opts.retry.clone(),
            stop: self.stop.clone(),
            stats: Arc::clone(&stats),
            fatal: fatal.clone(),
            progress: setup_progress(self.opts.verbose),
        };

        self.transition(CoordinatorState::Running);
        let handles = spawn_workers(&worker_ctx, tuning.num_workers)?;
        // Workers hold their own clones; the queue closes once the sender is dropped.
        drop(worker_ctx);
        let generated = run_task_generator(source.titles(), &queue_tx, &ctx);
        queue_tx.close();

        self.transition(CoordinatorState::Draining);
        let panicked = join_workers(handles);
        let sink = Arc::try_unwrap(sink)
            .map_err(|_| anyhow!("output sink still shared after all workers finished"))?;
        let closed = sink.close();
        self.transition(CoordinatorState::Closed);

        log_skipped_paths(&ctx.skipped_paths, self.opts.verbose);
        // A write failure outranks the generator and close errors it may have caused.
        check_fatal(&fatal, panicked)?;
        let enqueued = generated?;
        let records = closed.context("close output sink")?;
        debug!("{} tasks enqueued, {} records written", enqueued, records);
        Ok(stats.report(self.stop.is_requested()))
    }
}
