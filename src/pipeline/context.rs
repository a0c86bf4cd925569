//! Pipeline context and tuning: shared state passed to the task generator and the workers.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::{Opts, RunReport, SkipReason};

/// Cooperative stop signal. Set by Ctrl+C or by a fatal write error; checked by the producer
/// before each enqueue and by workers before each dequeue and fetch.
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Worker count and queue capacity for one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineTuning {
    pub num_workers: usize,
    pub queue_capacity: usize,
}

impl From<&Opts> for PipelineTuning {
    fn from(opts: &Opts) -> Self {
        PipelineTuning {
            num_workers: opts.num_workers.max(1),
            queue_capacity: opts.queue_capacity(),
        }
    }
}

/// Counters shared by the generator and every worker. Turned into a [`RunReport`] at the end.
#[derive(Debug, Default)]
pub struct PipelineStats {
    attempted: AtomicUsize,
    written: AtomicUsize,
    files_skipped: AtomicUsize,
    skipped: Mutex<BTreeMap<SkipReason, usize>>,
}

impl PipelineStats {
    pub fn record_attempt(&self) {
        self.attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_written(&self) {
        self.written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped_file(&self) {
        self.files_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skip(&self, reason: SkipReason) {
        let mut skipped = self.skipped.lock().unwrap_or_else(PoisonError::into_inner);
        *skipped.entry(reason).or_insert(0) += 1;
    }

    pub fn written(&self) -> usize {
        self.written.load(Ordering::Relaxed)
    }

    pub fn report(&self, cancelled: bool) -> RunReport {
        RunReport {
            attempted: self.attempted.load(Ordering::Relaxed),
            written: self.written.load(Ordering::Relaxed),
            skipped: self
                .skipped
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            cancelled,
        }
    }
}

/// Shared context for the task generator. Built in the coordinator so the generator has the URL
/// prefix, strictness and the stop/skip state.
pub struct PipelineContext {
    pub base_url: String,
    pub strict: bool,
    pub stop: StopFlag,
    pub stats: Arc<PipelineStats>,
    /// Dump entries that could not be read: (path or placeholder, message).
    pub skipped_paths: Arc<Mutex<Vec<(PathBuf, String)>>>,
}

impl PipelineContext {
    pub fn new(opts: &Opts, stop: StopFlag, stats: Arc<PipelineStats>) -> Self {
        PipelineContext {
            base_url: opts.base_url.clone(),
            strict: opts.strict,
            stop,
            stats,
            skipped_paths: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// First fatal error raised inside a worker (write path). Later errors are dropped.
#[derive(Clone, Debug, Default)]
pub struct FatalSlot(Arc<Mutex<Option<String>>>);

impl FatalSlot {
    pub fn record(&self, msg: String) {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        slot.get_or_insert(msg);
    }

    pub fn take(&self) -> Option<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}
