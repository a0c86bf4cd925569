//! Public and internal types for the wikicorpus API and pipeline.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::engine::retry::RetryPolicy;
use crate::engine::tools::target_url;
use crate::utils::config::{PackagePaths, PipelineDefaults};

/// One unit of work: a dump title and the page URL it resolves to. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    pub title: String,
    pub target_url: String,
}

impl Task {
    /// Build a task for `title` under `base_prefix` (see [`target_url`]).
    pub fn new(title: &str, base_prefix: &str) -> Self {
        Task {
            title: title.to_string(),
            target_url: target_url(base_prefix, title),
        }
    }
}

/// Result of a single fetch. Non-success statuses are values, not errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchStatus {
    /// 2xx response; carries the decoded body.
    Ok(String),
    /// Final response status was not a success.
    HttpError(u16),
    /// Connect, DNS, timeout or body read failure; carries the full cause chain.
    TransportError(String),
}

impl FetchStatus {
    /// Why a task with this status is discarded, or `None` when the body can be extracted.
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            FetchStatus::Ok(_) => None,
            FetchStatus::HttpError(_) => Some(SkipReason::HttpError),
            FetchStatus::TransportError(_) => Some(SkipReason::TransportError),
        }
    }

    /// Only transport failures are worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchStatus::TransportError(_))
    }
}

/// What the fetcher hands to the extractor, within one worker iteration.
#[derive(Clone, Debug)]
pub struct FetchOutcome {
    pub task: Task,
    pub status: FetchStatus,
}

/// A summary/body pair. Both fields are non-empty whenever a record exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedRecord {
    pub summary: String,
    pub body: String,
}

/// Per-item conditions that discard a task (or an input line) without failing the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SkipReason {
    MalformedLine,
    HttpError,
    TransportError,
    InsufficientContent,
    /// Extracted text contains a frame marker and could not be read back unchanged.
    UnframeableContent,
    /// Dequeued but abandoned because a stop was requested before the fetch.
    Cancelled,
}

impl SkipReason {
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::MalformedLine => "malformed_line",
            SkipReason::HttpError => "http_error",
            SkipReason::TransportError => "transport_error",
            SkipReason::InsufficientContent => "insufficient_content",
            SkipReason::UnframeableContent => "unframeable_content",
            SkipReason::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Final tally of a run: tasks attempted, records written, skips by reason.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Tasks taken off the work queue by a worker.
    pub attempted: usize,
    /// Records appended to the output sink.
    pub written: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
    /// Input files ignored because their name lacks the dump prefix, or unreadable.
    pub files_skipped: usize,
    /// True when the run ended because a stop was requested.
    pub cancelled: bool,
}

impl RunReport {
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "attempted {} | written {} | skipped {}",
            self.attempted,
            self.written,
            self.skipped_total()
        )?;
        if !self.skipped.is_empty() {
            let reasons: Vec<String> = self
                .skipped
                .iter()
                .map(|(reason, n)| format!("{reason}: {n}"))
                .collect();
            write!(f, " ({})", reasons.join(", "))?;
        }
        if self.files_skipped > 0 {
            write!(f, " | files skipped {}", self.files_skipped)?;
        }
        if self.cancelled {
            f.write_str(" | cancelled")?;
        }
        Ok(())
    }
}

/// Full run options. Built from defaults, then `.wikicorpus.toml`, then CLI flags.
#[derive(Clone, Debug)]
pub struct Opts {
    /// Root of the title dump (one JSON object per line, files named `<file_prefix>*`).
    pub input_dir: PathBuf,
    /// Corpus file; truncated and opened once for the whole run.
    pub output_file: PathBuf,
    /// Worker thread count.
    pub num_workers: usize,
    /// Work queue capacity. When None, twice the worker count.
    pub queue_capacity: Option<usize>,
    /// Per-request timeout.
    pub fetch_timeout: Duration,
    /// Prefix the encoded title is appended to.
    pub base_url: String,
    /// Dump files not starting with this are skipped.
    pub file_prefix: String,
    /// Optional TOML rule table for the normalizer. None means identity.
    pub rules_path: Option<PathBuf>,
    pub user_agent: String,
    pub retry: RetryPolicy,
    /// Strict mode: fail on the first unreadable dump entry instead of skipping it.
    pub strict: bool,
    /// Debug logging and a progress counter.
    pub verbose: bool,
}

impl Opts {
    /// Effective queue capacity (never below 1).
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
            .unwrap_or(self.num_workers.max(1) * PipelineDefaults::QUEUE_FACTOR)
            .max(1)
    }
}

impl Default for Opts {
    fn default() -> Self {
        Opts {
            input_dir: PathBuf::from(PipelineDefaults::INPUT_DIR),
            output_file: PathBuf::from(PackagePaths::get().output_filename()),
            num_workers: PipelineDefaults::WORKERS,
            queue_capacity: None,
            fetch_timeout: Duration::from_secs(PipelineDefaults::FETCH_TIMEOUT_SECS),
            base_url: PipelineDefaults::BASE_URL.to_string(),
            file_prefix: PipelineDefaults::FILE_PREFIX.to_string(),
            rules_path: None,
            user_agent: PackagePaths::get().user_agent().to_string(),
            retry: RetryPolicy::default(),
            strict: false,
            verbose: false,
        }
    }
}
