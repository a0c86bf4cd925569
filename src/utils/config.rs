//! Application configuration constants.
//! Defaults and tuning in one place.

use std::sync::OnceLock;
use std::time::Duration;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    config_filename: String,
    output_filename: String,
    user_agent: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                config_filename: format!(".{pkg}.toml"),
                output_filename: format!("{pkg}.txt"),
                user_agent: format!("{pkg}/{}", env!("CARGO_PKG_VERSION")),
            }
        })
    }

    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    pub fn output_filename(&self) -> &str {
        &self.output_filename
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

// ---- Pipeline ----

/// Defaults for the fetch pipeline.
pub struct PipelineDefaults;

impl PipelineDefaults {
    /// Worker thread count. Network latency dominates, so this is well above core count.
    pub const WORKERS: usize = 16;
    /// Queue capacity is this many times the worker count unless set explicitly.
    pub const QUEUE_FACTOR: usize = 2;
    pub const FETCH_TIMEOUT_SECS: u64 = 30;
    pub const BASE_URL: &'static str = "https://en.wikipedia.org/wiki/";
    /// WikiExtractor names its output shards `wiki_00`, `wiki_01`, ...
    pub const FILE_PREFIX: &'static str = "wiki_";
    pub const INPUT_DIR: &'static str = ".";
}

/// How often blocked queue operations and backoff sleeps re-check the stop flag.
pub const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

// ---- Retry ----

/// Retry defaults for transport failures. Zero retries keeps one request per task.
pub struct RetryDefaults;

impl RetryDefaults {
    pub const MAX_RETRIES: u32 = 0;
    pub const INITIAL_BACKOFF_MS: u64 = 500;
    pub const MAX_BACKOFF_MS: u64 = 10_000;
    pub const MULTIPLIER: f64 = 2.0;
}

// ---- Output framing ----

/// Literals of one corpus record: `<start>summary---->body<stop>\n`.
pub struct FrameMarkers;

impl FrameMarkers {
    pub const START: &'static str = "<start>";
    pub const SEPARATOR: &'static str = "---->";
    pub const STOP: &'static str = "<stop>";
    pub const TERMINATOR: &'static str = "\n";
}
