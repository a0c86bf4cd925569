//! Wikicorpus: concurrent fetch-extract-write pipeline that turns a title dump into a
//! summary/body corpus.

pub mod engine;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

use log::debug;
use std::sync::Arc;

use crate::engine::{HttpFetcher, load_normalizer};
use crate::pipeline::{Pipeline, StopFlag};

/// Result alias used by public wikicorpus API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point: fetch every title under `opts.input_dir` and write the corpus to
/// `opts.output_file`, using the HTTP fetcher and the configured normalizer.
///
/// `stop` may be set from another thread (e.g. a Ctrl+C handler) to drain early; the returned
/// report then has `cancelled` set. To stub the network, build a [`Pipeline`] directly.
pub fn run_corpus(opts: &Opts, stop: StopFlag) -> Result<RunReport> {
    let config_str = format!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_string().to_uppercase(),
        opts
    );
    debug!("{}", config_str);

    let fetcher = Arc::new(HttpFetcher::new(opts.fetch_timeout, &opts.user_agent)?);
    let normalizer = load_normalizer(opts.rules_path.as_deref())?;
    Pipeline::new(opts, fetcher, normalizer)
        .with_stop_flag(stop)
        .run()
}
