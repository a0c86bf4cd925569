//! Load `.wikicorpus.toml` (CLI only). Lib callers build [`Opts`] themselves.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::Opts;
use crate::engine::tools::timeout_from_secs;

#[derive(Debug, Default, Deserialize)]
pub struct CorpusToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    input_dir: Option<String>,
    output_file: Option<String>,
    workers: Option<usize>,
    queue_capacity: Option<usize>,
    timeout: Option<u64>,
    base_url: Option<String>,
    file_prefix: Option<String>,
    rules: Option<String>,
    user_agent: Option<String>,
    retries: Option<u32>,
    retry_backoff_ms: Option<u64>,
    strict: Option<bool>,
    verbose: Option<bool>,
}

/// Load the config file at `path`. `Ok(None)` when the file does not exist; a file that exists
/// but cannot be read or parsed is an error.
pub fn load_corpus_toml(path: &Path) -> Result<Option<CorpusToml>> {
    if !path.exists() {
        return Ok(None);
    }
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let file =
        parse_corpus_toml(&s).with_context(|| format!("parse config {}", path.display()))?;
    Ok(Some(file))
}

pub fn parse_corpus_toml(s: &str) -> std::result::Result<CorpusToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($set:expr, $opts:expr, $set_field:ident => $opts_field:ident) => {
        if let Some(ref v) = $set.$set_field {
            $opts.$opts_field = v.clone();
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI flags.
pub fn apply_file_to_opts(file: &CorpusToml, opts: &mut Opts) {
    let set = &file.settings;
    if let Some(ref p) = set.input_dir {
        opts.input_dir = PathBuf::from(p);
    }
    if let Some(ref p) = set.output_file {
        opts.output_file = PathBuf::from(p);
    }
    apply_file_opt!(set, opts, workers => num_workers);
    if set.queue_capacity.is_some() {
        opts.queue_capacity = set.queue_capacity;
    }
    if let Some(secs) = set.timeout {
        opts.fetch_timeout = timeout_from_secs(secs);
    }
    apply_file_opt!(set, opts, base_url => base_url);
    apply_file_opt!(set, opts, file_prefix => file_prefix);
    if let Some(ref p) = set.rules {
        opts.rules_path = Some(PathBuf::from(p));
    }
    apply_file_opt!(set, opts, user_agent => user_agent);
    if let Some(n) = set.retries {
        opts.retry.max_retries = n;
    }
    if let Some(ms) = set.retry_backoff_ms {
        opts.retry.initial_backoff = Duration::from_millis(ms);
    }
    apply_file_opt!(set, opts, strict => strict);
    apply_file_opt!(set, opts, verbose => verbose);
}
