use clap::Parser;
use std::path::PathBuf;

/// Build a summary/body corpus by fetching every article named in a title dump.
#[derive(Clone, Debug, Parser)]
#[command(name = "wikicorpus")]
#[command(about = "Fetch every article in a title dump and append <start>summary---->body<stop> records to one corpus file.")]
pub struct Cli {
    /// Dump directory (files named `wiki_*`, one JSON object per line with a `title` field).
    #[arg(long, short = 'i', value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Corpus file to write. Truncated at start. Default: `wikicorpus.txt`.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output_file: Option<PathBuf>,

    /// Config file. Default: `.wikicorpus.toml` in the current directory, if present.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Worker threads. Default: 16.
    #[arg(long, short = 'w', value_parser = clap::value_parser!(usize))]
    pub workers: Option<usize>,

    /// Work queue capacity. Default: twice the worker count.
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub queue_capacity: Option<usize>,

    /// Per-request timeout in seconds. Default: 30.
    #[arg(long, short = 't', value_parser = clap::value_parser!(u64))]
    pub timeout: Option<u64>,

    /// Retries for connection/timeout failures (exponential backoff). Default: 0.
    #[arg(long, short = 'r', value_parser = clap::value_parser!(u32))]
    pub retries: Option<u32>,

    /// Initial retry backoff in milliseconds. Default: 500.
    #[arg(long, value_parser = clap::value_parser!(u64))]
    pub retry_backoff_ms: Option<u64>,

    /// URL prefix the encoded title is appended to.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Only dump files whose name starts with this are read.
    #[arg(long)]
    pub file_prefix: Option<String>,

    /// TOML rule table for text normalization.
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// User-Agent header sent with every request.
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Strict mode: fail on the first unreadable dump entry instead of skipping it.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub strict: Option<bool>,

    /// Verbose output (debug logs and a progress counter).
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}
