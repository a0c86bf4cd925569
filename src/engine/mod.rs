//! Engine module: fetch, extract, normalize, write, plus CLI wiring

pub mod arg_parser;
pub mod cli;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod progress;
pub mod retry;
pub mod sink;
pub mod tools;

// Re-export commonly used items
pub use arg_parser::Cli;
pub use cli::{build_opts, handle_run};
pub use extract::{Extractor, split_blocks};
pub use fetch::{Fetch, HttpFetcher};
pub use normalize::{Identity, Normalize, Rule, RuleTable, load_normalizer};
pub use retry::RetryPolicy;
pub use sink::{OutputSink, encode_frame, is_frame_safe, parse_frames};
pub use tools::{has_dump_prefix, target_url};
