pub mod config;
pub mod corpus_toml;
pub mod logger;

pub use config::*;
pub use corpus_toml::{CorpusToml, apply_file_to_opts, load_corpus_toml, parse_corpus_toml};
pub use logger::setup_logging;
