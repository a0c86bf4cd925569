//! Wikicorpus CLI: scrape a title dump into a summary/body corpus.

use anyhow::Result;
use clap::Parser;
use std::time::Instant;
use wikicorpus::engine::arg_parser::Cli;
use wikicorpus::engine::handle_run;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
