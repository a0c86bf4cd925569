use anyhow::Result;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use super::context::FatalSlot;

/// Check pipeline result after all workers are joined: a recorded write failure or a panicked
/// worker fails the run.
pub fn check_fatal(fatal: &FatalSlot, panicked_workers: usize) -> Result<()> {
    if let Some(msg) = fatal.take() {
        return Err(anyhow::anyhow!("output write failed: {}", msg));
    }
    if panicked_workers > 0 {
        return Err(anyhow::anyhow!(
            "{} worker thread(s) panicked",
            panicked_workers
        ));
    }
    Ok(())
}

/// Summarise dump entries that could not be read (each was already logged when skipped).
pub fn log_skipped_paths(skipped_paths: &Arc<Mutex<Vec<(PathBuf, String)>>>, verbose: bool) {
    let skipped = skipped_paths.lock().unwrap_or_else(PoisonError::into_inner);
    if skipped.is_empty() {
        return;
    }
    log::warn!(
        "Skipped {} input entries due to read errors or access issues",
        skipped.len()
    );
    if verbose {
        for (p, msg) in skipped.iter() {
            eprintln!("  skipped: {} ({})", p.display(), msg);
        }
    }
}
