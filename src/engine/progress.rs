//! Progress counter for records written (verbose mode only)

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

// Progress bar type alias
pub type ProgressBar = Arc<Mutex<Bar>>;

/// Force a refresh of the bar (e.g. so counter shows "0 records" immediately).
pub fn refresh_bar(pb: &ProgressBar) {
    if let Ok(mut bar) = pb.try_lock() {
        let _ = bar.refresh();
    }
}

/// Create a counter for unknown total (shows count without percentage)
pub fn create_counter(desc: &'static str) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = 0,
        desc = desc,
        animation = Animation::Classic,
        position = 0,
        unit = " records"
    )))
}

/// Move the counter to `count` (absolute, so an update skipped under contention is caught up
/// by the next one). Uses try_lock to avoid blocking workers.
pub fn update_progress_bar(pb: &ProgressBar, count: usize) {
    if let Ok(mut pb) = pb.try_lock() {
        let _ = pb.update_to(count);
    }
}

/// Counter bar for a run when `verbose` is set.
pub fn setup_progress(verbose: bool) -> Option<ProgressBar> {
    verbose.then(|| {
        let bar = create_counter("Scraping");
        refresh_bar(&bar);
        bar
    })
}
