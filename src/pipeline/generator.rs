//! Task generator loop: consumes title outcomes, enqueues one task per title, records skips.

use anyhow::{Result, bail};
use log::{debug, warn};
use std::path::PathBuf;
use std::sync::PoisonError;

use super::context::PipelineContext;
use super::queue::{Enqueue, TaskSender};
use super::titles::TitleOutcome;
use crate::{SkipReason, Task};

/// Run the generator over `iter`, blocking on `queue` when it is full. Returns the number of
/// tasks enqueued. Stops early on a stop request or when every worker is gone.
/// In strict mode the first unreadable entry is returned as an error; otherwise it is logged
/// and recorded in `skipped_paths`. The caller closes the queue either way.
pub fn run_task_generator<I>(iter: I, queue: &TaskSender, ctx: &PipelineContext) -> Result<usize>
where
    I: Iterator<Item = TitleOutcome>,
{
    let mut count = 0_usize;
    for outcome in iter {
        if ctx.stop.is_requested() {
            debug!("Stop requested, no more tasks after {}", count);
            break;
        }
        match outcome {
            TitleOutcome::Title(title) => {
                let task = Task::new(&title, &ctx.base_url);
                debug!("Processing article {}", task.title);
                match queue.enqueue(task) {
                    Enqueue::Sent => count += 1,
                    Enqueue::Stopped(task) => {
                        debug!("Stop requested, not enqueued: {}", task.title);
                        break;
                    }
                    Enqueue::Disconnected(task) => {
                        warn!("All workers exited, not enqueued: {}", task.title);
                        break;
                    }
                }
            }
            TitleOutcome::Malformed { path, line, msg } => {
                warn!(
                    "Skipping malformed line {} in {}: {}",
                    line,
                    path.display(),
                    msg
                );
                ctx.stats.record_skip(SkipReason::MalformedLine);
            }
            TitleOutcome::SkippedFile(path) => {
                warn!("Invalid file found, skipping {}", path.display());
                ctx.stats.record_skipped_file();
            }
            TitleOutcome::Err { msg, path } => {
                if ctx.strict {
                    bail!("{}", msg);
                }
                let shown = path.unwrap_or_else(|| PathBuf::from("<no-path>"));
                warn!("Skipping {}: {}", shown.display(), msg);
                ctx.stats.record_skipped_file();
                ctx.skipped_paths
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push((shown, msg));
            }
        }
    }
    Ok(count)
}
