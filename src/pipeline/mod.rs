//! Pipeline components: queue, title source, task generator, workers, coordinator.

pub mod context;
pub mod error_handler;
pub mod generator;
pub mod orchestrator;
pub mod queue;
pub mod titles;
pub mod worker;

pub use context::{FatalSlot, PipelineContext, PipelineStats, PipelineTuning, StopFlag};
pub use error_handler::{check_fatal, log_skipped_paths};
pub use generator::run_task_generator;
pub use orchestrator::{CoordinatorState, Pipeline};
pub use queue::{Dequeue, Enqueue, TaskReceiver, TaskSender, work_queue};
pub use titles::{TitleOutcome, TitleSource, parse_title_line, read_titles};
pub use worker::{Worker, WorkerContext, WorkerState, join_workers, spawn_workers};
