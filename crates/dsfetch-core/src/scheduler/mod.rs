//! Dataset job scheduler.
//!
//! Every selected dataset becomes one task on the runtime's worker pool as
//! soon as the run starts. Task bodies are admitted through a semaphore sized
//! `max_concurrent_jobs`, so submission never waits but at most that many
//! datasets download or extract at once. The run ends when every task has
//! reached a terminal state; one failing dataset never cancels another.

mod run;
mod summary;

pub use run::{run_all, run_manifest, select_datasets};
pub use summary::RunSummary;
