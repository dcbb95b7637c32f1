//! Callback interface for execution events.
//!
//! The execution core fires these events as it works through a play; it
//! never decides how they are rendered. A couple of illustrative
//! implementations ship in [`plugins`] — a real callback plugin ecosystem
//! (JSON, JUnit, syslog, ...) is outside this crate's scope.

pub mod plugins;

use async_trait::async_trait;

use crate::executor::task::TaskResult;

pub use plugins::{DefaultCallback, MinimalCallback, NullCallback};

/// Receives execution events as a play runs.
///
/// Every method has a default no-op body so a callback only needs to
/// implement the events it cares about.
#[async_trait]
pub trait Callback: Send + Sync {
    /// A play is starting.
    async fn on_play_start(&self, _name: &str) {}

    /// The strategy is about to queue a task across the current host batch.
    async fn on_task_start(&self, _name: &str) {}

    /// The cleanup phase is queuing a failed host's rescue/always task.
    async fn on_cleanup_task_start(&self, _name: &str) {}

    /// The handler-flush phase is queuing a notified handler.
    async fn on_handler_task_start(&self, _name: &str) {}

    /// No hosts remain to continue the play.
    async fn on_no_hosts_remaining(&self) {}

    /// A task succeeded (with or without reporting a change).
    async fn on_ok(&self, _result: &TaskResult) {}

    /// A task failed.
    async fn on_failed(&self, _result: &TaskResult) {}

    /// A host was unreachable.
    async fn on_unreachable(&self, _result: &TaskResult) {}

    /// A task was skipped.
    async fn on_skipped(&self, _result: &TaskResult) {}

    /// The whole run has finished; `stats` is keyed by host name.
    async fn on_run_complete(&self, _stats: &[(String, crate::callback::RunStats)]) {}
}

/// Per-host tally shown in the final recap.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunStats {
    /// Tasks that ran with no reported change.
    pub ok: u32,
    /// Tasks that ran and reported a change.
    pub changed: u32,
    /// Tasks that failed.
    pub failed: u32,
    /// Tasks that were skipped.
    pub skipped: u32,
    /// Times the host was unreachable.
    pub unreachable: u32,
}

impl RunStats {
    /// Folds one task result into this tally.
    pub fn record(&mut self, result: &TaskResult) {
        use crate::executor::task::TaskStatus;
        match result.status() {
            TaskStatus::Ok => self.ok += 1,
            TaskStatus::Changed => self.changed += 1,
            TaskStatus::Failed => self.failed += 1,
            TaskStatus::Skipped => self.skipped += 1,
            TaskStatus::Unreachable => self.unreachable += 1,
        }
    }
}

/// A boxed callback for dynamic dispatch.
pub type BoxedCallback = std::sync::Arc<dyn Callback>;
