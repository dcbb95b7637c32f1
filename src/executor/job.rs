//! The job handed to a worker, and the "join" primitive the strategy uses to
//! wait until every enqueued job has been acknowledged by the result
//! processor — the in-process analogue of a queue's `join()`/`task_done()`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::executor::block::Play;
use crate::executor::task::Task;

/// One unit of work placed on the job channel.
pub enum Job {
    /// Run `task` on `host` with the given resolved variables.
    Run {
        /// Target host name.
        host: String,
        /// The task to run (shared so the strategy doesn't clone a whole
        /// task per host when it is reusing the representative's task).
        task: Arc<Task>,
        /// Pre-resolved variables for this (host, task) pair.
        vars: Value,
        /// The play the task belongs to, for context the task executor may want.
        play: Arc<Play>,
    },
    /// Tells a worker to stop; one sentinel is sent per worker at shutdown.
    Shutdown,
}

/// Tracks outstanding jobs so the strategy can wait for a batch to drain
/// without a queue-native join primitive (`tokio::sync::mpsc` has none).
#[derive(Default)]
pub struct JobTracker {
    outstanding: AtomicUsize,
    notify: tokio::sync::Notify,
}

impl JobTracker {
    /// Builds an empty tracker.
    pub fn new() -> Self {
        Self {
            outstanding: AtomicUsize::new(0),
            notify: tokio::sync::Notify::new(),
        }
    }

    /// Call once per job placed on the job channel.
    pub fn job_enqueued(&self) {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
    }

    /// Call once per result the result processor has fully applied.
    pub fn job_acknowledged(&self) {
        if self.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.notify.notify_waiters();
        }
    }

    /// Blocks until every job enqueued before this call has been acknowledged.
    pub async fn wait_idle(&self) {
        loop {
            if self.outstanding.load(Ordering::SeqCst) == 0 {
                return;
            }
            let notified = self.notify.notified();
            if self.outstanding.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Current number of jobs enqueued but not yet acknowledged.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }
}
