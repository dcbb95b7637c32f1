//! The default, Ansible-like console callback: play/task headers, one line
//! per host per task, and a final recap.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::callback::{Callback, RunStats};
use crate::executor::task::{TaskResult, TaskStatus};
use crate::output;

/// Prints play/task headers and per-host outcomes as a play runs, then a
/// `PLAY RECAP` summary.
#[derive(Default)]
pub struct DefaultCallback {
    stats: Mutex<BTreeMap<String, RunStats>>,
}

impl DefaultCallback {
    /// Builds a new default callback.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, result: &TaskResult) {
        self.stats
            .lock()
            .entry(result.host.clone())
            .or_default()
            .record(result);
    }
}

#[async_trait]
impl Callback for DefaultCallback {
    async fn on_play_start(&self, name: &str) {
        output::play_header(name);
    }

    async fn on_task_start(&self, name: &str) {
        output::task_header(name);
    }

    async fn on_cleanup_task_start(&self, name: &str) {
        output::task_header(&format!("cleanup | {name}"));
    }

    async fn on_handler_task_start(&self, name: &str) {
        output::task_header(&format!("handler | {name}"));
    }

    async fn on_no_hosts_remaining(&self) {
        println!("\nNO MORE HOSTS LEFT");
    }

    async fn on_ok(&self, result: &TaskResult) {
        self.record(result);
        match result.status() {
            TaskStatus::Changed => output::changed(&result.host),
            _ => output::ok(&result.host),
        }
    }

    async fn on_failed(&self, result: &TaskResult) {
        self.record(result);
        let msg = match &result.outcome {
            Ok(executed) => executed.msg.clone().unwrap_or_default(),
            Err(e) => e.clone(),
        };
        output::failed(&result.host, &msg);
    }

    async fn on_unreachable(&self, result: &TaskResult) {
        self.record(result);
        let msg = match &result.outcome {
            Ok(executed) => executed.msg.clone().unwrap_or_default(),
            Err(e) => e.clone(),
        };
        output::failed(&result.host, &format!("UNREACHABLE: {msg}"));
    }

    async fn on_skipped(&self, result: &TaskResult) {
        self.record(result);
        output::skipped(&result.host);
    }

    async fn on_run_complete(&self, _stats: &[(String, RunStats)]) {
        let stats = self.stats.lock();
        let rows: Vec<_> = stats
            .iter()
            .map(|(host, s)| {
                (
                    host.clone(),
                    s.ok + s.changed,
                    s.changed,
                    s.failed,
                    s.skipped,
                )
            })
            .collect();
        output::recap(&rows);
    }
}
