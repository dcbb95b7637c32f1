//! A quiet callback for CI: silent on success, loud on failure, a recap at
//! the end.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::callback::{Callback, RunStats};
use crate::executor::task::TaskResult;
use crate::output;

/// Only prints failures, unreachable hosts, and the final recap.
#[derive(Default)]
pub struct MinimalCallback {
    stats: Mutex<BTreeMap<String, RunStats>>,
}

impl MinimalCallback {
    /// Builds a new minimal callback.
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
impl Callback for MinimalCallback {
    async fn on_ok(&self, result: &TaskResult) {
        self.record(result);
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
