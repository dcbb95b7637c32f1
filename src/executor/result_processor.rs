//! Sole consumer of the result channel: applies each [`TaskResult`] to the
//! shared host state, dispatches the matching [`Callback`] event, and
//! acknowledges the job so the strategy's drain can proceed.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::error;

use crate::callback::BoxedCallback;
use crate::executor::job::JobTracker;
use crate::executor::state::SharedHostState;
use crate::executor::task::{TaskResult, TaskStatus};

/// A slot holding whichever [`SharedHostState`] belongs to the batch
/// currently in flight. The result processor is spawned once per manager
/// and outlives any single batch, but a fresh `SharedHostState` is built
/// per serial batch (per §3's lifecycle rule), so the processor reads
/// through this indirection rather than closing over one fixed state.
pub type CurrentState = Arc<RwLock<Arc<SharedHostState>>>;

/// Drains the result channel until it closes, applying each result in turn
/// against whichever state is current at the time.
///
/// Results for distinct hosts may interleave; for a single host only one
/// task is ever in flight (`blocked_hosts` enforces this), so the result
/// stream per host is totally ordered.
pub async fn run_result_processor(
    mut result_rx: mpsc::UnboundedReceiver<TaskResult>,
    current_state: CurrentState,
    tracker: Arc<JobTracker>,
    callback: BoxedCallback,
) {
    while let Some(result) = result_rx.recv().await {
        let state = current_state.read().clone();
        match result.status() {
            TaskStatus::Failed => {
                state.mark_failed(&result.host);
                callback.on_failed(&result).await;
            }
            TaskStatus::Unreachable => {
                state.mark_unreachable(&result.host);
                callback.on_unreachable(&result).await;
            }
            TaskStatus::Skipped => {
                callback.on_skipped(&result).await;
            }
            TaskStatus::Ok | TaskStatus::Changed => {
                for handler in &result.notify {
                    state.notify(handler, &result.host);
                }
                callback.on_ok(&result).await;
            }
        }

        state.unblock(&result.host);
        tracker.job_acknowledged();
    }
    error!("result channel closed; result processor exiting");
}
