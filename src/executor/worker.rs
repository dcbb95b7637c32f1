//! Worker loop: pulls a job off the shared job queue, runs it through the
//! injected [`TaskExecutor`], and reports a [`TaskResult`] on the result
//! channel.
//!
//! `tokio::sync::mpsc::Receiver` has only one consumer, so the pool of
//! workers shares one receiver behind a `tokio::sync::Mutex` — the
//! idiomatic stand-in for a multi-consumer queue in this runtime.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use crate::executor::job::Job;
use crate::executor::task::TaskResult;
use crate::executor::task_executor::{PlayContext, TaskExecutor, TaskExecutorError};

/// Shared receiving end of the bounded job channel.
pub type JobReceiver = Arc<Mutex<mpsc::Receiver<Job>>>;

/// Runs one worker to completion (until it receives [`Job::Shutdown`] or the
/// channel closes).
///
/// A fault inside the task executor — an `Err`, or a panic — never
/// propagates past this function: the executor call is isolated in its own
/// `tokio::spawn`'d task, so a panic there is caught at that task boundary
/// rather than taking this worker (or the manager) down with it. This is
/// the in-process analogue of "a worker that hits an uncaught error
/// terminates itself rather than handing a corrupted state back to the
/// controller".
pub async fn run_worker(
    worker_id: usize,
    job_rx: JobReceiver,
    result_tx: mpsc::UnboundedSender<TaskResult>,
    executor: Arc<dyn TaskExecutor>,
    context: Arc<PlayContext>,
) {
    loop {
        let job = {
            let mut rx = job_rx.lock().await;
            rx.recv().await
        };
        let job = match job {
            Some(job) => job,
            None => {
                debug!(worker_id, "job channel closed, worker exiting");
                return;
            }
        };

        let (host, task, vars, play) = match job {
            Job::Shutdown => {
                debug!(worker_id, "received shutdown sentinel");
                return;
            }
            Job::Run {
                host,
                task,
                vars,
                play,
            } => (host, task, vars, play),
        };

        let task_uuid = task.uuid;
        let task_name = task.name.clone();
        let notify = task.notify.clone();

        let exec = Arc::clone(&executor);
        let ctx = Arc::clone(&context);
        let host_for_run = host.clone();
        let task_for_run = Arc::clone(&task);
        let play_for_run = Arc::clone(&play);

        let join_result = tokio::spawn(async move {
            exec.run(&host_for_run, &task_for_run, &vars, &play_for_run, &ctx)
                .await
        })
        .await;

        let (outcome, worker_faulted) = match join_result {
            Ok(Ok(executed)) => (Ok(executed), false),
            Ok(Err(TaskExecutorError::Unreachable(msg))) => {
                use crate::executor::task::ExecutedTask;
                (
                    Ok(ExecutedTask {
                        unreachable: true,
                        msg: Some(msg),
                        ..Default::default()
                    }),
                    false,
                )
            }
            Ok(Err(TaskExecutorError::Other(msg))) => (Err(msg), false),
            Err(join_err) => {
                warn!(worker_id, host = %host, task = %task_name, "worker fault: {join_err}");
                (Err(format!("worker fault: {join_err}")), true)
            }
        };

        let result = TaskResult {
            host,
            task_uuid,
            task_name,
            notify,
            outcome,
        };

        if result_tx.send(result).is_err() {
            debug!(worker_id, "result channel closed, worker exiting");
            return;
        }

        if worker_faulted {
            debug!(worker_id, "terminating after uncaught executor panic");
            return;
        }
    }
}
