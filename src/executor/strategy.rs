//! Execution strategies: the policy deciding which host runs which task
//! when. `linear` (the default, and the only one shipped) keeps all hosts
//! in lock-step on the same task index.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::callback::BoxedCallback;
use crate::error::Result;
use crate::executor::block::Play;
use crate::executor::job::{Job, JobTracker};
use crate::executor::iterator::PlayIterator;
use crate::executor::state::SharedHostState;
use crate::executor::task::Task;
use crate::executor::task_executor::PlayContext;
use crate::executor::variables::VariableManager;

/// Everything a strategy needs to enqueue work and observe shared state,
/// bundled so `Strategy` implementations don't each carry their own copy of
/// the manager's plumbing.
#[derive(Clone)]
pub struct StrategyContext {
    /// The play being run.
    pub play: Arc<Play>,
    /// Sending half of the bounded job channel.
    pub job_tx: mpsc::Sender<Job>,
    /// Outstanding-job tracker for drain/join semantics.
    pub tracker: Arc<JobTracker>,
    /// Shared blocked/failed/unreachable/notified state for this batch.
    pub state: Arc<SharedHostState>,
    /// Event sink.
    pub callback: BoxedCallback,
    /// Variable resolution.
    pub variables: Arc<dyn VariableManager>,
    /// Check-mode/diff-mode/timeout context passed through to the executor.
    pub play_context: Arc<PlayContext>,
}

impl StrategyContext {
    /// Resolves vars and places a job on the queue, marking the host blocked
    /// and the job outstanding before the send so a racing result can never
    /// be observed as "not yet enqueued".
    pub async fn enqueue(&self, host: &str, task: Arc<Task>) -> Result<()> {
        let vars = self.variables.get_vars(&self.play, host, &task).await?;
        self.state.mark_blocked(host);
        self.tracker.job_enqueued();
        let job = Job::Run {
            host: host.to_string(),
            task,
            vars,
            play: Arc::clone(&self.play),
        };
        if self.job_tx.send(job).await.is_err() {
            return Err(crate::error::Error::TransportError(
                "job channel closed".into(),
            ));
        }
        Ok(())
    }

    /// Waits until every job enqueued so far has been acknowledged.
    pub async fn drain(&self) {
        self.tracker.wait_idle().await;
    }
}

/// The scheduling policy for one play.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Runs the play's main task loop to completion for `hosts`.
    async fn run(&self, ctx: &StrategyContext, iterator: &PlayIterator, hosts: &[String]) -> Result<()>;

    /// Revisits failed hosts so their rescue/always branches still execute.
    async fn cleanup(&self, ctx: &StrategyContext, iterator: &PlayIterator, hosts: &[String]) -> Result<()>;

    /// Flushes notified handlers in declared order.
    async fn run_handlers(&self, ctx: &StrategyContext, iterator: &PlayIterator, hosts: &[String]) -> Result<()>;
}

/// Hosts still eligible to be scheduled (not failed, not unreachable).
fn hosts_left(state: &SharedHostState, hosts: &[String]) -> Vec<String> {
    hosts.iter().filter(|h| !state.is_excluded(h)).cloned().collect()
}

/// The default strategy: advances all hosts through the same task index,
/// diverting a host into its own rescue/always branch the moment it fails.
#[derive(Debug, Default)]
pub struct LinearStrategy;

impl LinearStrategy {
    /// Builds a new linear strategy.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Strategy for LinearStrategy {
    async fn run(&self, ctx: &StrategyContext, iterator: &PlayIterator, hosts: &[String]) -> Result<()> {
        if hosts.is_empty() {
            return Ok(());
        }

        loop {
            // Recomputed every round: once a host fails or goes unreachable
            // it must stop pacing the loop, not just stop being scheduled —
            // otherwise the loop would peek its now-frozen cursor forever.
            let active = hosts_left(&ctx.state, hosts);
            if active.is_empty() {
                ctx.callback.on_no_hosts_remaining().await;
                break;
            }
            let representative = &active[0];

            let lead_task = iterator.get_next_task(representative, true)?;
            let Some(lead_task) = lead_task else { break };

            ctx.callback.on_task_start(&lead_task.name).await;

            for host in &active {
                // Each host advances its own cursor: a host that diverged
                // into rescue/always gets its own task, not the
                // representative's — only the representative's task paces
                // the loop and labels the callback.
                let host_task = iterator.next_task_for_host(host, false)?;
                let Some(host_task) = host_task else { continue };
                ctx.enqueue(host, Arc::new(host_task)).await?;
            }

            ctx.drain().await;
        }

        Ok(())
    }

    async fn cleanup(&self, ctx: &StrategyContext, iterator: &PlayIterator, hosts: &[String]) -> Result<()> {
        let mut failed = ctx.state.failed_hosts();
        failed.retain(|h| hosts.contains(h));
        if failed.is_empty() {
            return Ok(());
        }

        for host in &failed {
            iterator.mark_host_failed(host)?;
        }
        ctx.state.clear_failed();

        loop {
            let mut queued_any = false;
            for host in &failed {
                if ctx.state.is_blocked(host) {
                    continue;
                }
                if let Some(task) = iterator.next_task_for_host(host, false)? {
                    ctx.callback.on_cleanup_task_start(&task.name).await;
                    ctx.enqueue(host, Arc::new(task)).await?;
                    queued_any = true;
                }
            }
            if !queued_any {
                break;
            }
            ctx.drain().await;
        }

        Ok(())
    }

    async fn run_handlers(&self, ctx: &StrategyContext, _iterator: &PlayIterator, hosts: &[String]) -> Result<()> {
        for handler in ctx.play.handlers.iter() {
            let active = hosts_left(&ctx.state, hosts);
            if active.is_empty() {
                ctx.callback.on_no_hosts_remaining().await;
                break;
            }

            let notified = ctx.state.notified_hosts(handler.name());
            if notified.is_empty() {
                continue;
            }

            ctx.callback.on_handler_task_start(handler.name()).await;

            for host in &notified {
                if !active.contains(host) {
                    continue;
                }
                if handler.has_triggered(host) {
                    continue;
                }
                handler.mark_triggered(host);
                ctx.enqueue(host, Arc::new(handler.task.clone())).await?;
            }

            ctx.drain().await;
            ctx.state.clear_notified(handler.name());
        }

        debug!("handler flush complete");
        Ok(())
    }
}
