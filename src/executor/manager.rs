//! The task queue manager: owns the worker pool, the job/result channels,
//! and drives plays to completion via the configured strategy.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::info;

use crate::callback::{BoxedCallback, RunStats};
use crate::config::Defaults;
use crate::error::Result;
use crate::executor::block::Play;
use crate::executor::job::{Job, JobTracker};
use crate::executor::iterator::PlayIterator;
use crate::executor::result_processor::{run_result_processor, CurrentState};
use crate::executor::state::SharedHostState;
use crate::executor::strategy::{LinearStrategy, Strategy, StrategyContext};
use crate::executor::task_executor::{PlayContext, TaskExecutor};
use crate::executor::variables::VariableManager;
use crate::executor::worker::run_worker;

/// Owns the worker pool and queues for the lifetime of a run (one or more
/// plays), and drives each play to completion one at a time.
pub struct TaskQueueManager {
    play_context: Arc<PlayContext>,
    job_tx: mpsc::Sender<Job>,
    tracker: Arc<JobTracker>,
    callback: BoxedCallback,
    variables: Arc<dyn VariableManager>,
    strategy: Arc<dyn Strategy>,
    worker_handles: Vec<JoinHandle<()>>,
    result_handle: Option<JoinHandle<()>>,
    result_tx: Option<mpsc::UnboundedSender<crate::executor::task::TaskResult>>,
    num_workers: usize,
    run_stats: Arc<parking_lot::Mutex<std::collections::BTreeMap<String, RunStats>>>,
    current_state: CurrentState,
}

impl TaskQueueManager {
    /// Spawns `defaults.forks` workers and one result processor, ready to
    /// drive plays against `executor`.
    pub fn new(
        defaults: &Defaults,
        executor: Arc<dyn TaskExecutor>,
        variables: Arc<dyn VariableManager>,
        callback: BoxedCallback,
    ) -> Self {
        let num_workers = defaults.forks.max(1);
        let (job_tx, job_rx) = mpsc::channel::<Job>(num_workers);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (result_tx, result_rx) = mpsc::unbounded_channel();

        let play_context = Arc::new(PlayContext {
            check_mode: defaults.check_mode,
            diff_mode: defaults.diff_mode,
            task_timeout: defaults.task_timeout,
        });

        let mut worker_handles = Vec::with_capacity(num_workers);
        for id in 0..num_workers {
            let job_rx = Arc::clone(&job_rx);
            let result_tx = result_tx.clone();
            let executor = Arc::clone(&executor);
            let ctx = Arc::clone(&play_context);
            worker_handles.push(tokio::spawn(run_worker(id, job_rx, result_tx, executor, ctx)));
        }

        let tracker = Arc::new(JobTracker::new());
        let current_state: CurrentState =
            Arc::new(parking_lot::RwLock::new(Arc::new(SharedHostState::default())));
        let run_stats = Arc::new(parking_lot::Mutex::new(std::collections::BTreeMap::new()));
        let result_handle = {
            let tracker = Arc::clone(&tracker);
            let run_stats = Arc::clone(&run_stats);
            let current_state = Arc::clone(&current_state);
            let callback_for_stats: BoxedCallback = Arc::new(StatsRecordingCallback {
                inner: Arc::clone(&callback),
                stats: Arc::clone(&run_stats),
            });
            Some(tokio::spawn(run_result_processor(
                result_rx,
                current_state,
                tracker,
                callback_for_stats,
            )))
        };

        Self {
            play_context,
            job_tx,
            tracker,
            callback,
            variables,
            strategy: Arc::new(LinearStrategy::new()),
            worker_handles,
            result_handle,
            result_tx: Some(result_tx),
            num_workers,
            run_stats,
            current_state,
        }
    }

    /// Swaps in a different strategy implementation.
    pub fn with_strategy(mut self, strategy: Arc<dyn Strategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Runs a sequence of plays to completion, in order.
    pub async fn run_playbook(&self, plays: Vec<Arc<Play>>) -> Result<()> {
        for play in plays {
            self.run_play(play).await?;
        }
        let stats: Vec<_> = self
            .run_stats
            .lock()
            .iter()
            .map(|(h, s)| (h.clone(), *s))
            .collect();
        self.callback.on_run_complete(&stats).await;
        Ok(())
    }

    /// Runs one play: for each serial batch, iterates to completion, then
    /// cleanup, then flushes handlers.
    pub async fn run_play(&self, play: Arc<Play>) -> Result<()> {
        info!(play = %play.name, "starting play");
        self.callback.on_play_start(&play.name).await;

        for batch in play.host_batches()? {
            let handler_names = play.handlers.iter().map(|h| h.name().to_string());
            let state = Arc::new(SharedHostState::new(handler_names));
            *self.current_state.write() = Arc::clone(&state);
            let iterator = PlayIterator::new(Arc::clone(&play), &batch);

            let ctx = StrategyContext {
                play: Arc::clone(&play),
                job_tx: self.job_tx.clone(),
                tracker: Arc::clone(&self.tracker),
                state,
                callback: Arc::clone(&self.callback),
                variables: Arc::clone(&self.variables),
                play_context: Arc::clone(&self.play_context),
            };

            self.strategy.run(&ctx, &iterator, &batch).await?;
            self.strategy.cleanup(&ctx, &iterator, &batch).await?;
            self.strategy.run_handlers(&ctx, &iterator, &batch).await?;
        }

        info!(play = %play.name, "play completed");
        Ok(())
    }

    /// Sends one shutdown sentinel per worker and waits for every task to exit.
    pub async fn shutdown(mut self) {
        for _ in 0..self.num_workers {
            let _ = self.job_tx.send(Job::Shutdown).await;
        }
        for handle in self.worker_handles.drain(..) {
            let _ = handle.await;
        }
        drop(self.result_tx.take());
        if let Some(handle) = self.result_handle.take() {
            let _ = handle.await;
        }
    }
}

/// Wraps a callback to also fold every result into a per-host [`RunStats`]
/// tally, since the result processor (not the strategy) sees every result.
struct StatsRecordingCallback {
    inner: BoxedCallback,
    stats: Arc<parking_lot::Mutex<std::collections::BTreeMap<String, RunStats>>>,
}

#[async_trait::async_trait]
impl crate::callback::Callback for StatsRecordingCallback {
    async fn on_play_start(&self, name: &str) {
        self.inner.on_play_start(name).await;
    }
    async fn on_task_start(&self, name: &str) {
        self.inner.on_task_start(name).await;
    }
    async fn on_cleanup_task_start(&self, name: &str) {
        self.inner.on_cleanup_task_start(name).await;
    }
    async fn on_handler_task_start(&self, name: &str) {
        self.inner.on_handler_task_start(name).await;
    }
    async fn on_no_hosts_remaining(&self) {
        self.inner.on_no_hosts_remaining().await;
    }
    async fn on_ok(&self, result: &crate::executor::task::TaskResult) {
        self.stats.lock().entry(result.host.clone()).or_default().record(result);
        self.inner.on_ok(result).await;
    }
    async fn on_failed(&self, result: &crate::executor::task::TaskResult) {
        self.stats.lock().entry(result.host.clone()).or_default().record(result);
        self.inner.on_failed(result).await;
    }
    async fn on_unreachable(&self, result: &crate::executor::task::TaskResult) {
        self.stats.lock().entry(result.host.clone()).or_default().record(result);
        self.inner.on_unreachable(result).await;
    }
    async fn on_skipped(&self, result: &crate::executor::task::TaskResult) {
        self.stats.lock().entry(result.host.clone()).or_default().record(result);
        self.inner.on_skipped(result).await;
    }
    async fn on_run_complete(&self, stats: &[(String, RunStats)]) {
        self.inner.on_run_complete(stats).await;
    }
}
