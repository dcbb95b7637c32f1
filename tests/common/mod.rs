//! Shared test fixtures: a scriptable [`TaskExecutor`] and a recording
//! [`Callback`], used across the integration tests to drive a
//! `TaskQueueManager` end to end without a real connection layer.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use rustible::prelude::*;

/// What a scripted task call should report.
#[derive(Debug, Clone)]
pub enum Script {
    Ok,
    Changed,
    Failed(String),
    Unreachable(String),
}

/// A [`TaskExecutor`] whose outcome per (host, task name) is configured up
/// front, and which records the order tasks actually ran in.
#[derive(Default)]
pub struct ScriptedExecutor {
    scripts: Mutex<HashMap<(String, String), Script>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, host: &str, task_name: &str, outcome: Script) {
        self.scripts
            .lock()
            .unwrap()
            .insert((host.to_string(), task_name.to_string()), outcome);
    }

    /// (host, task name) pairs in the order they were run.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskExecutor for ScriptedExecutor {
    async fn run(
        &self,
        host: &str,
        task: &Task,
        _vars: &Value,
        _play: &Play,
        _context: &PlayContext,
    ) -> Result<ExecutedTask, TaskExecutorError> {
        self.calls
            .lock()
            .unwrap()
            .push((host.to_string(), task.name.clone()));

        let outcome = self
            .scripts
            .lock()
            .unwrap()
            .get(&(host.to_string(), task.name.clone()))
            .cloned()
            .unwrap_or(Script::Ok);

        match outcome {
            Script::Ok => Ok(ExecutedTask {
                changed: false,
                ..Default::default()
            }),
            Script::Changed => Ok(ExecutedTask {
                changed: true,
                ..Default::default()
            }),
            Script::Failed(msg) => Ok(ExecutedTask {
                failed: true,
                msg: Some(msg),
                ..Default::default()
            }),
            Script::Unreachable(msg) => Err(TaskExecutorError::Unreachable(msg)),
        }
    }
}

/// Records every event fired during a run, for assertions on ordering and
/// final per-host tallies.
#[derive(Default)]
pub struct RecordingCallback {
    pub task_starts: Mutex<Vec<String>>,
    pub handler_starts: Mutex<Vec<String>>,
    pub results: Mutex<Vec<TaskResult>>,
    pub final_stats: Mutex<Vec<(String, RunStats)>>,
}

impl RecordingCallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task_starts(&self) -> Vec<String> {
        self.task_starts.lock().unwrap().clone()
    }

    pub fn handler_starts(&self) -> Vec<String> {
        self.handler_starts.lock().unwrap().clone()
    }

    pub fn results_for(&self, host: &str) -> Vec<(String, TaskStatus)> {
        self.results
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.host == host)
            .map(|r| (r.task_name.clone(), r.status()))
            .collect()
    }
}

#[async_trait]
impl Callback for RecordingCallback {
    async fn on_task_start(&self, name: &str) {
        self.task_starts.lock().unwrap().push(name.to_string());
    }

    async fn on_cleanup_task_start(&self, name: &str) {
        self.task_starts.lock().unwrap().push(name.to_string());
    }

    async fn on_handler_task_start(&self, name: &str) {
        self.handler_starts.lock().unwrap().push(name.to_string());
    }

    async fn on_ok(&self, result: &TaskResult) {
        self.results.lock().unwrap().push(result.clone());
    }

    async fn on_failed(&self, result: &TaskResult) {
        self.results.lock().unwrap().push(result.clone());
    }

    async fn on_unreachable(&self, result: &TaskResult) {
        self.results.lock().unwrap().push(result.clone());
    }

    async fn on_skipped(&self, result: &TaskResult) {
        self.results.lock().unwrap().push(result.clone());
    }

    async fn on_run_complete(&self, stats: &[(String, RunStats)]) {
        *self.final_stats.lock().unwrap() = stats.to_vec();
    }
}

/// Builds a single-block play with the given tasks, no rescue/always.
pub fn simple_play(name: &str, hosts: &[&str], tasks: Vec<Task>) -> std::sync::Arc<Play> {
    play_from_blocks(
        name,
        hosts,
        vec![BlockSpec {
            block: tasks,
            ..Default::default()
        }],
        false,
    )
}

pub fn play_from_blocks(
    name: &str,
    hosts: &[&str],
    blocks: Vec<BlockSpec>,
    gather_facts: bool,
) -> std::sync::Arc<Play> {
    let mut roles = Vec::new();
    let (tasks, blocks) = compile(blocks, &mut roles);
    std::sync::Arc::new(Play {
        name: name.to_string(),
        hosts: hosts.iter().map(|h| h.to_string()).collect(),
        gather_facts,
        serial: None,
        tasks: tasks.into(),
        blocks: blocks.into(),
        roles: roles.into(),
        handlers: std::sync::Arc::from(Vec::new()),
    })
}

pub fn manager_with(
    executor: std::sync::Arc<ScriptedExecutor>,
    callback: std::sync::Arc<RecordingCallback>,
    forks: usize,
) -> TaskQueueManager {
    let defaults = Defaults {
        forks,
        ..Defaults::default()
    };
    TaskQueueManager::new(
        &defaults,
        executor,
        std::sync::Arc::new(StaticVariableManager::default()),
        callback,
    )
}
