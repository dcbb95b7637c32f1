//! The task executor boundary: the black box a worker calls to actually run
//! a task against a host. Connection plugins, module dispatch, and
//! privilege escalation all live on the other side of this trait — none of
//! that is this crate's concern.

use async_trait::async_trait;
use serde_json::Value;

use crate::executor::block::Play;
use crate::executor::task::{ExecutedTask, Task};

/// Context describing how a task should be run, independent of its content.
#[derive(Debug, Clone, Default)]
pub struct PlayContext {
    /// Run without making changes.
    pub check_mode: bool,
    /// Ask the executor to report a diff of any change.
    pub diff_mode: bool,
    /// Soft timeout hint, in seconds.
    pub task_timeout: u64,
}

/// An error the task executor can raise. Distinguishing "unreachable" from
/// other failures lets the worker classify the result without inspecting
/// message text.
#[derive(Debug, thiserror::Error)]
pub enum TaskExecutorError {
    /// The host could not be reached at all.
    #[error("unreachable: {0}")]
    Unreachable(String),
    /// Anything else — a module error, a bad argument, etc.
    #[error("{0}")]
    Other(String),
}

/// The boundary a worker calls to run one task on one host.
///
/// Implementations are responsible for module dispatch, connection
/// handling, and templating — none of which this crate implements.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Runs `task` on `host` with `vars` already resolved, returning the
    /// executor's report or a classified error.
    async fn run(
        &self,
        host: &str,
        task: &Task,
        vars: &Value,
        play: &Play,
        context: &PlayContext,
    ) -> Result<ExecutedTask, TaskExecutorError>;
}

/// A minimal in-process executor for demonstration and tests: it understands
/// exactly one action, `debug`, which prints `args.msg` (or the task name)
/// and always succeeds without changing anything. Any other action is
/// treated as a failure, since a real module dispatcher is out of scope
/// here.
#[derive(Debug, Default)]
pub struct DebugTaskExecutor;

#[async_trait]
impl TaskExecutor for DebugTaskExecutor {
    async fn run(
        &self,
        _host: &str,
        task: &Task,
        vars: &Value,
        _play: &Play,
        _context: &PlayContext,
    ) -> Result<ExecutedTask, TaskExecutorError> {
        if task.action == "setup" {
            return Ok(ExecutedTask {
                changed: false,
                ..Default::default()
            });
        }
        if task.action != "debug" {
            return Err(TaskExecutorError::Other(format!(
                "no action handler registered for '{}'",
                task.action
            )));
        }
        let msg = task
            .args
            .get("msg")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| task.name.clone());
        let _ = vars; // available to a real implementation for templating
        Ok(ExecutedTask {
            changed: false,
            msg: Some(msg),
            ..Default::default()
        })
    }
}
