//! Task and handler definitions, and the result shape a task executor reports.

use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::executor::block::{BlockId, RoleId};

/// A single unit of work within a block.
///
/// Immutable once loaded. `block` and `role` are back-references into the
/// play's arenas, set by [`crate::executor::block::compile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Stable identity, independent of name (names need not be unique).
    #[serde(default = "Uuid::new_v4")]
    pub uuid: Uuid,

    /// Human-readable name, shown by callbacks.
    pub name: String,

    /// The action to perform; opaque to the core, interpreted by the task executor.
    pub action: String,

    /// Arguments to the action.
    #[serde(default)]
    pub args: IndexMap<String, Value>,

    /// Handler names to notify if this task reports a change.
    #[serde(default)]
    pub notify: Vec<String>,

    /// Raw conditional expression; opaque to the core, evaluated upstream of enqueue.
    #[serde(default)]
    pub when: Option<String>,

    /// Tags; opaque to the core.
    #[serde(default)]
    pub tags: Vec<String>,

    /// The block this task belongs to (set during compile).
    #[serde(skip, default = "BlockId::root")]
    pub block: BlockId,

    /// The role this task belongs to, if any (set during compile).
    #[serde(skip, default)]
    pub role: Option<RoleId>,
}

impl Task {
    /// Builds a bare task with a fresh uuid, for tests and builder use.
    pub fn new(name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            action: action.into(),
            args: IndexMap::new(),
            notify: Vec::new(),
            when: None,
            tags: Vec::new(),
            block: BlockId::root(),
            role: None,
        }
    }

    /// Builder-style setter for `notify`.
    pub fn with_notify(mut self, handlers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.notify = handlers.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style setter for `args`.
    pub fn with_args(mut self, args: IndexMap<String, Value>) -> Self {
        self.args = args;
        self
    }

    /// The synthesized `setup` task emitted by the iterator when `gather_facts` is set.
    pub fn setup() -> Self {
        Self::new("Gathering Facts", "setup")
    }
}

/// A handler: a task that only runs when notified, at most once per host per play.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Handler {
    /// The handler's task body.
    pub task: Task,

    /// Hosts that have already triggered this handler this play.
    #[serde(skip)]
    triggered: Arc<Mutex<BTreeSet<String>>>,
}

impl Handler {
    /// Wraps a task as a handler.
    pub fn new(task: Task) -> Self {
        Self {
            task,
            triggered: Arc::new(Mutex::new(BTreeSet::new())),
        }
    }

    /// The handler's declared name (its task name).
    pub fn name(&self) -> &str {
        &self.task.name
    }

    /// Whether this handler has already run for `host` this play.
    pub fn has_triggered(&self, host: &str) -> bool {
        self.triggered.lock().contains(host)
    }

    /// Marks this handler as having run for `host`.
    pub fn mark_triggered(&self, host: &str) {
        self.triggered.lock().insert(host.to_string());
    }

    /// Resets trigger state; called at the start of a new play.
    pub fn reset(&self) {
        self.triggered.lock().clear();
    }
}

/// Outcome of one task execution, as reported by the task executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Ran successfully, no change made.
    Ok,
    /// Ran successfully, a change was made.
    Changed,
    /// Ran and failed.
    Failed,
    /// Not run (conditional evaluated false, upstream of the core).
    Skipped,
    /// Host could not be reached.
    Unreachable,
}

/// What a `TaskExecutor` returns for one (host, task) pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutedTask {
    /// Whether the action reports having changed host state.
    #[serde(default)]
    pub changed: bool,
    /// Whether the action failed.
    #[serde(default)]
    pub failed: bool,
    /// Whether the host was unreachable.
    #[serde(default)]
    pub unreachable: bool,
    /// Whether the task was skipped.
    #[serde(default)]
    pub skipped: bool,
    /// Human-readable message.
    #[serde(default)]
    pub msg: Option<String>,
    /// Arbitrary extra fields the executor wants to hand to callbacks.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl ExecutedTask {
    /// Resolves to the `TaskStatus` that best summarizes this outcome.
    pub fn status(&self) -> TaskStatus {
        if self.unreachable {
            TaskStatus::Unreachable
        } else if self.failed {
            TaskStatus::Failed
        } else if self.skipped {
            TaskStatus::Skipped
        } else if self.changed {
            TaskStatus::Changed
        } else {
            TaskStatus::Ok
        }
    }
}

/// A result flowing from a worker to the result processor.
#[derive(Debug, Clone)]
pub struct TaskResult {
    /// Host the task ran on.
    pub host: String,
    /// Identity of the task that ran.
    pub task_uuid: Uuid,
    /// Display name of the task, for callbacks.
    pub task_name: String,
    /// Handler names to notify, copied from the task (empty unless `outcome` is ok/changed).
    pub notify: Vec<String>,
    /// What happened.
    pub outcome: Result<ExecutedTask, String>,
}

impl TaskResult {
    /// The summarizing status for this result.
    pub fn status(&self) -> TaskStatus {
        match &self.outcome {
            Ok(executed) => executed.status(),
            Err(_) => TaskStatus::Failed,
        }
    }
}
