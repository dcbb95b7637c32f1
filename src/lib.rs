//! # Rustible — task execution core
//!
//! This crate is the execution core of a fleet-automation engine: the part
//! that takes a playbook (plays of blocks, tasks, rescue/always branches,
//! and handlers) and an already-resolved list of target hosts, and drives
//! tasks to completion across those hosts in parallel.
//!
//! ## Core Concepts
//!
//! - **Play**: a host selector plus a compiled task graph and handlers.
//! - **Block**: a grouping of tasks with optional `rescue`/`always` branches.
//! - **Role**: a reusable bundle of tasks with a run-once-per-play policy.
//! - **PlayIterator**: the per-host state machine deciding what runs next.
//! - **TaskQueueManager**: owns the worker pool and the job/result queues.
//! - **Strategy**: the scheduling policy (`linear` is the default and only
//!   one shipped) deciding which host runs which task when.
//!
//! ## What this crate does not do
//!
//! Parsing playbook source text, resolving inventory, connecting to hosts,
//! templating, and privilege escalation are all out of scope — see
//! [`executor::task_executor`] and [`executor::variables`] for the seams
//! where those collaborators plug in.
//!
//! ## Quick example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rustible::prelude::*;
//!
//! # async fn run() -> rustible::error::Result<()> {
//! let mut roles = Vec::new();
//! let (tasks, blocks) = compile(
//!     vec![BlockSpec {
//!         block: vec![Task::new("say hello", "debug")],
//!         ..Default::default()
//!     }],
//!     &mut roles,
//! );
//! let play = Arc::new(Play {
//!     name: "example".into(),
//!     hosts: vec!["localhost".into()],
//!     gather_facts: false,
//!     serial: None,
//!     tasks: tasks.into(),
//!     blocks: blocks.into(),
//!     roles: roles.into(),
//!     handlers: Arc::from(Vec::new()),
//! });
//!
//! let manager = TaskQueueManager::new(
//!     &Defaults::default(),
//!     Arc::new(DebugTaskExecutor),
//!     Arc::new(StaticVariableManager::default()),
//!     Arc::new(NullCallback::new()),
//! );
//! manager.run_play(play).await?;
//! manager.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod callback;
pub mod config;
pub mod error;
pub mod executor;
pub mod output;

/// Convenient re-exports for consumers of this crate.
pub mod prelude {
    pub use crate::callback::{BoxedCallback, Callback, DefaultCallback, MinimalCallback, NullCallback, RunStats};
    pub use crate::config::{Config, Defaults};
    pub use crate::error::{Error, ErrorContext, Result};
    pub use crate::executor::{
        compile, Block, BlockId, BlockSpec, DebugTaskExecutor, ExecutedTask, FailedState, Handler,
        Host, Job, JobTracker, LinearStrategy, Play, PlayContext, PlayIterator, Role, RoleId,
        RunState, Serial, SharedHostState, StaticVariableManager, Strategy, StrategyContext, Task,
        TaskExecutor, TaskExecutorError, TaskQueueManager, TaskResult, TaskStatus, VariableManager,
    };
}
