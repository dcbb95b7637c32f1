//! Blocks, roles, and plays: the static shape of a playbook's task graph.
//!
//! Blocks and roles are stored in per-play arenas rather than linked by
//! `Rc`/`RefCell`, so a [`Task`] can carry a plain index back to its owning
//! block or role instead of an owning pointer. This sidesteps the
//! self-referential-graph problem Rust ownership would otherwise impose on a
//! tree of tasks that also need to point back at their parent.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::executor::task::{Handler, Task};

/// Index into a play's block arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub usize);

impl BlockId {
    /// The implicit root block every play starts with.
    pub fn root() -> Self {
        BlockId(0)
    }
}

/// Index into a play's role arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(pub usize);

/// A grouping of tasks with optional rescue/always branches.
///
/// `block`, `rescue`, and `always` hold indices into the play's flattened
/// task sequence (`Play::tasks`), not `Task` values directly — the
/// sequence is the single owner of task data.
#[derive(Debug, Clone, Default)]
pub struct Block {
    /// Parent block, if nested.
    pub parent: Option<BlockId>,
    /// Index range (start, end) into `Play::tasks` for the main body.
    pub body: (usize, usize),
    /// Index range into `Play::tasks` for the rescue branch.
    pub rescue: (usize, usize),
    /// Index range into `Play::tasks` for the always branch.
    pub always: (usize, usize),
}

impl Block {
    pub(crate) fn has_rescue(&self) -> bool {
        self.rescue.1 > self.rescue.0
    }

    pub(crate) fn has_always(&self) -> bool {
        self.always.1 > self.always.0
    }
}

/// A reusable bundle of tasks and handlers.
///
/// `has_run` is shared across every host's iteration state: a role with
/// `allow_duplicates = false` runs at most once across the whole play,
/// regardless of how many hosts reach it, matching the upstream role
/// semantics this design is modeled on.
#[derive(Debug, Clone)]
pub struct Role {
    /// Role name.
    pub name: String,
    /// Whether the role may run more than once in a play.
    pub allow_duplicates: bool,
    /// Whether this role has already run (global, not per-host).
    has_run: Arc<AtomicBool>,
}

impl Role {
    /// Declares a new role.
    pub fn new(name: impl Into<String>, allow_duplicates: bool) -> Self {
        Self {
            name: name.into(),
            allow_duplicates,
            has_run: Arc::new(AtomicBool::new(false)),
        }
    }

    /// True if this role should be skipped for a new caller.
    pub fn should_skip(&self) -> bool {
        !self.allow_duplicates && self.has_run.load(Ordering::Acquire)
    }

    /// Marks the role as having run. Idempotent.
    pub fn mark_run(&self) {
        self.has_run.store(true, Ordering::Release);
    }
}

/// Source shape for building a block before flattening, used by the builder
/// API and the small YAML loader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockSpec {
    /// Main task list.
    #[serde(default)]
    pub block: Vec<Task>,
    /// Rescue branch.
    #[serde(default)]
    pub rescue: Vec<Task>,
    /// Always branch.
    #[serde(default)]
    pub always: Vec<Task>,
    /// Nested blocks instead of bare tasks, if this spec is itself a composite.
    #[serde(default)]
    pub nested: Vec<BlockSpec>,
    /// Name of the role every task in this spec belongs to, if any.
    #[serde(default)]
    pub role: Option<String>,
    /// Whether `role` may run more than once in a play. Ignored if `role`
    /// is `None`. Only takes effect the first time a given role name is
    /// registered; later specs reusing the same name keep that role's
    /// original setting.
    #[serde(default)]
    pub allow_duplicates: bool,
}

/// One play: a host selector plus its compiled task graph and handlers.
#[derive(Debug, Clone)]
pub struct Play {
    /// Play name.
    pub name: String,
    /// Host selector (already resolved to concrete host names by the caller).
    pub hosts: Vec<String>,
    /// Whether to run the synthesized `setup` task.
    pub gather_facts: bool,
    /// Batch width: `None` means all hosts in one batch.
    pub serial: Option<Serial>,
    /// Flattened task sequence, shared immutably once compiled.
    pub tasks: Arc<[Task]>,
    /// Block arena.
    pub blocks: Arc<[Block]>,
    /// Role arena.
    pub roles: Arc<[Role]>,
    /// Declared handlers, in declaration order (flush order).
    pub handlers: Arc<[Handler]>,
}

/// A play's `serial` setting.
#[derive(Debug, Clone, Copy)]
pub enum Serial {
    /// Fixed batch size.
    Count(usize),
    /// Percentage of the host list, rounded up.
    Percent(f64),
}

impl Serial {
    /// Resolves this serial spec to a concrete batch size for `total` hosts.
    pub fn batch_size(&self, total: usize) -> Result<usize> {
        let size = match self {
            Serial::Count(n) => *n,
            Serial::Percent(pct) => {
                if !(*pct > 0.0) {
                    return Err(Error::InvalidSerial(format!(
                        "percentage must be positive, got {pct}"
                    )));
                }
                ((pct / 100.0) * total as f64).ceil() as usize
            }
        };
        if size == 0 {
            return Err(Error::InvalidSerial("resolved batch size is zero".into()));
        }
        Ok(size.min(total.max(1)))
    }
}

impl Play {
    /// Partitions `hosts` into serial batches according to this play's `serial` setting.
    pub fn host_batches(&self) -> Result<Vec<Vec<String>>> {
        match &self.serial {
            None => Ok(vec![self.hosts.clone()]),
            Some(serial) => {
                let size = serial.batch_size(self.hosts.len())?;
                Ok(self.hosts.chunks(size).map(|c| c.to_vec()).collect())
            }
        }
    }

    /// Looks up a block by id.
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.0]
    }
}

/// Flattens a list of top-level [`BlockSpec`]s into a compiled [`Play`] task
/// sequence plus block/role arenas, wiring each [`Task`]'s `block`/`role`
/// back-references as it goes.
///
/// Consecutive bare top-level tasks are coalesced into one implicit root
/// block, matching the "a play's bare task list is one block, not one per
/// task" rule.
pub fn compile(specs: Vec<BlockSpec>, role_registry: &mut Vec<Role>) -> (Vec<Task>, Vec<Block>) {
    let mut tasks = Vec::new();
    let mut blocks = vec![Block::default()]; // index 0 reserved as the implicit root
    compile_into(specs, None, role_registry, &mut tasks, &mut blocks);
    (tasks, blocks)
}

fn compile_into(
    specs: Vec<BlockSpec>,
    parent: Option<BlockId>,
    role_registry: &mut Vec<Role>,
    tasks: &mut Vec<Task>,
    blocks: &mut Vec<Block>,
) {
    for spec in specs {
        let role_id = spec
            .role
            .map(|name| resolve_role(name, spec.allow_duplicates, role_registry));

        if !spec.nested.is_empty() {
            let block_id = BlockId(blocks.len());
            blocks.push(Block {
                parent,
                ..Block::default()
            });
            compile_into(spec.nested, Some(block_id), role_registry, tasks, blocks);
            continue;
        }

        let block_id = BlockId(blocks.len());
        blocks.push(Block {
            parent,
            ..Block::default()
        });

        let body_start = tasks.len();
        for mut t in spec.block {
            t.block = block_id;
            t.role = role_id;
            tasks.push(t);
        }
        let body_end = tasks.len();

        let rescue_start = tasks.len();
        for mut t in spec.rescue {
            t.block = block_id;
            t.role = role_id;
            tasks.push(t);
        }
        let rescue_end = tasks.len();

        let always_start = tasks.len();
        for mut t in spec.always {
            t.block = block_id;
            t.role = role_id;
            tasks.push(t);
        }
        let always_end = tasks.len();

        let block = &mut blocks[block_id.0];
        block.body = (body_start, body_end);
        block.rescue = (rescue_start, rescue_end);
        block.always = (always_start, always_end);
    }
}

fn resolve_role(name: String, allow_duplicates: bool, registry: &mut Vec<Role>) -> RoleId {
    if let Some(pos) = registry.iter().position(|r| r.name == name) {
        return RoleId(pos);
    }
    registry.push(Role::new(name, allow_duplicates));
    RoleId(registry.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_coalesces_bare_tasks_into_one_block() {
        let specs = vec![BlockSpec {
            block: vec![Task::new("t1", "debug"), Task::new("t2", "debug")],
            ..Default::default()
        }];
        let mut roles = Vec::new();
        let (tasks, blocks) = compile(specs, &mut roles);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].block, tasks[1].block);
        assert!(blocks.len() >= 2);
    }

    #[test]
    fn serial_percent_rounds_up() {
        let serial = Serial::Percent(50.0);
        assert_eq!(serial.batch_size(5).unwrap(), 3);
    }
}
