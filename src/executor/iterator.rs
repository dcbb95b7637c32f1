//! Per-host play iteration: the finite-state machine that decides what task
//! a given host should run next.
//!
//! Mirrors the state machine of a classic play iterator: each host walks
//! Setup → Tasks → (Rescue) → (Always) → Complete, diverting into a block's
//! rescue/always branches on failure and at block exit.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::executor::block::{BlockId, Play};
use crate::executor::task::Task;

/// Where a host currently sits in its own walk of the task graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// About to run (or skip) the synthesized `setup` task.
    Setup,
    /// Walking the main task sequence.
    Tasks,
    /// Walking a block's rescue branch.
    Rescue,
    /// Walking a block's always branch.
    Always,
    /// Nothing left to run.
    Complete,
}

/// Which phase, if any, a host has failed in.
///
/// Once set, never cleared — a host's failure never un-happens, though the
/// phase it names escalates forward as the host proceeds into rescue/always.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailedState {
    /// No failure yet.
    None,
    /// Failed during setup.
    Setup,
    /// Failed during the main task sequence.
    Tasks,
    /// Failed during a rescue branch.
    Rescue,
    /// Failed during an always branch.
    Always,
}

#[derive(Debug, Clone, Copy)]
struct HostState {
    run_state: RunState,
    failed_state: FailedState,
    cur_block: Option<BlockId>,
    cur_task_pos: usize,
    cur_rescue_pos: usize,
    cur_always_pos: usize,
}

impl Default for HostState {
    fn default() -> Self {
        Self {
            run_state: RunState::Setup,
            failed_state: FailedState::None,
            cur_block: None,
            cur_task_pos: 0,
            cur_rescue_pos: 0,
            cur_always_pos: 0,
        }
    }
}

/// Drives per-host iteration over one play's compiled task graph.
pub struct PlayIterator {
    play: std::sync::Arc<Play>,
    states: DashMap<String, HostState>,
}

impl PlayIterator {
    /// Builds a fresh iterator for `hosts` over `play`. Every handler's
    /// trigger state is reset, matching the "handlers survive until end of
    /// play then are discarded" lifecycle rule.
    pub fn new(play: std::sync::Arc<Play>, hosts: &[String]) -> Self {
        let states = DashMap::new();
        for host in hosts {
            states.insert(host.clone(), HostState::default());
        }
        for handler in play.handlers.iter() {
            handler.reset();
        }
        Self { play, states }
    }

    /// The play this iterator is walking.
    pub fn play(&self) -> &Play {
        &self.play
    }

    /// Returns the next task for `host`, advancing its cursor unless `peek`.
    pub fn next_task_for_host(&self, host: &str, peek: bool) -> Result<Option<Task>> {
        let mut guard = self
            .states
            .get_mut(host)
            .ok_or_else(|| Error::InvalidHost(host.to_string()))?;

        let mut state = *guard;
        let task = advance(&mut state, &self.play);
        if !peek {
            *guard = state;
        }
        Ok(task)
    }

    /// Convenience for the representative host driving the strategy's loop:
    /// the first host registered with this iterator.
    pub fn get_next_task(&self, representative: &str, peek: bool) -> Result<Option<Task>> {
        self.next_task_for_host(representative, peek)
    }

    /// Escalates `host`'s failure to the phase it is currently in.
    pub fn mark_host_failed(&self, host: &str) -> Result<()> {
        let mut guard = self
            .states
            .get_mut(host)
            .ok_or_else(|| Error::InvalidHost(host.to_string()))?;

        guard.failed_state = match guard.run_state {
            RunState::Setup => FailedState::Setup,
            RunState::Tasks => FailedState::Tasks,
            RunState::Rescue => FailedState::Rescue,
            RunState::Always | RunState::Complete => FailedState::Always,
        };
        Ok(())
    }

    /// Whether `host` has nothing left to run.
    pub fn is_complete(&self, host: &str) -> Result<bool> {
        let guard = self
            .states
            .get(host)
            .ok_or_else(|| Error::InvalidHost(host.to_string()))?;
        Ok(guard.run_state == RunState::Complete)
    }
}

/// Advances `state` one step against `play`, returning the next task to run
/// (if any). A pure function over the cursor fields, so it is unit-testable
/// without any iterator/host plumbing around it.
fn advance(state: &mut HostState, play: &Play) -> Option<Task> {
    // Bounded to avoid an infinite loop in case of a malformed graph; a
    // correctly compiled play can never need more hops than this.
    let bound = play.tasks.len() * 4 + play.blocks.len() * 4 + 8;
    for _ in 0..bound {
        match state.run_state {
            RunState::Setup => {
                if state.failed_state == FailedState::Setup {
                    state.run_state = RunState::Complete;
                    continue;
                }
                state.run_state = RunState::Tasks;
                if play.gather_facts {
                    return Some(Task::setup());
                }
            }
            RunState::Tasks => match state.cur_block {
                Some(cur) => {
                    let block = play.block(cur);
                    let failed_here = state.failed_state != FailedState::None;
                    if failed_here || state.cur_task_pos >= block.body.1 {
                        // Body exhausted (or already failed somewhere in this
                        // block): divert into rescue (if failed in the body)
                        // or always, regardless of success — `always` runs
                        // unconditionally once a block is left.
                        if end_of_block_body(state, play) {
                            continue;
                        }
                        continue;
                    }
                    let candidate = &play.tasks[state.cur_task_pos];
                    state.cur_task_pos += 1;
                    return Some(candidate.clone());
                }
                None => {
                    // Between blocks (or at the very start of Tasks): the
                    // cursor always sits exactly at the next sibling block's
                    // body start here, since `end_of_always` advances it
                    // past the whole of a finished block's region.
                    if state.failed_state != FailedState::None
                        || state.cur_task_pos >= play.tasks.len()
                    {
                        state.run_state = RunState::Complete;
                        continue;
                    }
                    let candidate = &play.tasks[state.cur_task_pos];
                    // Role dedup is decided once, at block entry: a role
                    // without `allow_duplicates` either runs all of its
                    // tasks (this encounter) or none of them (a later one),
                    // never some of each.
                    if let Some(role_id) = candidate.role {
                        let role = &play.roles[role_id.0];
                        if role.should_skip() {
                            state.cur_task_pos = play.block(candidate.block).always.1;
                            continue;
                        }
                        role.mark_run();
                    }
                    state.cur_block = Some(candidate.block);
                }
            },
            RunState::Rescue => {
                let cur = state.cur_block.expect("rescue state without a block");
                let block = play.block(cur);
                if state.failed_state == FailedState::Rescue || state.cur_rescue_pos >= block.rescue.1
                {
                    if enter_always(state, play, cur) {
                        continue;
                    }
                    continue;
                }
                let idx = state.cur_rescue_pos;
                state.cur_rescue_pos += 1;
                return Some(play.tasks[idx].clone());
            }
            RunState::Always => {
                let cur = state.cur_block.expect("always state without a block");
                let block = play.block(cur);
                if state.failed_state == FailedState::Always || state.cur_always_pos >= block.always.1
                {
                    end_of_always(state, play);
                    continue;
                }
                let idx = state.cur_always_pos;
                state.cur_always_pos += 1;
                return Some(play.tasks[idx].clone());
            }
            RunState::Complete => return None,
        }
    }
    None
}

/// Called when the main body of the current block has been exhausted (or
/// the host has failed in `Tasks`). Diverts into rescue, then always, then
/// falls through to the next block or completion. Returns `true` once the
/// loop in [`advance`] should re-evaluate.
fn end_of_block_body(state: &mut HostState, play: &Play) -> bool {
    let cur = match state.cur_block {
        Some(b) => b,
        None => {
            state.run_state = RunState::Complete;
            return true;
        }
    };
    let block = play.block(cur);
    if state.failed_state == FailedState::Tasks && block.has_rescue() {
        state.run_state = RunState::Rescue;
        state.cur_rescue_pos = block.rescue.0;
        return true;
    }
    enter_always(state, play, cur)
}

/// Diverts into `block_id`'s always clause if it has one; otherwise behaves
/// as if always had completed immediately.
fn enter_always(state: &mut HostState, play: &Play, block_id: BlockId) -> bool {
    let block = play.block(block_id);
    if block.has_always() {
        state.run_state = RunState::Always;
        state.cur_always_pos = block.always.0;
        true
    } else {
        end_of_always(state, play);
        true
    }
}

/// Called once an always branch is exhausted (or failed, or never existed).
/// Advances the cursor past this block's entire region (body + rescue +
/// always) so `Tasks`'s `None`-block arm finds the next sibling's body
/// start, then clears the current block and either resumes `Tasks` or
/// completes.
fn end_of_always(state: &mut HostState, play: &Play) {
    if let Some(cur) = state.cur_block {
        state.cur_task_pos = play.block(cur).always.1;
    }
    state.cur_block = None;
    if state.failed_state == FailedState::Always {
        state.run_state = RunState::Complete;
        return;
    }
    if state.cur_task_pos >= play.tasks.len() {
        state.run_state = RunState::Complete;
        return;
    }
    state.run_state = RunState::Tasks;
}
