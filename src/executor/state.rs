//! Shared, concurrently-mutated host-state dictionaries owned by the task
//! queue manager and read/written by workers, the result processor, and the
//! strategy.

use dashmap::{DashMap, DashSet};

/// `blocked_hosts` / `failed_hosts` / `unreachable_hosts` / `notified_handlers`,
/// bundled behind one type so the manager and strategy share one handle.
///
/// Each composite update (e.g. "append host to this handler's notify list
/// unless already present") goes through a single `DashMap`/`DashSet` call,
/// which gives per-key atomicity without a manual global lock.
#[derive(Default)]
pub struct SharedHostState {
    blocked: DashSet<String>,
    failed: DashSet<String>,
    unreachable: DashSet<String>,
    notified: DashMap<String, Vec<String>>,
}

impl SharedHostState {
    /// Builds empty state, pre-registering every declared handler name so
    /// `notified_handlers[name]` always exists (possibly empty).
    pub fn new(handler_names: impl IntoIterator<Item = String>) -> Self {
        let notified = DashMap::new();
        for name in handler_names {
            notified.insert(name, Vec::new());
        }
        Self {
            blocked: DashSet::new(),
            failed: DashSet::new(),
            unreachable: DashSet::new(),
            notified,
        }
    }

    /// Marks `host` as having a job in flight.
    pub fn mark_blocked(&self, host: &str) {
        self.blocked.insert(host.to_string());
    }

    /// Clears the in-flight marker for `host`.
    pub fn unblock(&self, host: &str) {
        self.blocked.remove(host);
    }

    /// Whether `host` currently has a job in flight.
    pub fn is_blocked(&self, host: &str) -> bool {
        self.blocked.contains(host)
    }

    /// Records `host` as failed.
    pub fn mark_failed(&self, host: &str) {
        self.failed.insert(host.to_string());
    }

    /// Whether `host` has failed.
    pub fn is_failed(&self, host: &str) -> bool {
        self.failed.contains(host)
    }

    /// Snapshot of every currently-failed host.
    pub fn failed_hosts(&self) -> Vec<String> {
        self.failed.iter().map(|h| h.clone()).collect()
    }

    /// Removes a host from `failed_hosts` (used by cleanup once it has been revisited).
    pub fn clear_failed(&self) {
        self.failed.clear();
    }

    /// Records `host` as unreachable.
    pub fn mark_unreachable(&self, host: &str) {
        self.unreachable.insert(host.to_string());
    }

    /// Whether `host` is unreachable.
    pub fn is_unreachable(&self, host: &str) -> bool {
        self.unreachable.contains(host)
    }

    /// Appends `host` to `handler`'s notify list, unless already present.
    /// Atomic per handler name via `DashMap`'s per-shard locking.
    pub fn notify(&self, handler: &str, host: &str) {
        let mut entry = self.notified.entry(handler.to_string()).or_default();
        if !entry.iter().any(|h| h == host) {
            entry.push(host.to_string());
        }
    }

    /// The hosts that have notified `handler`, in notify order.
    pub fn notified_hosts(&self, handler: &str) -> Vec<String> {
        self.notified
            .get(handler)
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    /// Clears a handler's notify list after it has been flushed.
    pub fn clear_notified(&self, handler: &str) {
        if let Some(mut entry) = self.notified.get_mut(handler) {
            entry.clear();
        }
    }

    /// A host is excluded from further scheduling once failed or unreachable.
    pub fn is_excluded(&self, host: &str) -> bool {
        self.is_failed(host) || self.is_unreachable(host)
    }
}
