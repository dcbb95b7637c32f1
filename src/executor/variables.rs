//! Variable resolution boundary.
//!
//! Full variable precedence (role defaults < group_vars < host_vars < play
//! vars < extra-vars, templated through Jinja2-style expressions) is out of
//! scope for this crate. What remains is the seam the strategy calls before
//! handing work to a worker: resolve whatever a (play, host, task) triple
//! needs into one JSON value.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::executor::block::Play;
use crate::executor::task::Task;

/// Resolves variables for a (play, host, task) triple.
#[async_trait]
pub trait VariableManager: Send + Sync {
    /// Returns the variables a task should see when run on `host`.
    async fn get_vars(&self, play: &Play, host: &str, task: &Task) -> Result<Value>;
}

/// A trivial variable manager: shallow-merges a play-level map with a
/// per-host map, host winning on key collision. No templating, no
/// precedence chain — just enough to drive an end-to-end run.
#[derive(Debug, Default, Clone)]
pub struct StaticVariableManager {
    play_vars: Value,
    host_vars: std::collections::HashMap<String, Value>,
}

impl StaticVariableManager {
    /// Builds a manager with play-level vars and no host overrides.
    pub fn new(play_vars: Value) -> Self {
        Self {
            play_vars,
            host_vars: std::collections::HashMap::new(),
        }
    }

    /// Adds (or replaces) a host's variable overrides.
    pub fn set_host_vars(&mut self, host: impl Into<String>, vars: Value) {
        self.host_vars.insert(host.into(), vars);
    }
}

#[async_trait]
impl VariableManager for StaticVariableManager {
    async fn get_vars(&self, _play: &Play, host: &str, _task: &Task) -> Result<Value> {
        let mut merged = self.play_vars.clone();
        if let Some(host_vars) = self.host_vars.get(host) {
            if let (Value::Object(base), Value::Object(over)) = (&mut merged, host_vars) {
                for (k, v) in over {
                    base.insert(k.clone(), v.clone());
                }
            } else {
                merged = host_vars.clone();
            }
        }
        if merged.is_null() {
            merged = Value::Object(serde_json::Map::new());
        }
        Ok(merged)
    }
}
