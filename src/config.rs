//! Layered configuration for the Rustible runtime.
//!
//! Configuration is loaded, in increasing order of precedence: compiled-in
//! defaults, a config file found on a standard search path (or named
//! explicitly), then environment variable overrides. Only the knobs the
//! execution core itself reads live here; anything about how a task is
//! rendered or a host is reached belongs to the collaborators around the
//! core, not to it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level configuration consumed by the task queue manager and CLI.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Execution-core knobs.
    pub defaults: Defaults,
    /// Logging knobs.
    pub logging: LoggingConfig,
}

/// Settings that shape how a playbook run is executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Number of worker tasks in the pool (`forks` in upstream terms).
    pub forks: usize,

    /// Name of the execution strategy to use ("linear" is the only one shipped).
    pub strategy: String,

    /// Whether to synthesize a `setup` (fact-gathering) task at the start of each play.
    pub gather_facts: bool,

    /// Run tasks without making changes; the task executor is expected to honor this.
    pub check_mode: bool,

    /// Ask the task executor to report a diff of any change it would make.
    pub diff_mode: bool,

    /// Soft timeout, in seconds, passed through to the task executor as a hint.
    pub task_timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            forks: 5,
            strategy: "linear".to_string(),
            gather_facts: true,
            check_mode: false,
            diff_mode: false,
            task_timeout: 30,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Optional path to write logs to; stderr otherwise.
    pub log_path: Option<PathBuf>,

    /// `tracing_subscriber::EnvFilter`-compatible directive, e.g. "info" or "rustible=debug".
    pub log_level: String,

    /// Emit logs as JSON instead of the default human-readable format.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            log_level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from all sources: defaults, config file search path, environment.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Config::default();

        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                config = config.merge_from_file(&path)?;
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// The list of configuration file paths to check, in order.
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        if let Some(path) = explicit_path {
            return vec![path.clone()];
        }

        let mut paths = Vec::new();
        paths.push(PathBuf::from("/etc/rustible/rustible.cfg"));

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".rustible.cfg"));
            paths.push(home.join(".rustible/rustible.cfg"));
            paths.push(home.join(".rustible/config"));
        }

        paths.push(PathBuf::from("rustible.cfg"));
        paths.push(PathBuf::from(".rustible.cfg"));

        if let Ok(env_config) = std::env::var("RUSTIBLE_CONFIG") {
            paths.insert(0, PathBuf::from(env_config));
        }

        paths
    }

    fn merge_from_file(&self, path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read config file '{}': {e}", path.display()),
        })?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let file_config: Config = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            "toml" => toml::from_str(&content).map_err(|e| Error::Config {
                message: format!("invalid TOML in '{}': {e}", path.display()),
            })?,
            _ => toml::from_str(&content)
                .or_else(|_| serde_yaml::from_str(&content))
                .map_err(|_| Error::Config {
                    message: format!("failed to parse config file: {}", path.display()),
                })?,
        };

        Ok(self.merge(file_config))
    }

    fn merge(&self, other: Config) -> Config {
        Config {
            defaults: Defaults {
                forks: if other.defaults.forks != Defaults::default().forks {
                    other.defaults.forks
                } else {
                    self.defaults.forks
                },
                strategy: if other.defaults.strategy != Defaults::default().strategy {
                    other.defaults.strategy
                } else {
                    self.defaults.strategy.clone()
                },
                gather_facts: other.defaults.gather_facts,
                check_mode: other.defaults.check_mode,
                diff_mode: other.defaults.diff_mode,
                task_timeout: if other.defaults.task_timeout != Defaults::default().task_timeout {
                    other.defaults.task_timeout
                } else {
                    self.defaults.task_timeout
                },
            },
            logging: other.logging,
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(forks) = std::env::var("RUSTIBLE_FORKS") {
            if let Ok(n) = forks.parse() {
                self.defaults.forks = n;
            }
        }

        if let Ok(timeout) = std::env::var("RUSTIBLE_TIMEOUT") {
            if let Ok(n) = timeout.parse() {
                self.defaults.task_timeout = n;
            }
        }

        if let Ok(strategy) = std::env::var("RUSTIBLE_STRATEGY") {
            self.defaults.strategy = strategy;
        }

        if let Ok(path) = std::env::var("RUSTIBLE_LOG_PATH") {
            self.logging.log_path = Some(PathBuf::from(path));
        }

        if let Ok(level) = std::env::var("RUSTIBLE_LOG_LEVEL") {
            self.logging.log_level = level;
        }
    }
}
