//! Error types for Rustible.
//!
//! This module defines the error types used throughout the execution core,
//! providing rich error information for debugging and user feedback.

use thiserror::Error;

/// Result type alias for Rustible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Rustible.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Play iterator errors
    // ========================================================================
    /// The iterator was asked about a host it has no state for.
    #[error("host '{0}' is not part of this play's iteration state")]
    InvalidHost(String),

    /// A play's host selector resolved to zero hosts.
    #[error("no hosts matched for play '{0}'")]
    NoHostsMatched(String),

    // ========================================================================
    // Strategy errors
    // ========================================================================
    /// An unknown strategy name was requested.
    #[error("unknown execution strategy: '{0}'")]
    InvalidStrategy(String),

    /// The strategy's `serial` value could not be resolved to a host batch.
    #[error("invalid serial specification: {0}")]
    InvalidSerial(String),

    // ========================================================================
    // Task execution errors
    // ========================================================================
    /// Task executor reported task failure.
    #[error("task '{task}' failed on host '{host}': {message}")]
    TaskFailed {
        /// Task name
        task: String,
        /// Target host
        host: String,
        /// Error message
        message: String,
    },

    /// Task executor could not reach the host.
    #[error("host '{host}' unreachable while running '{task}': {message}")]
    TaskUnreachable {
        /// Task name
        task: String,
        /// Target host
        host: String,
        /// Error message
        message: String,
    },

    /// A worker task ended (panicked, or its channel closed) before it could
    /// report a result for an in-flight job.
    #[error("worker fault while running '{task}' on '{host}': {message}")]
    WorkerFault {
        /// Task name
        task: String,
        /// Target host
        host: String,
        /// Description of the fault
        message: String,
    },

    /// The job or result channel closed unexpectedly.
    #[error("transport error: {0}")]
    TransportError(String),

    /// Handler referenced by `notify` has no declaration in the play.
    #[error("handler '{0}' not found")]
    HandlerNotFound(String),

    // ========================================================================
    // Variable errors
    // ========================================================================
    /// Undefined variable.
    #[error("undefined variable: '{0}'")]
    UndefinedVariable(String),

    // ========================================================================
    // Configuration errors
    // ========================================================================
    /// Configuration error.
    #[error("configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    // ========================================================================
    // IO / serialization errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // ========================================================================
    // Other
    // ========================================================================
    /// Internal error — an invariant the core believed it maintained was violated.
    #[error("internal error: {0}")]
    Internal(String),

    /// Generic error with source, used by the `ErrorContext` extension trait.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
        /// Source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Creates a new task failed error.
    pub fn task_failed(
        task: impl Into<String>,
        host: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::TaskFailed {
            task: task.into(),
            host: host.into(),
            message: message.into(),
        }
    }

    /// Creates a new task unreachable error.
    pub fn task_unreachable(
        task: impl Into<String>,
        host: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::TaskUnreachable {
            task: task.into(),
            host: host.into(),
            message: message.into(),
        }
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::TaskFailed { .. } => 2,
            Error::TaskUnreachable { .. } => 3,
            Error::NoHostsMatched(_) | Error::InvalidHost(_) => 4,
            Error::InvalidStrategy(_) | Error::InvalidSerial(_) => 5,
            Error::Config { .. } => 6,
            _ => 1,
        }
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Adds context with a closure that is only evaluated on error.
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Other {
            message: message.into(),
            source: Some(Box::new(e)),
        })
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| Error::Other {
            message: f().into(),
            source: Some(Box::new(e)),
        })
    }
}
