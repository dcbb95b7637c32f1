//! Host identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A target host, identified by name.
///
/// The execution core never resolves a host to a connection; it only ever
/// compares hosts by name, so a thin newtype over `String` is all that is
/// needed here. Inventory resolution lives outside the core.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Host(pub String);

impl Host {
    /// Creates a new host from anything string-like.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the host's name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Host {
    fn from(s: &str) -> Self {
        Host(s.to_string())
    }
}

impl From<String> for Host {
    fn from(s: String) -> Self {
        Host(s)
    }
}
