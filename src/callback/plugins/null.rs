//! A callback that discards every event. Useful for tests and library
//! embedding where the caller wants silent execution.

use async_trait::async_trait;

use crate::callback::Callback;

/// No-op implementation of [`Callback`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCallback;

impl NullCallback {
    /// Builds a new null callback.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Callback for NullCallback {}
