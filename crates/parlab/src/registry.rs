//! Session registry
//!
//! Concurrency-safe mapping from connection identity to the active
//! interactive session. At most one live session per connection: a second
//! registration for the same id is refused, never silently overwritten.
//! Callers that want to preempt take the old handle out first and
//! terminate it.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::runner::SessionHandle;

/// Returned by [`SessionRegistry::register`] when the connection already
/// has a live session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("a session is already active for this connection")]
pub struct AlreadyActive;

/// Shared map of connection id to active session handle
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<HashMap<String, SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session for a connection.
    ///
    /// Fails with [`AlreadyActive`] if the connection already has one.
    pub async fn register(&self, id: &str, handle: SessionHandle) -> Result<(), AlreadyActive> {
        let mut inner = self.inner.lock().await;
        if inner.contains_key(id) {
            return Err(AlreadyActive);
        }
        inner.insert(id.to_string(), handle);
        debug!(id, "session registered");
        Ok(())
    }

    /// Get a clone of the session handle for a connection, if any
    pub async fn lookup(&self, id: &str) -> Option<SessionHandle> {
        self.inner.lock().await.get(id).cloned()
    }

    /// Remove and return the session handle for a connection.
    ///
    /// Used for preemption and teardown; returns `None` if there is
    /// nothing to take.
    pub async fn take(&self, id: &str) -> Option<SessionHandle> {
        let removed = self.inner.lock().await.remove(id);
        if removed.is_some() {
            debug!(id, "session taken from registry");
        }
        removed
    }

    /// Remove the session entry for a connection. Idempotent.
    pub async fn remove(&self, id: &str) {
        self.take(id).await;
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}
