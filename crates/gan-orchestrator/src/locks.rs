//! Per-session serialization: at most one audit cycle may be in flight
//! per session key. A `std::sync::Mutex`
//! guards the registry lookup (a quick, non-suspending operation); each
//! entry is an `Arc<tokio::sync::Mutex<()>>` held across the awaited
//! parts of a cycle, so concurrent calls for the same key queue FIFO
//! while calls for distinct keys never block each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;

#[derive(Default)]
pub struct SessionLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or lazily create) the lock for `session_key`.
    pub fn get_or_create(&self, session_key: &str) -> Arc<AsyncMutex<()>> {
        let mut guard = self.inner.lock().expect("session lock registry poisoned");
        guard
            .entry(session_key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}
