//! At most one in-flight turn per thread.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Result, ThreadlineError};

/// Registry of threads that currently have a turn running.
#[derive(Debug, Clone, Default)]
pub struct ThreadLocks {
    busy: Arc<Mutex<HashSet<String>>>,
}

impl ThreadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `thread_id`, or fail with [`ThreadlineError::ThreadBusy`].
    pub fn try_acquire(&self, thread_id: &str) -> Result<ThreadGuard> {
        if !self.lock().insert(thread_id.to_string()) {
            return Err(ThreadlineError::ThreadBusy(thread_id.to_string()));
        }
        Ok(ThreadGuard {
            locks: self.clone(),
            thread_id: thread_id.to_string(),
        })
    }

    pub fn is_busy(&self, thread_id: &str) -> bool {
        self.lock().contains(thread_id)
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.busy.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the thread when dropped.
#[derive(Debug)]
pub struct ThreadGuard {
    locks: ThreadLocks,
    thread_id: String,
}

impl ThreadGuard {
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }
}

impl Drop for ThreadGuard {
    fn drop(&mut self) {
        self.locks.lock().remove(&self.thread_id);
    }
}
