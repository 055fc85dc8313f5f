use std::collections::HashMap;
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

struct Entry {
    generation: u64,
    token: CancellationToken,
    waiters: usize,
}

#[derive(Default)]
struct Registry {
    next_generation: u64,
    entries: HashMap<String, Entry>,
}

/// Cancellation tokens for poll sessions currently running in this process,
/// keyed by task id. Waiters on the same task share one token until it is cancelled.
#[derive(Default)]
pub struct ActiveSessions {
    inner: Mutex<Registry>,
}

/// Registration of one waiter. Dropping it releases the registration.
pub struct SessionGuard<'a> {
    sessions: &'a ActiveSessions,
    task_id: String,
    generation: u64,
    token: CancellationToken,
}

impl SessionGuard<'_> {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.sessions.release(&self.task_id, self.generation);
    }
}

impl ActiveSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a waiter for `task_id`; the returned guard carries the token it should watch.
    pub fn register(&self, task_id: &str) -> SessionGuard<'_> {
        let mut registry = self.lock();
        registry.next_generation += 1;
        let generation = registry.next_generation;
        let entry = registry
            .entries
            .entry(task_id.to_string())
            .or_insert_with(|| Entry {
                generation,
                token: CancellationToken::new(),
                waiters: 0,
            });
        entry.waiters += 1;

        SessionGuard {
            sessions: self,
            task_id: task_id.to_string(),
            generation: entry.generation,
            token: entry.token.clone(),
        }
    }

    /// Cancel every waiter on `task_id` and forget the entry, so a later
    /// registration starts with a fresh token. Returns false if nothing was polling it.
    pub fn cancel(&self, task_id: &str) -> bool {
        let removed = self.lock().entries.remove(task_id);
        match removed {
            Some(entry) => {
                entry.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn active_count(&self) -> usize {
        self.lock().entries.len()
    }

    fn release(&self, task_id: &str, generation: u64) {
        let mut registry = self.lock();
        let Some(entry) = registry.entries.get_mut(task_id) else {
            return;
        };
        // A cancelled entry may already have been replaced by a newer one.
        if entry.generation != generation {
            return;
        }
        entry.waiters = entry.waiters.saturating_sub(1);
        if entry.waiters == 0 {
            registry.entries.remove(task_id);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        // Every mutation completes under the lock, so a poisoned registry is still consistent.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
