//! Per-timetable mutual exclusion.
//!
//! At most one generation or reconciliation runs per key at a time.
//! Waiting is bounded: a request that cannot take the lock within the
//! configured wait fails with [`TimetableError::ResourceBusy`] instead of
//! queueing behind a long run.
//!
//! Entries live only while a request holds or waits for the key; the last
//! one out removes it, so the registry does not grow with every key seen.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::error::{Result, TimetableError};
use crate::models::TimetableKey;

type Registry = Arc<Mutex<HashMap<TimetableKey, Arc<AsyncMutex<()>>>>>;

/// Held for the duration of one request on a key.
#[derive(Debug)]
pub struct KeyGuard {
    key: TimetableKey,
    guard: Option<OwnedMutexGuard<()>>,
    registry: Registry,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        // Release before checking, so the count reflects waiters only
        self.guard.take();
        evict_if_idle(&self.registry, &self.key);
    }
}

/// Registry of per-key async locks.
#[derive(Debug)]
pub struct KeyLocks {
    locks: Registry,
    wait: Duration,
}

impl KeyLocks {
    /// Creates a registry whose acquisitions wait at most `wait`.
    pub fn new(wait: Duration) -> Self {
        Self {
            locks: Arc::new(Mutex::new(HashMap::new())),
            wait,
        }
    }

    /// Takes the lock for `key`.
    ///
    /// # Errors
    /// [`TimetableError::ResourceBusy`] if the lock is still held after the wait.
    pub async fn acquire(&self, key: &TimetableKey) -> Result<KeyGuard> {
        let lock = self.locks.lock().entry(key.clone()).or_default().clone();
        match tokio::time::timeout(self.wait, lock.lock_owned()).await {
            Ok(guard) => {
                debug!(event = "lock_acquired", key = %key);
                Ok(KeyGuard {
                    key: key.clone(),
                    guard: Some(guard),
                    registry: Arc::clone(&self.locks),
                })
            }
            Err(_) => {
                evict_if_idle(&self.locks, key);
                warn!(
                    event = "lock_busy",
                    key = %key,
                    wait_ms = self.wait.as_millis() as u64,
                );
                Err(TimetableError::ResourceBusy {
                    key: key.to_string(),
                })
            }
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.lock().len()
    }
}

/// Drops the entry for `key` when the registry holds the only reference.
fn evict_if_idle(registry: &Registry, key: &TimetableKey) {
    let mut locks = registry.lock();
    if locks.get(key).is_some_and(|l| Arc::strong_count(l) == 1) {
        locks.remove(key);
        debug!(event = "lock_evicted", key = %key);
    }
}
