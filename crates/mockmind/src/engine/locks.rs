//! Per-session turn locks
//!
//! A session processes at most one answer or report request at a time.
//! Different sessions never contend. Entries live only while a turn holds
//! or waits for them.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

type LockMap = DashMap<Uuid, Arc<Mutex<()>>>;

#[derive(Default)]
pub struct SessionLocks {
    locks: Arc<LockMap>,
}

/// Exclusive access to one session; released on drop
pub struct TurnGuard {
    id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockMap>,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.guard.take();
        // Only the map's own reference left means nobody holds or waits
        self.locks
            .remove_if(&self.id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a session
    pub async fn acquire(&self, id: Uuid) -> TurnGuard {
        // Clone the Arc out so the map shard is not held across the await
        let lock = Arc::clone(self.locks.entry(id).or_default().value());
        let guard = lock.lock_owned().await;
        TurnGuard {
            id,
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
        }
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
