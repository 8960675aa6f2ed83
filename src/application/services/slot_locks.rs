//! Per-slot async locks
//!
//! Serializes conflict-check-then-write sequences on the same slot within
//! this process. The repository write re-validates inside a database
//! transaction, so the lock only has to keep the common path race-free.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Default)]
pub struct SlotLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl SlotLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `slot_id`; released when the guard drops.
    pub async fn acquire(&self, slot_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(slot_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        lock.lock_owned().await
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.locks.len()
    }
}
