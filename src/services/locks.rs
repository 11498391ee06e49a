//! Keyed async mutexes for per-entity write serialization.
//!
//! Status mutations on one service must not interleave or the audit log's
//! old->new chain breaks; the same applies to the replace-all association
//! rewrite on incident edits. The underlying store only gives read-committed
//! isolation, so the serialization happens here.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct KeyedLocks {
    inner: Arc<parking_lot::Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `key`, creating it on first use. The guard is
    /// owned so it can be held across awaits on the persistence layer.
    pub async fn acquire(&self, key: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock();
            map.entry(key).or_default().clone()
        };
        lock.lock_owned().await
    }
}
