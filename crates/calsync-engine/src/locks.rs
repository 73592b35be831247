//! Per-key async locks.
//!
//! Two concurrent adds of the same event could both miss the ledger and both
//! write. Holding a lock keyed by the sync key from the ledger check until
//! the ledger update closes that window, while different events still run in
//! parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use calsync_core::SyncKey;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

/// Table of async mutexes, one per live key.
///
/// Slots are dropped once no task holds or waits on them.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    slots: Mutex<HashMap<String, Weak<AsyncMutex<()>>>>,
}

/// Guard for one key; the key is released when dropped.
#[derive(Debug)]
pub struct KeyGuard {
    _guard: OwnedMutexGuard<()>,
}

impl KeyedLocks {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive use of `key`.
    pub async fn lock(&self, key: &SyncKey) -> KeyGuard {
        let slot = {
            let mut slots = self.slots();
            slots.retain(|_, slot| slot.strong_count() > 0);
            match slots.get(key.as_str()).and_then(Weak::upgrade) {
                Some(slot) => slot,
                None => {
                    let slot = Arc::new(AsyncMutex::new(()));
                    slots.insert(key.as_str().to_string(), Arc::downgrade(&slot));
                    slot
                }
            }
        };

        trace!(key = %key, "Waiting for key lock");
        KeyGuard {
            _guard: slot.lock_owned().await,
        }
    }

    /// Returns the number of keys currently held or awaited.
    pub fn active(&self) -> usize {
        self.slots()
            .values()
            .filter(|slot| slot.strong_count() > 0)
            .count()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Weak<AsyncMutex<()>>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
